// Style learner: mines a bounded recent sample of a group's threads and
// comments into a StyleAnalysis.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::db::models::{Comment, Thread};
use crate::db::Database;

/// Comments shorter than this (in chars, after trimming) are noise.
const MIN_COMMENT_CHARS: usize = 5;
const TOP_WORDS: usize = 20;
const TOP_PHRASES: usize = 15;
/// Average length assumed when nothing could be learned.
const DEFAULT_AVERAGE_LENGTH: usize = 50;

const EMOJIS: [&str; 8] = ["😊", "😂", "👍", "❤️", "🙏", "😭", "😅", "😁"];
const POLITE_WORDS: [&str; 5] = ["谢谢", "感谢", "请问", "麻烦", "不好意思"];

/// A recurring habit detected across the comment sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StylePattern {
    Interrogative,
    Exclamatory,
    Emoji,
    Polite,
}

impl StylePattern {
    pub fn label(&self) -> &'static str {
        match self {
            StylePattern::Interrogative => "frequently asks questions",
            StylePattern::Exclamatory => "frequently uses exclamations",
            StylePattern::Emoji => "frequently uses emoji",
            StylePattern::Polite => "frequently uses polite phrases",
        }
    }
}

impl fmt::Display for StylePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived statistics describing how a group talks.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleAnalysis {
    /// Mean retained-comment length in chars (integer division).
    pub average_length: usize,
    /// Most frequent whitespace tokens, most frequent first.
    pub common_words: Vec<String>,
    /// Most frequent adjacent token pairs ("a b"), most frequent first.
    pub common_phrases: Vec<String>,
    pub patterns: Vec<StylePattern>,
    pub sample_comments: Vec<String>,
    pub sample_posts: Vec<String>,
}

impl Default for StyleAnalysis {
    /// Neutral style used when learning fails.
    fn default() -> Self {
        Self {
            average_length: DEFAULT_AVERAGE_LENGTH,
            common_words: Vec::new(),
            common_phrases: Vec::new(),
            patterns: Vec::new(),
            sample_comments: Vec::new(),
            sample_posts: Vec::new(),
        }
    }
}

/// Reads a group's recent history from the store and analyzes it.
pub struct StyleLearner {
    db: Arc<dyn Database>,
}

impl StyleLearner {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Learn the style of `group_id` from its most recent threads and comments.
    pub async fn learn(
        &self,
        group_id: &str,
        max_posts: u32,
        max_comments: u32,
    ) -> Result<StyleAnalysis> {
        let threads = self
            .db
            .list_threads_by_group(group_id, max_posts)
            .await
            .with_context(|| format!("Failed to load threads for group {group_id}"))?;
        let comments = self
            .db
            .list_comments_by_group(group_id, max_comments)
            .await
            .with_context(|| format!("Failed to load comments for group {group_id}"))?;

        let analysis = analyze(&comment_bodies(&comments), &thread_samples(&threads));
        debug!(
            group_id,
            samples = analysis.sample_comments.len(),
            average_length = analysis.average_length,
            patterns = analysis.patterns.len(),
            "Learned group style"
        );
        Ok(analysis)
    }
}

fn comment_bodies(comments: &[Comment]) -> Vec<String> {
    comments.iter().map(|c| c.content.clone()).collect()
}

fn thread_samples(threads: &[Thread]) -> Vec<String> {
    threads
        .iter()
        .filter(|t| !t.content.is_empty())
        .map(|t| format!("{}\n{}", t.title, t.content))
        .collect()
}

/// Compute a StyleAnalysis from raw comment bodies and thread samples.
///
/// Unlike [`StyleAnalysis::default`], an empty sample yields an average
/// length of 0.
pub fn analyze(comments: &[String], posts: &[String]) -> StyleAnalysis {
    let mut samples = Vec::new();
    let mut total_chars = 0usize;
    let mut word_freq: HashMap<String, usize> = HashMap::new();
    let mut phrase_freq: HashMap<String, usize> = HashMap::new();

    for raw in comments {
        let content = raw.trim();
        let chars = content.chars().count();
        if chars < MIN_COMMENT_CHARS {
            continue;
        }
        total_chars += chars;

        let words: Vec<&str> = content.split_whitespace().collect();
        for word in &words {
            if word.chars().count() > 1 {
                *word_freq.entry(word.to_string()).or_default() += 1;
            }
        }
        for pair in words.windows(2) {
            *phrase_freq.entry(format!("{} {}", pair[0], pair[1])).or_default() += 1;
        }

        samples.push(content.to_string());
    }

    let average_length = if samples.is_empty() {
        0
    } else {
        total_chars / samples.len()
    };

    StyleAnalysis {
        average_length,
        common_words: top_n(&word_freq, TOP_WORDS),
        common_phrases: top_n(&phrase_freq, TOP_PHRASES),
        patterns: detect_patterns(&samples),
        sample_comments: samples,
        sample_posts: posts.to_vec(),
    }
}

/// The `n` most frequent terms, by descending count.
///
/// Equal counts are ordered by the term itself so results are stable
/// across runs.
pub fn top_n(freq: &HashMap<String, usize>, n: usize) -> Vec<String> {
    let mut entries: Vec<(&String, &usize)> = freq.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .take(n)
        .map(|(term, _)| term.clone())
        .collect()
}

fn detect_patterns(samples: &[String]) -> Vec<StylePattern> {
    let n = samples.len();
    let count = |test: &dyn Fn(&str) -> bool| samples.iter().filter(|s| test(s)).count();

    let questions = count(&|s| s.contains('？') || s.contains('?'));
    let exclamations = count(&|s| s.contains('！') || s.contains('!'));
    let emoji = count(&|s| EMOJIS.iter().any(|e| s.contains(e)));
    let polite = count(&|s| POLITE_WORDS.iter().any(|w| s.contains(w)));

    let mut patterns = Vec::new();
    // Strictly more than a third (a quarter for emoji) of the sample
    if questions * 3 > n {
        patterns.push(StylePattern::Interrogative);
    }
    if exclamations * 3 > n {
        patterns.push(StylePattern::Exclamatory);
    }
    if emoji * 4 > n {
        patterns.push(StylePattern::Emoji);
    }
    if polite * 3 > n {
        patterns.push(StylePattern::Polite);
    }
    patterns
}
