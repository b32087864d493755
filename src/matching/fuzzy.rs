// Fuzzy keyword patterns.
//
// Each keyword character is escaped on its own, then the characters are
// joined with `.?` so at most one arbitrary character may sit between any
// two of them. Escaping per character keeps metacharacters in keywords
// literal ("c++" stays c, +, +). `(?s)` lets the gap be a newline.

use anyhow::{Context, Result};
use regex_lite::Regex;
use tracing::debug;

/// Build the fuzzy regex source for a keyword.
pub fn fuzzy_pattern(keyword: &str) -> String {
    let parts: Vec<String> = keyword
        .chars()
        .map(|c| regex_lite::escape(c.encode_utf8(&mut [0u8; 4])))
        .collect();
    format!("(?s){}", parts.join(".?"))
}

/// Which keywords hit a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMatch {
    pub matched: bool,
    /// Matching keywords, verbatim and in configured order.
    pub keywords: Vec<String>,
}

/// Compiled set of include keywords.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    patterns: Vec<(String, Regex)>,
}

impl KeywordMatcher {
    /// Compile the keyword list. Empty keywords are skipped.
    pub fn new(keywords: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(keywords.len());
        for keyword in keywords.iter().filter(|k| !k.is_empty()) {
            let source = fuzzy_pattern(keyword);
            let re = Regex::new(&source)
                .with_context(|| format!("Failed to compile pattern for keyword {keyword:?}"))?;
            debug!(keyword = keyword.as_str(), pattern = source.as_str(), "Compiled keyword");
            patterns.push((keyword.clone(), re));
        }
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Test every keyword against the title or the body.
    pub fn check(&self, title: &str, body: &str) -> KeywordMatch {
        let keywords: Vec<String> = self
            .patterns
            .iter()
            .filter(|(_, re)| re.is_match(title) || re.is_match(body))
            .map(|(keyword, _)| keyword.clone())
            .collect();
        KeywordMatch {
            matched: !keywords.is_empty(),
            keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(keywords: &[&str]) -> KeywordMatcher {
        let list: Vec<String> = keywords.iter().map(|s| s.to_string()).collect();
        KeywordMatcher::new(&list).unwrap()
    }

    #[test]
    fn test_pattern_shape() {
        assert_eq!(fuzzy_pattern("abc"), "(?s)a.?b.?c");
        assert_eq!(fuzzy_pattern("a.b"), r"(?s)a.?\..?b");
    }

    #[test]
    fn test_single_gaps_match() {
        let m = matcher(&["abc"]);
        for text in ["abc", "a.bc", "a b c", "xxabcxx", "a\nbc"] {
            assert!(m.check(text, "").matched, "{text:?} should match");
        }
    }

    #[test]
    fn test_double_gaps_and_skips_do_not_match() {
        let m = matcher(&["abc"]);
        for text in ["ac", "a  bc", "ab--c", "cba", ""] {
            assert!(!m.check(text, "").matched, "{text:?} should not match");
        }
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let m = matcher(&["c++", "1.5"]);
        assert!(m.check("c++ developer", "").matched);
        assert!(!m.check("ccc", "").matched);
        assert_eq!(m.check("", "price 1.5k").keywords, vec!["1.5"]);
        assert!(!m.check("", "price 105").matched);
    }

    #[test]
    fn test_cjk_keywords() {
        let m = matcher(&["整租"]);
        assert!(!m.check("整套出租", "").matched);
        assert!(m.check("整-租 两居", "").matched);
        assert!(m.check("", "一居室整租").matched);
    }

    #[test]
    fn test_records_every_hit_in_order() {
        let m = matcher(&["room", "", "subway", "pet"]);
        let result = m.check("Looking for roommate", "near the subway");
        assert!(result.matched);
        assert_eq!(result.keywords, vec!["room", "subway"]);
    }

    #[test]
    fn test_empty_matcher_never_matches() {
        let m = matcher(&[]);
        assert!(m.is_empty());
        assert_eq!(m.check("anything", "at all"), KeywordMatch::default());
    }
}
