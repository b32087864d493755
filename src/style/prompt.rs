// Prompt templates for reply generation.

use super::learner::StyleAnalysis;

const PROMPT_WORDS: usize = 10;
const PROMPT_PHRASES: usize = 8;

/// Build the system prompt that conditions generation on a group's style.
pub fn build_system_prompt(group_name: &str, analysis: &StyleAnalysis) -> String {
    let words = join_first(&analysis.common_words, PROMPT_WORDS);
    let phrases = join_first(&analysis.common_phrases, PROMPT_PHRASES);
    let patterns = analysis
        .patterns
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "You are a regular member of the forum group \"{group_name}\". \
         Write replies that blend in with how this group talks.\n\
         \n\
         Group style:\n\
         1. Typical reply length: about {length} characters\n\
         2. Common words: {words}\n\
         3. Common phrases: {phrases}\n\
         4. Habits: {patterns}\n\
         \n\
         Guidelines:\n\
         1. Sound natural and friendly, matching the group's tone.\n\
         2. Reuse the group's vocabulary and expressions where they fit.\n\
         3. Keep the length close to the typical reply length.\n\
         4. Say something substantive about the post; avoid empty bumps.\n\
         5. If the post asks a question, try to give a useful answer.\n\
         6. Reply in the language of the post.",
        length = analysis.average_length,
    )
}

/// Build the user prompt for one thread.
pub fn build_user_prompt(title: &str, content: &str) -> String {
    format!(
        "Write a reply to the following post.\n\
         \n\
         Title: {title}\n\
         \n\
         Content: {content}\n\
         \n\
         Reply with the text of the reply only."
    )
}

fn join_first(items: &[String], n: usize) -> String {
    items.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
}
