// Style learning: frequency and pattern statistics over a group's recent
// comments, turned into a system prompt for reply generation.
//
// The statistics are heuristic (whitespace tokens, substring indicators).
// They are recomputed for every reply pass and never persisted.

pub mod learner;
pub mod prompt;

pub use learner::{analyze, top_n, StyleAnalysis, StyleLearner, StylePattern};
pub use prompt::{build_system_prompt, build_user_prompt};
