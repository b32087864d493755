// Reply text generation.
//
// The reply engine only sees the `Generator` trait. The OpenAI-compatible
// chat-completions client is the one production implementation; tests plug
// in canned generators.

pub mod openai;
pub mod traits;

pub use openai::OpenAiGenerator;
pub use traits::Generator;
