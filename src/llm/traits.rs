// Generator trait: the swap-ready abstraction over text generation.

use anyhow::Result;
use async_trait::async_trait;

/// Produces reply text from a system prompt and a user prompt.
/// Implementations are async because every real provider is an HTTP API.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
