// LLM provider abstraction
//
// A unified interface over language-model backends so the chat service can
// swap providers without touching the conversation flow. Gemini is the one
// production implementation.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

mod gemini;
mod retry;
mod types;

pub use gemini::GeminiProvider;
pub use types::{ChatTurn, ProviderRequest, ProviderResponse, Role};

/// Trait for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a message and get a complete response.
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Send a message and stream the response.
    ///
    /// Returns a channel that receives text deltas as they arrive; the
    /// channel closes when the stream is complete.
    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<Receiver<Result<String>>>;

    /// Provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Default model used when a request names none.
    fn default_model(&self) -> &str;
}
