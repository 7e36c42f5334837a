// Unified request/response types for LLM providers
//
// These types abstract over provider-specific wire formats so the server and
// CLI can build conversations without knowing which backend answers them.

use serde::{Deserialize, Serialize};

/// Who spoke a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Unified request format for all LLM providers.
///
/// Each provider implementation transforms this into its specific API format.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Conversation turns, oldest first.
    pub turns: Vec<ChatTurn>,

    /// System prompt steering the model's persona and directives.
    pub system: Option<String>,

    /// Model name; empty means the provider's default.
    pub model: String,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature (0.0 to 1.0, optional).
    pub temperature: Option<f32>,
}

impl ProviderRequest {
    /// Create a request from conversation turns.
    pub fn new(turns: Vec<ChatTurn>) -> Self {
        Self {
            turns,
            system: None,
            model: String::new(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Unified response format from LLM providers.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Model that generated the response.
    pub model: String,

    /// Generated text, concatenated across response parts.
    pub text: String,

    /// Why the model stopped generating, if the provider reports it.
    pub finish_reason: Option<String>,

    /// Provider name (e.g., "gemini").
    pub provider: String,
}
