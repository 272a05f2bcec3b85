//! HTTP clients for the keyed LLM providers.
//!
//! Translation and grammar analysis build their own prompts on top of these.

mod gemini;
mod openai;

use crate::lang::Engine;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use gemini::{GeminiClient, DEFAULT_GEMINI_MODEL};
pub use openai::{OpenAiChatClient, DEFAULT_OPENAI_MODEL};

pub const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

impl ChatPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The provider answered with an `error` object.
    #[error("{0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Shape of the `error` object both providers return on failure.
#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiErrorBody>,
}

/// Provider `error` objects take precedence over the bare HTTP status.
async fn read_body(response: reqwest::Response, engine: Engine) -> Result<String, LlmError> {
    let status = response.status();
    let body = response.text().await?;

    if let Ok(ErrorEnvelope { error: Some(err) }) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let message = err
            .message
            .unwrap_or_else(|| format!("unknown error from {} API", engine.display_name()));
        tracing::warn!(
            engine = %engine,
            status = status.as_u16(),
            "provider returned an error object"
        );
        return Err(LlmError::Api(message));
    }

    if !status.is_success() {
        return Err(LlmError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

pub trait LlmClient: Send + Sync {
    fn engine(&self) -> Engine;

    /// Sends one prompt and returns the first completion, trimmed.
    fn complete(&self, prompt: ChatPrompt) -> BoxFuture<'_, Result<String, LlmError>>;
}
