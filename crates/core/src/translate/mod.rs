mod dispatch;
mod google;
mod llm;
mod tone;

use crate::lang::{Engine, Tone};
use crate::llm::LlmError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use dispatch::EngineDispatcher;
pub use google::GoogleFreeTranslator;
pub use llm::{translation_prompt, LlmTranslator, TRANSLATOR_SYSTEM_PROMPT};
pub use tone::{apply_tone_marker, strip_tone_marker};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub tone: Tone,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            tone: Tone::default(),
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub engine: Engine,
}

#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error("{}", .0.missing_key_message())]
    MissingCredential(Engine),

    #[error("translation error: HTTP {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("translation error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("translation error: {0}")]
    InvalidResponse(String),

    #[error("{} translation error: {source}", .engine.display_name())]
    Provider {
        engine: Engine,
        #[source]
        source: LlmError,
    },
}

pub trait Translator: Send + Sync {
    fn translate(
        &self,
        request: TranslationRequest,
    ) -> BoxFuture<'_, Result<Translation, TranslateError>>;
}
