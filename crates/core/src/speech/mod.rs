//! Text-to-speech: an on-device voice or a keyed speech API.

mod openai;
mod system;

use crate::config::AppConfig;
use crate::lang::{SpeechRate, VoiceEngine};
use bytes::Bytes;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub use openai::{OpenAiSpeechClient, DEFAULT_SPEECH_MODEL, DEFAULT_SPEECH_VOICE};
pub use system::{espeak_args, SystemVoice, BASE_WORDS_PER_MINUTE};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub lang: String,
    pub rate: SpeechRate,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: lang.into(),
            rate: SpeechRate::Normal,
        }
    }

    pub fn with_rate(mut self, rate: SpeechRate) -> Self {
        self.rate = rate;
        self
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }
}

/// Encoded audio, ready for a file or a [`crate::playback::PlaybackSink`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechAudio {
    pub format: AudioFormat,
    pub data: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error("Please configure a valid OpenAI API key in Settings.")]
    MissingCredential,

    #[error("speech request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("speech error: HTTP {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with {status}: {stderr}")]
    ProcessFailed {
        binary: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("speech engine returned no audio")]
    Empty,
}

pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, request: SpeechRequest) -> BoxFuture<'_, Result<SpeechAudio, SpeechError>>;
}

/// Picks the synthesizer for the configured voice. The keyed voice needs a key.
pub fn synthesizer_for(
    config: &AppConfig,
    client: &Client,
) -> Result<Box<dyn SpeechSynthesizer>, SpeechError> {
    match config.voice {
        VoiceEngine::System => Ok(Box::new(SystemVoice::new(&config.espeak_binary))),
        VoiceEngine::OpenAi => {
            let key = config
                .api_keys
                .openai
                .clone()
                .ok_or(SpeechError::MissingCredential)?;
            Ok(Box::new(OpenAiSpeechClient::new(
                client.clone(),
                key,
                &config.endpoints.openai_base_url,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_voice_without_key_is_rejected() {
        let config = AppConfig {
            voice: VoiceEngine::OpenAi,
            ..AppConfig::default()
        };
        let err = synthesizer_for(&config, &Client::new())
            .err()
            .expect("no key");
        assert!(matches!(err, SpeechError::MissingCredential));
        assert!(err.to_string().contains("OpenAI API key"));
    }

    #[tokio::test]
    async fn system_voice_runs_the_configured_binary() {
        let config = AppConfig {
            voice: VoiceEngine::System,
            espeak_binary: "/nonexistent/custom-espeak".into(),
            ..AppConfig::default()
        };
        let synthesizer = synthesizer_for(&config, &Client::new()).expect("no key needed");
        let err = synthesizer
            .synthesize(SpeechRequest::new("Olá", "pt"))
            .await
            .expect_err("binary does not exist");
        match err {
            SpeechError::Spawn { binary, .. } => assert_eq!(binary, "/nonexistent/custom-espeak"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
