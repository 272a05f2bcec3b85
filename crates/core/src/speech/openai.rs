use crate::config::ApiKey;
use crate::lang::speech_language;
use crate::speech::{AudioFormat, SpeechAudio, SpeechError, SpeechRequest, SpeechSynthesizer};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Serialize;

pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_SPEECH_VOICE: &str = "alloy";

#[derive(Clone)]
pub struct OpenAiSpeechClient {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl OpenAiSpeechClient {
    pub fn new(client: Client, api_key: ApiKey, base_url: &str) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[derive(Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    language: &'a str,
    response_format: &'a str,
}

impl SpeechSynthesizer for OpenAiSpeechClient {
    fn synthesize(
        &self,
        request: SpeechRequest,
    ) -> BoxFuture<'_, Result<SpeechAudio, SpeechError>> {
        async move {
            // The API has no rate parameter; playback speed is left to the player.
            let body = SpeechBody {
                model: DEFAULT_SPEECH_MODEL,
                input: &request.text,
                voice: DEFAULT_SPEECH_VOICE,
                language: speech_language(&request.lang),
                response_format: AudioFormat::Mp3.extension(),
            };

            tracing::debug!(
                language = body.language,
                chars = request.text.chars().count(),
                "requesting speech synthesis"
            );

            let response = self
                .client
                .post(format!("{}/audio/speech", self.base_url))
                .bearer_auth(self.api_key.expose())
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(SpeechError::Http {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("").to_owned(),
                });
            }

            let data = response.bytes().await?;
            if data.is_empty() {
                return Err(SpeechError::Empty);
            }
            Ok(SpeechAudio {
                format: AudioFormat::Mp3,
                data,
            })
        }
        .boxed()
    }
}
