use crate::config::ApiKey;
use crate::lang::Engine;
use crate::llm::{read_body, ChatPrompt, LlmClient, LlmError, Sampling, DEFAULT_MAX_TOKENS};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

const SAMPLING: Sampling = Sampling {
    temperature: 0.2,
    max_tokens: DEFAULT_MAX_TOKENS,
};

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: ApiKey, base_url: &str) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            DEFAULT_GEMINI_MODEL,
            urlencoding::encode(self.api_key.expose())
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl LlmClient for GeminiClient {
    fn engine(&self) -> Engine {
        Engine::Gemini
    }

    /// The endpoint has no system role; only the user prompt is sent.
    fn complete(&self, prompt: ChatPrompt) -> BoxFuture<'_, Result<String, LlmError>> {
        async move {
            let request = GenerateRequest {
                contents: vec![Content {
                    parts: vec![Part { text: &prompt.user }],
                }],
                generation_config: GenerationConfig {
                    temperature: SAMPLING.temperature,
                    max_output_tokens: SAMPLING.max_tokens,
                },
            };

            tracing::debug!(model = DEFAULT_GEMINI_MODEL, "sending generateContent");

            let response = self
                .client
                .post(self.endpoint())
                .json(&request)
                .send()
                .await?;

            let body = read_body(response, Engine::Gemini).await?;
            let parsed: GenerateResponse = serde_json::from_str(&body)
                .map_err(|e| LlmError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

            parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .and_then(|c| c.parts.into_iter().next())
                .and_then(|p| p.text)
                .map(|text| text.trim().to_owned())
                .ok_or_else(|| {
                    LlmError::InvalidResponse("invalid response from Google Gemini API".to_owned())
                })
        }
        .boxed()
    }
}
