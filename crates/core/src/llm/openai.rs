use crate::config::ApiKey;
use crate::lang::Engine;
use crate::llm::{read_body, ChatPrompt, LlmClient, LlmError, Sampling, DEFAULT_MAX_TOKENS};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

const SAMPLING: Sampling = Sampling {
    temperature: 0.3,
    max_tokens: DEFAULT_MAX_TOKENS,
};

#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl OpenAiChatClient {
    pub fn new(client: Client, api_key: ApiKey, base_url: &str) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl LlmClient for OpenAiChatClient {
    fn engine(&self) -> Engine {
        Engine::OpenAi
    }

    fn complete(&self, prompt: ChatPrompt) -> BoxFuture<'_, Result<String, LlmError>> {
        async move {
            let request = ChatRequest {
                model: DEFAULT_OPENAI_MODEL,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: &prompt.system,
                    },
                    ChatMessage {
                        role: "user",
                        content: &prompt.user,
                    },
                ],
                temperature: SAMPLING.temperature,
                max_tokens: SAMPLING.max_tokens,
            };

            let url = format!("{}/chat/completions", self.base_url);
            tracing::debug!(model = DEFAULT_OPENAI_MODEL, "sending chat completion");

            let response = self
                .client
                .post(&url)
                .bearer_auth(self.api_key.expose())
                .json(&request)
                .send()
                .await?;

            let body = read_body(response, Engine::OpenAi).await?;
            let parsed: ChatResponse = serde_json::from_str(&body)
                .map_err(|e| LlmError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message)
                .and_then(|m| m.content)
                .map(|content| content.trim().to_owned())
                .ok_or_else(|| {
                    LlmError::InvalidResponse("invalid response from OpenAI API".to_owned())
                })
        }
        .boxed()
    }
}
