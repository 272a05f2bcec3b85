//! Grammar breakdown of a translated text.
//!
//! Three paths, picked by [`GrammarService::analyze`]:
//! remote LLM analysis, local regex tables, or a placeholder asking for a key.

mod parse;
mod patterns;
mod remote;

use crate::config::{ApiKeys, Endpoints};
use crate::lang::Engine;
use crate::llm::{GeminiClient, LlmError, OpenAiChatClient};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use parse::{extract_json_array, parse_findings};
pub use patterns::analyze_local;
pub use remote::{grammar_prompt, RemoteGrammarAnalyzer, GRAMMAR_SYSTEM_PROMPT};

/// Upper bound on findings shown per analysis.
pub const MAX_FINDINGS: usize = 3;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub name: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

impl Finding {
    pub fn new(name: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            explanation: explanation.into(),
            examples: None,
        }
    }

    pub fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.examples = Some(examples);
        self
    }

    pub fn examples(&self) -> &[String] {
        self.examples.as_deref().unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnalysisSource {
    Remote(Engine),
    Local,
    /// Remote analysis failed and the local tables were used instead.
    LocalFallback(Engine),
    /// A keyed engine is selected but has no key.
    Unconfigured(Engine),
}

impl fmt::Display for AnalysisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisSource::Remote(engine) => f.write_str(engine.display_name()),
            AnalysisSource::Local => f.write_str("local patterns"),
            AnalysisSource::LocalFallback(engine) => {
                write!(f, "local patterns, {} unavailable", engine.display_name())
            }
            AnalysisSource::Unconfigured(engine) => {
                write!(f, "{} not configured", engine.display_name())
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrammarReport {
    pub source: AnalysisSource,
    pub findings: Vec<Finding>,
}

pub fn configure_key_finding() -> Finding {
    Finding::new(
        "Advanced Grammar Analysis",
        "Please activate your LLM model in the settings to enable advanced grammar analysis \
         with context examples.",
    )
}

#[derive(Clone)]
pub struct GrammarService {
    client: Client,
    endpoints: Endpoints,
}

impl GrammarService {
    pub fn new(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub async fn analyze(
        &self,
        text: &str,
        lang: &str,
        engine: Engine,
        keys: &ApiKeys,
    ) -> GrammarReport {
        let remote = match (engine, keys.for_engine(engine)) {
            (Engine::Google, _) => {
                return GrammarReport {
                    source: AnalysisSource::Local,
                    findings: analyze_local(text, lang),
                }
            }
            (_, None) => {
                tracing::info!(engine = %engine, "no key for grammar analysis");
                return GrammarReport {
                    source: AnalysisSource::Unconfigured(engine),
                    findings: vec![configure_key_finding()],
                };
            }
            (Engine::OpenAi, Some(key)) => {
                let client = OpenAiChatClient::new(
                    self.client.clone(),
                    key.clone(),
                    &self.endpoints.openai_base_url,
                );
                RemoteGrammarAnalyzer::new(client).analyze(text, lang).await
            }
            (Engine::Gemini, Some(key)) => {
                let client = GeminiClient::new(
                    self.client.clone(),
                    key.clone(),
                    &self.endpoints.gemini_base_url,
                );
                RemoteGrammarAnalyzer::new(client).analyze(text, lang).await
            }
        };

        match remote {
            Ok(findings) => GrammarReport {
                source: AnalysisSource::Remote(engine),
                findings,
            },
            Err(e) => fallback(engine, e, text, lang),
        }
    }
}

fn fallback(engine: Engine, error: LlmError, text: &str, lang: &str) -> GrammarReport {
    tracing::warn!(
        engine = %engine,
        error = %error,
        "remote grammar analysis failed; using local patterns"
    );
    GrammarReport {
        source: AnalysisSource::LocalFallback(engine),
        findings: analyze_local(text, lang),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> GrammarService {
        let http = Client::builder().no_proxy().build().expect("client");
        GrammarService::new(http, Endpoints::with_base(&server.uri()))
    }

    fn openai_keys() -> ApiKeys {
        ApiKeys {
            openai: ApiKey::usable("sk-live"),
            gemini: None,
        }
    }

    #[tokio::test]
    async fn google_engine_uses_local_tables() {
        let server = MockServer::start().await;
        let report = service_for(&server)
            .analyze("I would like a coffee.", "en", Engine::Google, &openai_keys())
            .await;
        assert_eq!(report.source, AnalysisSource::Local);
        assert_eq!(report.findings[0].name, "Conditional Mood");
        assert!(server.received_requests().await.expect("recording").is_empty());
    }

    #[tokio::test]
    async fn keyed_engine_without_key_asks_for_one() {
        let server = MockServer::start().await;
        let report = service_for(&server)
            .analyze("Hola", "es", Engine::Gemini, &openai_keys())
            .await;
        assert_eq!(report.source, AnalysisSource::Unconfigured(Engine::Gemini));
        assert_eq!(report.findings, vec![configure_key_finding()]);
    }

    #[tokio::test]
    async fn remote_findings_are_returned() {
        let server = MockServer::start().await;
        let content = r#"Here you go: [{"name": "Present Simple", "explanation": "habit", "examples": ["I work."]}] Enjoy!"#;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": content}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = service_for(&server)
            .analyze("I work.", "en", Engine::OpenAi, &openai_keys())
            .await;
        assert_eq!(report.source, AnalysisSource::Remote(Engine::OpenAi));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].name, "Present Simple");
        assert_eq!(report.findings[0].examples(), ["I work.".to_owned()]);
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_local() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let report = service_for(&server)
            .analyze("They are working.", "en", Engine::OpenAi, &openai_keys())
            .await;
        assert_eq!(report.source, AnalysisSource::LocalFallback(Engine::OpenAi));
        assert_eq!(report.findings[0].name, "Present Continuous");
    }
}
