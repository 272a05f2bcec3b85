//! Orchestrates translate, analyze and tone against a shared [`Session`].
//!
//! The session lock is never held across a network call: each step
//! snapshots its input under a request token, releases the lock, awaits the
//! provider, then commits only if the token is still current.

use crate::config::{ApiKeys, Endpoints};
use crate::grammar::{GrammarReport, GrammarService};
use crate::session::{Field, Session, Update};
use crate::translate::{
    apply_tone_marker, strip_tone_marker, EngineDispatcher, TranslateError, Translation,
};
use reqwest::Client;
use tokio::sync::Mutex;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("nothing to translate")]
    EmptyText,

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

#[derive(Clone)]
pub struct Pipeline {
    dispatcher: EngineDispatcher,
    grammar: GrammarService,
    keys: ApiKeys,
}

impl Pipeline {
    pub fn new(client: Client, endpoints: Endpoints, keys: ApiKeys) -> Self {
        Self {
            dispatcher: EngineDispatcher::new(client.clone(), endpoints.clone()),
            grammar: GrammarService::new(client, endpoints),
            keys,
        }
    }

    pub async fn translate(
        &self,
        session: &Mutex<Session>,
    ) -> Result<Update<Translation>, PipelineError> {
        let (token, request, engine) = {
            let mut s = session.lock().await;
            if s.source_text.trim().is_empty() {
                return Err(PipelineError::EmptyText);
            }
            (s.begin(Field::Translation), s.translation_request(), s.engine)
        };

        let result = self.dispatcher.translate(request, engine, &self.keys).await;

        let mut s = session.lock().await;
        if !s.is_current(token) {
            tracing::debug!(engine = %engine, "translation superseded");
            return Ok(Update::Stale);
        }
        let translation = result?;
        s.commit_translation(token, translation.text.clone());
        Ok(Update::Applied(translation))
    }

    /// Analyzes the current translation in the target language.
    pub async fn analyze(&self, session: &Mutex<Session>) -> Update<GrammarReport> {
        let (token, text, lang, engine) = {
            let mut s = session.lock().await;
            (
                s.begin(Field::Grammar),
                strip_tone_marker(s.target_text()).to_owned(),
                s.target_lang.clone(),
                s.engine,
            )
        };

        let report = self.grammar.analyze(&text, &lang, engine, &self.keys).await;

        let mut s = session.lock().await;
        match s.commit_findings(token, report.findings.clone()) {
            Update::Applied(()) => Update::Applied(report),
            Update::Stale => Update::Stale,
        }
    }

    /// Translation followed by grammar analysis of the result.
    pub async fn translate_and_analyze(
        &self,
        session: &Mutex<Session>,
    ) -> Result<(Update<Translation>, Option<GrammarReport>), PipelineError> {
        let translation = self.translate(session).await?;
        if translation.is_stale() {
            return Ok((translation, None));
        }
        let report = self.analyze(session).await.applied();
        Ok((translation, report))
    }

    /// Re-translates in the session tone when a keyed engine has its key.
    /// Otherwise marks the current translation with the tone label.
    pub async fn apply_tone(
        &self,
        session: &Mutex<Session>,
    ) -> Result<Update<Translation>, PipelineError> {
        let (engine, tone) = {
            let s = session.lock().await;
            (s.engine, s.tone)
        };

        if engine.requires_key() && self.keys.for_engine(engine).is_some() {
            tracing::info!(engine = %engine, tone = %tone, "re-translating with tone");
            return self.translate(session).await;
        }

        let mut s = session.lock().await;
        if s.target_text().is_empty() {
            return Err(PipelineError::EmptyText);
        }
        let token = s.begin(Field::Translation);
        let text = apply_tone_marker(s.target_text(), tone);
        tracing::debug!(tone = %tone, "no LLM for tone; marking translation");
        s.commit_translation(token, text.clone());
        Ok(Update::Applied(Translation { text, engine }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use crate::grammar::AnalysisSource;
    use crate::lang::{Engine, Tone};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline_for(server: &MockServer, keys: ApiKeys) -> Pipeline {
        let http = Client::builder().no_proxy().build().expect("client");
        Pipeline::new(http, Endpoints::with_base(&server.uri()), keys)
    }

    fn gtx_body(text: &str, original: &str) -> serde_json::Value {
        serde_json::json!([[[text, original, null, null, 1]]])
    }

    #[tokio::test]
    async fn translate_commits_and_analyzes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gtx_body(
                "They are working.",
                "Eles estão trabalhando.",
            )))
            .mount(&server)
            .await;

        let session =
            Mutex::new(Session::new("pt", "en").with_source_text("Eles estão trabalhando."));
        let (translation, report) = pipeline_for(&server, ApiKeys::default())
            .translate_and_analyze(&session)
            .await
            .expect("pipeline");

        assert_eq!(
            translation.applied().map(|t| t.text),
            Some("They are working.".to_owned())
        );
        let report = report.expect("analysis applied");
        assert_eq!(report.source, AnalysisSource::Local);
        assert_eq!(report.findings[0].name, "Present Continuous");

        let s = session.lock().await;
        assert_eq!(s.target_text(), "They are working.");
        assert_eq!(s.findings(), report.findings.as_slice());
    }

    #[tokio::test]
    async fn empty_source_is_rejected_without_a_request() {
        let server = MockServer::start().await;
        let session = Mutex::new(Session::default().with_source_text("   "));
        let err = pipeline_for(&server, ApiKeys::default())
            .translate(&session)
            .await
            .expect_err("empty");
        assert!(matches!(err, PipelineError::EmptyText));
        assert!(server.received_requests().await.expect("recording").is_empty());
    }

    #[tokio::test]
    async fn last_issued_request_wins_even_if_it_resolves_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "devagar"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(gtx_body("slowly", "devagar"))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "rápido"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gtx_body("fast", "rápido")))
            .mount(&server)
            .await;

        let pipeline = pipeline_for(&server, ApiKeys::default());
        let session = Arc::new(Mutex::new(
            Session::new("pt", "en").with_source_text("devagar"),
        ));

        let slow = tokio::spawn({
            let pipeline = pipeline.clone();
            let session = Arc::clone(&session);
            async move { pipeline.translate(&session).await }
        });

        // Wait until the slow request is in flight before issuing the next one.
        loop {
            let seen = server.received_requests().await.expect("recording").len();
            if seen >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        session.lock().await.source_text = "rápido".to_owned();
        let fast = pipeline.translate(&session).await.expect("fast");
        assert_eq!(fast.applied().map(|t| t.text), Some("fast".to_owned()));

        let slow = slow.await.expect("join").expect("slow");
        assert!(slow.is_stale());
        assert_eq!(session.lock().await.target_text(), "fast");
    }

    #[tokio::test]
    async fn failed_translation_leaves_previous_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut initial = Session::new("en", "pt").with_source_text("Hello");
        let token = initial.begin(Field::Translation);
        initial.commit_translation(token, "Olá".to_owned());
        let session = Mutex::new(initial);

        let err = pipeline_for(&server, ApiKeys::default())
            .translate(&session)
            .await
            .expect_err("503");
        assert!(err.to_string().contains("503"));
        assert_eq!(session.lock().await.target_text(), "Olá");
    }

    #[tokio::test]
    async fn tone_without_llm_marks_the_translation() {
        let server = MockServer::start().await;
        let mut initial = Session::new("pt", "en").with_source_text("Bom dia");
        let token = initial.begin(Field::Translation);
        initial.commit_translation(token, "[Tone: Formal] Good morning".to_owned());
        initial.tone = Tone::Friendly;
        initial.engine = Engine::OpenAi;
        let session = Mutex::new(initial);

        let update = pipeline_for(&server, ApiKeys::default())
            .apply_tone(&session)
            .await
            .expect("tone");
        assert_eq!(
            update.applied().map(|t| t.text),
            Some("[Tone: Friendly] Good morning".to_owned())
        );
        assert!(server.received_requests().await.expect("recording").is_empty());
    }

    #[tokio::test]
    async fn tone_with_llm_retranslates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Hey there, good morning!"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut initial = Session::new("pt", "en").with_source_text("Bom dia");
        initial.engine = Engine::OpenAi;
        initial.tone = Tone::Casual;
        let session = Mutex::new(initial);

        let keys = ApiKeys {
            openai: ApiKey::usable("sk-live"),
            gemini: None,
        };
        let update = pipeline_for(&server, keys)
            .apply_tone(&session)
            .await
            .expect("tone");
        assert_eq!(
            update.applied().map(|t| t.text),
            Some("Hey there, good morning!".to_owned())
        );

        let requests = server.received_requests().await.expect("recording");
        let body: serde_json::Value = requests[0].body_json().expect("json body");
        let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
        assert!(prompt.contains("casual and conversational"), "{prompt}");
    }
}
