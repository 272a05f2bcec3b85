use crate::config::{ApiKeys, Endpoints};
use crate::lang::Engine;
use crate::llm::{GeminiClient, OpenAiChatClient};
use crate::translate::{
    GoogleFreeTranslator, LlmTranslator, TranslateError, Translation, TranslationRequest,
    Translator,
};
use reqwest::Client;

/// Routes a request to the provider behind the selected engine.
#[derive(Clone)]
pub struct EngineDispatcher {
    client: Client,
    endpoints: Endpoints,
}

impl EngineDispatcher {
    pub fn new(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    /// A keyed engine without a key short-circuits with
    /// [`TranslateError::MissingCredential`] before anything touches the network.
    pub async fn translate(
        &self,
        request: TranslationRequest,
        engine: Engine,
        keys: &ApiKeys,
    ) -> Result<Translation, TranslateError> {
        tracing::info!(
            engine = %engine,
            source_lang = %request.source_lang,
            target_lang = %request.target_lang,
            "dispatching translation"
        );

        let result = match engine {
            Engine::Google => {
                GoogleFreeTranslator::new(
                    self.client.clone(),
                    self.endpoints.google_translate_url.as_str(),
                )
                .translate(request)
                .await
            }
            Engine::OpenAi => {
                let key = keys
                    .openai
                    .clone()
                    .ok_or(TranslateError::MissingCredential(engine))?;
                let client = OpenAiChatClient::new(
                    self.client.clone(),
                    key,
                    &self.endpoints.openai_base_url,
                );
                LlmTranslator::new(client).translate(request).await
            }
            Engine::Gemini => {
                let key = keys
                    .gemini
                    .clone()
                    .ok_or(TranslateError::MissingCredential(engine))?;
                let client =
                    GeminiClient::new(self.client.clone(), key, &self.endpoints.gemini_base_url);
                LlmTranslator::new(client).translate(request).await
            }
        };

        if let Err(e) = &result {
            tracing::warn!(engine = %engine, error = %e, "translation failed");
        }
        result
    }
}
