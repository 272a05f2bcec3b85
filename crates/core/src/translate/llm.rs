use crate::lang::language_name;
use crate::llm::{ChatPrompt, LlmClient};
use crate::translate::{TranslateError, Translation, TranslationRequest, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;

pub const TRANSLATOR_SYSTEM_PROMPT: &str = "You are a professional translator.";

pub fn translation_prompt(request: &TranslationRequest) -> String {
    format!(
        "Translate the following text from {} to {}.\n\
         Use a {} tone.\n\
         Original text: \"{}\"\n\
         Translation:",
        language_name(&request.source_lang),
        language_name(&request.target_lang),
        request.tone.description(),
        request.text
    )
}

/// Translates through any keyed LLM provider.
#[derive(Clone)]
pub struct LlmTranslator<C> {
    client: C,
}

impl<C: LlmClient> LlmTranslator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: LlmClient> Translator for LlmTranslator<C> {
    fn translate(
        &self,
        request: TranslationRequest,
    ) -> BoxFuture<'_, Result<Translation, TranslateError>> {
        async move {
            let engine = self.client.engine();
            tracing::debug!(
                engine = %engine,
                source_lang = %language_name(&request.source_lang),
                target_lang = %language_name(&request.target_lang),
                tone = %request.tone,
                "requesting LLM translation"
            );

            let prompt = ChatPrompt::new(TRANSLATOR_SYSTEM_PROMPT, translation_prompt(&request));
            let text = self
                .client
                .complete(prompt)
                .await
                .map_err(|source| TranslateError::Provider { engine, source })?;

            Ok(Translation { text, engine })
        }
        .boxed()
    }
}
