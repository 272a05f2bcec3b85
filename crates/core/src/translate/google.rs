use crate::lang::Engine;
use crate::translate::{TranslateError, Translation, TranslationRequest, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde_json::Value;

/// Unauthenticated web endpoint. Good enough for practice sentences, with no
/// availability guarantee.
#[derive(Clone)]
pub struct GoogleFreeTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleFreeTranslator {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, request: &TranslationRequest) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint,
            urlencoding::encode(&request.source_lang),
            urlencoding::encode(&request.target_lang),
            urlencoding::encode(&request.text)
        )
    }
}

/// `[[["Hola","Hello",...], ["mundo","world",...]], ...]` -> "Holamundo"
fn join_segments(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::InvalidResponse("missing segment list".to_owned()))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}

impl Translator for GoogleFreeTranslator {
    fn translate(
        &self,
        request: TranslationRequest,
    ) -> BoxFuture<'_, Result<Translation, TranslateError>> {
        async move {
            let url = self.request_url(&request);
            tracing::debug!(
                source_lang = %request.source_lang,
                target_lang = %request.target_lang,
                chars = request.text.chars().count(),
                "calling free translation endpoint"
            );

            let response = self.client.get(&url).send().await?;

            if !response.status().is_success() {
                let status = response.status();
                return Err(TranslateError::Http {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or_default().to_owned(),
                });
            }

            let body: Value = response
                .json()
                .await
                .map_err(|e| {
                    TranslateError::InvalidResponse(format!("failed to parse JSON: {e}"))
                })?;

            Ok(Translation {
                text: join_segments(&body)?,
                engine: Engine::Google,
            })
        }
        .boxed()
    }
}
