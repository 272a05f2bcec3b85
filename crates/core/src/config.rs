use crate::lang::{Engine, SpeechRate, Tone, VoiceEngine};
use crate::settings::KeyStore;
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};

pub const DEFAULT_SOURCE_LANG: &str = "pt";
pub const DEFAULT_TARGET_LANG: &str = "en";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ESPEAK_BINARY: &str = "espeak-ng";

/// Placeholder shown in the key field when no OpenAI key has been entered.
pub const API_KEY_SENTINEL: &str = "sk-********************";

pub const STORAGE_OPENAI_KEY: &str = "openai-key";
pub const STORAGE_GEMINI_KEY: &str = "gemini-key";

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_SETTINGS_PATH: &str = "LINGUAIO_SETTINGS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "LINGUAIO_TIMEOUT_SECS";
pub const ENV_SOURCE_LANG: &str = "LINGUAIO_SOURCE_LANG";
pub const ENV_TARGET_LANG: &str = "LINGUAIO_TARGET_LANG";
pub const ENV_ENGINE: &str = "LINGUAIO_ENGINE";
pub const ENV_TONE: &str = "LINGUAIO_TONE";
pub const ENV_VOICE: &str = "LINGUAIO_VOICE";
pub const ENV_SPEECH_RATE: &str = "LINGUAIO_SPEECH_RATE";
pub const ENV_ESPEAK_BINARY: &str = "LINGUAIO_ESPEAK";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyLanguage);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        if trimmed == API_KEY_SENTINEL {
            return Err(ConfigError::PlaceholderApiKey);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`ApiKey::new`], but treats empty and placeholder values as "unset".
    pub fn usable<S: Into<String>>(value: S) -> Option<Self> {
        Self::new(value).ok()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeys {
    pub openai: Option<ApiKey>,
    pub gemini: Option<ApiKey>,
}

impl ApiKeys {
    /// The key an engine needs, if it needs one and one is configured.
    pub fn for_engine(&self, engine: Engine) -> Option<&ApiKey> {
        match engine {
            Engine::Google => None,
            Engine::OpenAi => self.openai.as_ref(),
            Engine::Gemini => self.gemini.as_ref(),
        }
    }
}

/// Base URLs of every remote service. Tests point these at a mock server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub google_translate_url: String,
    pub openai_base_url: String,
    pub gemini_base_url: String,
}

impl Endpoints {
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            google_translate_url: format!("{base}/translate_a/single"),
            openai_base_url: format!("{base}/v1"),
            gemini_base_url: format!("{base}/v1beta"),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for raw in [
            &self.google_translate_url,
            &self.openai_base_url,
            &self.gemini_base_url,
        ] {
            url::Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint {
                url: raw.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google_translate_url: DEFAULT_GOOGLE_TRANSLATE_URL.to_owned(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_owned(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub source_lang: LanguageCode,
    pub target_lang: LanguageCode,
    pub engine: Engine,
    pub tone: Tone,
    pub voice: VoiceEngine,
    pub speech_rate: SpeechRate,
    /// Executable behind the on-device voice.
    pub espeak_binary: PathBuf,
    pub api_keys: ApiKeys,
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: LanguageCode(DEFAULT_SOURCE_LANG.to_owned()),
            target_lang: LanguageCode(DEFAULT_TARGET_LANG.to_owned()),
            engine: Engine::default(),
            tone: Tone::default(),
            voice: VoiceEngine::default(),
            speech_rate: SpeechRate::default(),
            espeak_binary: PathBuf::from(DEFAULT_ESPEAK_BINARY),
            api_keys: ApiKeys::default(),
            endpoints: Endpoints::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("language code must not be empty")]
    EmptyLanguage,
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("api key is still the placeholder value")]
    PlaceholderApiKey,
    #[error("request timeout must be > 0 s")]
    ZeroTimeout,
    #[error("invalid endpoint url {url}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

pub fn request_timeout(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::ZeroTimeout);
    }
    Ok(Duration::from_secs(secs))
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Resolves a key from, in order: the command line, the environment, the settings store.
///
/// Empty values and the placeholder sentinel count as absent at every layer, so a
/// placeholder typed on the command line still lets a stored key through.
pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    store: &dyn KeyStore,
    storage_key: &str,
) -> Option<ApiKey> {
    cli_value
        .and_then(ApiKey::usable)
        .or_else(|| env.var(env_key).and_then(ApiKey::usable))
        .or_else(|| store.get(storage_key).and_then(ApiKey::usable))
}

pub fn resolve_api_keys(
    openai_cli: Option<String>,
    gemini_cli: Option<String>,
    env: &impl Env,
    store: &dyn KeyStore,
) -> ApiKeys {
    ApiKeys {
        openai: resolve_api_key(
            openai_cli,
            ENV_OPENAI_API_KEY,
            env,
            store,
            STORAGE_OPENAI_KEY,
        ),
        gemini: resolve_api_key(
            gemini_cli,
            ENV_GEMINI_API_KEY,
            env,
            store,
            STORAGE_GEMINI_KEY,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryKeyStore;

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_OPENAI_API_KEY, "env-key");
        let store = MemoryKeyStore::default();
        let key = resolve_api_key(
            Some("cli-key".to_owned()),
            ENV_OPENAI_API_KEY,
            &env,
            &store,
            STORAGE_OPENAI_KEY,
        )
        .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_OPENAI_API_KEY, "env-key");
        let store = MemoryKeyStore::default().with_entry(STORAGE_OPENAI_KEY, "stored-key");
        let key = resolve_api_key(None, ENV_OPENAI_API_KEY, &env, &store, STORAGE_OPENAI_KEY)
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn api_key_store_used_when_field_holds_placeholder() {
        let env = MapEnv::default();
        let store = MemoryKeyStore::default().with_entry(STORAGE_OPENAI_KEY, "stored-key");
        let key = resolve_api_key(
            Some(API_KEY_SENTINEL.to_owned()),
            ENV_OPENAI_API_KEY,
            &env,
            &store,
            STORAGE_OPENAI_KEY,
        )
        .expect("present");
        assert_eq!(key.expose(), "stored-key");
    }

    #[test]
    fn placeholder_everywhere_means_no_key() {
        let env = MapEnv::default().with_var(ENV_GEMINI_API_KEY, "  ");
        let store = MemoryKeyStore::default().with_entry(STORAGE_GEMINI_KEY, API_KEY_SENTINEL);
        let keys = resolve_api_keys(None, Some(String::new()), &env, &store);
        assert_eq!(keys, ApiKeys::default());
    }

    #[test]
    fn api_key_rejects_sentinel_and_redacts_debug() {
        assert_eq!(
            ApiKey::new(API_KEY_SENTINEL),
            Err(ConfigError::PlaceholderApiKey)
        );
        let key = ApiKey::new("sk-secret").expect("valid");
        assert_eq!(format!("{key:?}"), "ApiKey(**redacted**)");
    }

    #[test]
    fn keys_for_engine() {
        let keys = ApiKeys {
            openai: ApiKey::usable("sk-1"),
            gemini: None,
        };
        assert!(keys.for_engine(Engine::Google).is_none());
        assert_eq!(
            keys.for_engine(Engine::OpenAi).map(ApiKey::expose),
            Some("sk-1")
        );
        assert!(keys.for_engine(Engine::Gemini).is_none());
    }

    #[test]
    fn language_code_is_normalized() {
        let code = LanguageCode::new(" PT ").expect("valid");
        assert_eq!(code.as_str(), "pt");
        assert_eq!(LanguageCode::new("   "), Err(ConfigError::EmptyLanguage));
    }

    #[test]
    fn endpoints_with_base_are_valid() {
        let endpoints = Endpoints::with_base("http://127.0.0.1:9999/");
        assert_eq!(
            endpoints.google_translate_url,
            "http://127.0.0.1:9999/translate_a/single"
        );
        assert!(endpoints.validate().is_ok());

        let broken = Endpoints {
            openai_base_url: "not a url".to_owned(),
            ..Endpoints::default()
        };
        assert!(matches!(
            broken.validate(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert_eq!(request_timeout(0), Err(ConfigError::ZeroTimeout));
        assert_eq!(request_timeout(5), Ok(Duration::from_secs(5)));
    }
}
