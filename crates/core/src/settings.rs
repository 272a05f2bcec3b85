//! Key/value persistence for API keys.
//!
//! The store is a flat JSON object on disk. Only explicit saves write to it.

use crate::config::{Env, ENV_SETTINGS_PATH, STORAGE_GEMINI_KEY, STORAGE_OPENAI_KEY};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SETTINGS_DIR: &str = "linguaio";
const SETTINGS_FILE: &str = "settings.json";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is not a JSON object of strings: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no config directory available; pass --settings or set LINGUAIO_SETTINGS")]
    NoConfigDir,
}

pub trait KeyStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryKeyStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyStore {
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FileKeyStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileKeyStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| SettingsError::Malformed {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SettingsError::Read { path, source }),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "settings loaded");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let body = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            SettingsError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, body).map_err(write_err)
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.flush()
    }
}

/// `--settings` flag, then `LINGUAIO_SETTINGS`, then the platform config directory.
pub fn settings_path(cli_value: Option<PathBuf>, env: &impl Env) -> Result<PathBuf, SettingsError> {
    if let Some(p) = cli_value {
        return Ok(p);
    }
    if let Some(p) = env.var(ENV_SETTINGS_PATH) {
        return Ok(PathBuf::from(p));
    }
    dirs_next::config_dir()
        .map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
        .ok_or(SettingsError::NoConfigDir)
}

/// Saves whichever keys were provided. Blank values leave the stored entry untouched.
pub fn save_api_keys(
    store: &mut dyn KeyStore,
    openai: Option<&str>,
    gemini: Option<&str>,
) -> Result<Vec<&'static str>, SettingsError> {
    let mut saved = Vec::new();
    for (storage_key, value) in [(STORAGE_OPENAI_KEY, openai), (STORAGE_GEMINI_KEY, gemini)] {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => {
                store.set(storage_key, v)?;
                saved.push(storage_key);
            }
            _ => {}
        }
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnv;

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileKeyStore::open(dir.path().join("nope.json")).expect("open");
        assert_eq!(store.get(STORAGE_OPENAI_KEY), None);
    }

    #[test]
    fn saved_keys_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let mut store = FileKeyStore::open(&path).expect("open");
        let saved = save_api_keys(&mut store, Some("sk-abc"), Some("  ")).expect("save");
        assert_eq!(saved, vec![STORAGE_OPENAI_KEY]);

        let reopened = FileKeyStore::open(&path).expect("reopen");
        assert_eq!(reopened.get(STORAGE_OPENAI_KEY).as_deref(), Some("sk-abc"));
        assert_eq!(reopened.get(STORAGE_GEMINI_KEY), None);
    }

    #[test]
    fn blank_save_keeps_previous_value() {
        let mut store = MemoryKeyStore::default().with_entry(STORAGE_GEMINI_KEY, "old");
        save_api_keys(&mut store, None, Some("")).expect("save");
        assert_eq!(store.get(STORAGE_GEMINI_KEY).as_deref(), Some("old"));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2, 3]").expect("write");
        assert!(matches!(
            FileKeyStore::open(&path),
            Err(SettingsError::Malformed { .. })
        ));
    }

    #[test]
    fn settings_path_prefers_cli_then_env() {
        let env = MapEnv::default().with_var(ENV_SETTINGS_PATH, "/tmp/from-env.json");
        assert_eq!(
            settings_path(Some(PathBuf::from("/tmp/cli.json")), &env).expect("path"),
            PathBuf::from("/tmp/cli.json")
        );
        assert_eq!(
            settings_path(None, &env).expect("path"),
            PathBuf::from("/tmp/from-env.json")
        );
    }
}
