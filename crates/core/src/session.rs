//! The state behind one translation screen.
//!
//! Async work snapshots what it needs under a request token and may only
//! write back while that token is still the latest for its field.

use crate::config::{AppConfig, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG};
use crate::grammar::Finding;
use crate::lang::{Engine, Tone};
use crate::translate::{strip_tone_marker, TranslationRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Translation,
    Grammar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestToken {
    field: Field,
    seq: u64,
}

impl RequestToken {
    pub fn field(self) -> Field {
        self.field
    }
}

/// Hands out increasing tokens per field. The last token issued wins,
/// whatever order the responses arrive in.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    translation: u64,
    grammar: u64,
}

impl RequestTracker {
    fn counter(&mut self, field: Field) -> &mut u64 {
        match field {
            Field::Translation => &mut self.translation,
            Field::Grammar => &mut self.grammar,
        }
    }

    pub fn begin(&mut self, field: Field) -> RequestToken {
        let counter = self.counter(field);
        *counter += 1;
        RequestToken {
            field,
            seq: *counter,
        }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        let latest = match token.field {
            Field::Translation => self.translation,
            Field::Grammar => self.grammar,
        };
        latest == token.seq
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update<T> {
    Applied(T),
    /// A newer request for the same field was issued; the result was dropped.
    Stale,
}

impl<T> Update<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Update::Applied(v) => Some(v),
            Update::Stale => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Update::Stale)
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    pub source_lang: String,
    pub target_lang: String,
    pub source_text: String,
    pub engine: Engine,
    pub tone: Tone,
    target_text: String,
    findings: Vec<Finding>,
    tracker: RequestTracker,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG)
    }
}

impl Session {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            source_text: String::new(),
            engine: Engine::default(),
            tone: Tone::default(),
            target_text: String::new(),
            findings: Vec::new(),
            tracker: RequestTracker::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.source_lang.as_str(), config.target_lang.as_str())
            .with_engine(config.engine)
            .with_tone(config.tone)
    }

    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = text.into();
        self
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn begin(&mut self, field: Field) -> RequestToken {
        self.tracker.begin(field)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.tracker.is_current(token)
    }

    /// Snapshot of the current source text as a request, with the session tone.
    pub fn translation_request(&self) -> TranslationRequest {
        TranslationRequest::new(
            self.source_text.clone(),
            self.source_lang.clone(),
            self.target_lang.clone(),
        )
        .with_tone(self.tone)
    }

    pub fn commit_translation(&mut self, token: RequestToken, text: String) -> Update<()> {
        if token.field != Field::Translation || !self.is_current(token) {
            tracing::debug!(seq = token.seq, "dropping stale translation");
            return Update::Stale;
        }
        self.target_text = text;
        Update::Applied(())
    }

    pub fn commit_findings(&mut self, token: RequestToken, findings: Vec<Finding>) -> Update<()> {
        if token.field != Field::Grammar || !self.is_current(token) {
            tracing::debug!(seq = token.seq, "dropping stale grammar analysis");
            return Update::Stale;
        }
        self.findings = findings;
        Update::Applied(())
    }

    /// Exchanges the languages, and the texts too when a translation exists.
    pub fn swap_languages(&mut self) {
        std::mem::swap(&mut self.source_lang, &mut self.target_lang);
        if !self.target_text.is_empty() {
            std::mem::swap(&mut self.source_text, &mut self.target_text);
            self.source_text = strip_tone_marker(&self.source_text).to_owned();
            self.findings.clear();
            // In-flight work describes the old direction.
            self.tracker.begin(Field::Translation);
            self.tracker.begin(Field::Grammar);
        }
    }

    pub fn clear(&mut self) {
        self.source_text.clear();
        self.target_text.clear();
        self.findings.clear();
        self.tracker.begin(Field::Translation);
        self.tracker.begin(Field::Grammar);
    }
}
