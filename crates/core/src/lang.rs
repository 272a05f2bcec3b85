//! Static lookup tables: languages, tones, engines, voices and speech rates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// (code, English display name, speech-synthesis locale)
const LANGUAGES: &[(&str, &str, &str)] = &[
    ("pt", "Portuguese", "pt-BR"),
    ("en", "English", "en-US"),
    ("es", "Spanish", "es-ES"),
    ("fr", "French", "fr-FR"),
    ("de", "German", "de-DE"),
    ("it", "Italian", "it-IT"),
];

const DEFAULT_SPEECH_LOCALE: &str = "en-US";
const DEFAULT_SPEECH_LANGUAGE: &str = "en";

fn lookup(code: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    LANGUAGES
        .iter()
        .find(|(c, _, _)| c.eq_ignore_ascii_case(code))
}

/// English name of a language code; unknown codes come back unchanged.
pub fn language_name(code: &str) -> &str {
    match lookup(code) {
        Some((_, name, _)) => *name,
        None => code,
    }
}

pub fn speech_locale(code: &str) -> &'static str {
    lookup(code)
        .map(|(_, _, locale)| *locale)
        .unwrap_or(DEFAULT_SPEECH_LOCALE)
}

/// Two-letter language the speech API expects; unknown codes fall back to English.
pub fn speech_language(code: &str) -> &'static str {
    lookup(code)
        .map(|(c, _, _)| *c)
        .unwrap_or(DEFAULT_SPEECH_LANGUAGE)
}

pub fn supported_languages() -> impl Iterator<Item = (&'static str, &'static str)> {
    LANGUAGES.iter().map(|(code, name, _)| (*code, *name))
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Google,
    OpenAi,
    Gemini,
}

impl Engine {
    pub fn id(self) -> &'static str {
        match self {
            Engine::Google => "google",
            Engine::OpenAi => "openai",
            Engine::Gemini => "gemini",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Engine::Google => "Google Translate",
            Engine::OpenAi => "OpenAI",
            Engine::Gemini => "Google Gemini",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "google" => Some(Engine::Google),
            "openai" => Some(Engine::OpenAi),
            "gemini" => Some(Engine::Gemini),
            _ => None,
        }
    }

    /// Parses an engine id, falling back to the free endpoint for anything unknown.
    pub fn from_id(id: &str) -> Self {
        Self::parse(id).unwrap_or_default()
    }

    pub fn requires_key(self) -> bool {
        !matches!(self, Engine::Google)
    }

    /// Shown instead of a translation when a keyed engine has no key.
    pub fn missing_key_message(self) -> &'static str {
        match self {
            Engine::OpenAi => "Please configure a valid OpenAI API key in Settings.",
            Engine::Gemini => "Please configure a valid Google Gemini API key in Settings.",
            Engine::Google => "Google Translate does not need an API key.",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Tone {
    #[default]
    Neutral,
    Casual,
    Formal,
    Professional,
    Friendly,
}

/// Used when a tone label is not in the table.
pub const FALLBACK_TONE_DESCRIPTION: &str = "neutral";

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Neutral,
        Tone::Casual,
        Tone::Formal,
        Tone::Professional,
        Tone::Friendly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tone::Neutral => "Neutral",
            Tone::Casual => "Casual",
            Tone::Formal => "Formal",
            Tone::Professional => "Professional",
            Tone::Friendly => "Friendly",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tone::Neutral => "neutral and straightforward",
            Tone::Casual => "casual and conversational",
            Tone::Formal => "formal and professional",
            Tone::Professional => "business appropriate and technical",
            Tone::Friendly => "friendly and approachable",
        }
    }

    /// Accepts the English labels and the Portuguese ones the first UI shipped with.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "neutral" | "neutro" => Some(Tone::Neutral),
            "casual" => Some(Tone::Casual),
            "formal" => Some(Tone::Formal),
            "professional" | "profissional" => Some(Tone::Professional),
            "friendly" | "amigável" | "amigavel" => Some(Tone::Friendly),
            _ => None,
        }
    }
}

pub fn tone_description(label: &str) -> &'static str {
    Tone::parse_label(label)
        .map(Tone::description)
        .unwrap_or(FALLBACK_TONE_DESCRIPTION)
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoiceEngine {
    /// Voice installed on the machine.
    #[default]
    System,
    /// Keyed speech-synthesis API.
    OpenAi,
}

impl VoiceEngine {
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "system" | "google" => Some(VoiceEngine::System),
            "openai" | "whisper" => Some(VoiceEngine::OpenAi),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub enum SpeechRate {
    #[default]
    Normal,
    Slow,
    VerySlow,
}

impl SpeechRate {
    pub fn factor(self) -> f32 {
        match self {
            SpeechRate::Normal => 1.0,
            SpeechRate::Slow => 0.7,
            SpeechRate::VerySlow => 0.5,
        }
    }

    /// "very slow" has to be tested before "slow" since one contains the other.
    pub fn parse_label(label: &str) -> Self {
        let l = label.trim().to_lowercase().replace('-', " ");
        if l.contains("very slow") || l.contains("muito lenta") {
            SpeechRate::VerySlow
        } else if l.contains("slow") || l.contains("lenta") {
            SpeechRate::Slow
        } else {
            SpeechRate::Normal
        }
    }
}
