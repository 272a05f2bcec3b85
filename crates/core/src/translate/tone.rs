use crate::lang::Tone;
use regex::Regex;
use std::sync::OnceLock;

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"^\[Tone: [^\]]+\] ").expect("valid tone marker regex"))
}

/// Prefixes `[Tone: <label>] ` to a translation, replacing any marker already there.
///
/// Used when no LLM is available to actually rewrite the text in the new tone.
pub fn apply_tone_marker(text: &str, tone: Tone) -> String {
    format!("[Tone: {}] {}", tone.label(), strip_tone_marker(text))
}

pub fn strip_tone_marker(text: &str) -> &str {
    match marker_regex().find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_unmarked_text() {
        assert_eq!(
            apply_tone_marker("Good morning", Tone::Formal),
            "[Tone: Formal] Good morning"
        );
    }

    #[test]
    fn replaces_existing_marker_instead_of_stacking() {
        let once = apply_tone_marker("Good morning", Tone::Formal);
        let twice = apply_tone_marker(&once, Tone::Friendly);
        assert_eq!(twice, "[Tone: Friendly] Good morning");
    }

    #[test]
    fn strip_leaves_plain_text_alone() {
        assert_eq!(strip_tone_marker("[not a marker"), "[not a marker");
        assert_eq!(strip_tone_marker("[Tone: Casual] hi"), "hi");
    }
}
