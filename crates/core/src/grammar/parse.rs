//! Lenient parsing of LLM grammar replies.
//!
//! Models wrap the requested JSON in prose, code fences, or return something
//! else entirely. Parsing never fails: the last resort is a single finding
//! carrying the raw reply.

use crate::grammar::{Finding, MAX_FINDINGS};
use serde_json::Value;

const FALLBACK_NAME: &str = "Text Analysis";
const PLACEHOLDER_EXAMPLES: [&str; 3] = ["Example 1", "Example 2", "Example 3"];

/// Returns every balanced `[...]` slice of `text`, outermost first, in order of
/// their opening bracket. Brackets inside JSON string literals are ignored.
pub fn extract_json_array(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut start = 0;

    while let Some(offset) = text[start..].find('[') {
        let open = start + offset;
        if let Some(close) = matching_bracket(bytes, open) {
            found.push(&text[open..=close]);
        }
        start = open + 1;
    }
    found
}

fn matching_bracket(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn findings_from_value(value: Value) -> Option<Vec<Finding>> {
    let findings: Vec<Finding> = match value {
        Value::Array(_) => serde_json::from_value(value).ok(),
        Value::Object(ref map) => {
            let mut arrays = map.values().filter(|v| v.is_array());
            match (arrays.next(), arrays.next()) {
                (Some(only), None) => serde_json::from_value(only.clone()).ok(),
                _ => serde_json::from_value::<Finding>(value).ok().map(|f| vec![f]),
            }
        }
        _ => None,
    }?;
    (!findings.is_empty()).then_some(findings)
}

fn fallback_finding(raw: &str) -> Finding {
    Finding::new(FALLBACK_NAME, raw).with_examples(
        PLACEHOLDER_EXAMPLES
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
    )
}

/// Tries, in order: an embedded JSON array, the whole reply as JSON, then a
/// single synthetic finding. At most [`MAX_FINDINGS`] findings are kept.
pub fn parse_findings(raw: &str) -> Vec<Finding> {
    let content = raw.trim();

    let embedded = extract_json_array(content)
        .into_iter()
        .filter_map(|slice| serde_json::from_str::<Vec<Finding>>(slice).ok())
        .find(|findings| !findings.is_empty());

    let mut findings = embedded
        .or_else(|| {
            serde_json::from_str::<Value>(content)
                .ok()
                .and_then(findings_from_value)
        })
        .unwrap_or_else(|| {
            tracing::debug!("grammar reply is not JSON; keeping it as free text");
            vec![fallback_finding(content)]
        });

    findings.truncate(MAX_FINDINGS);
    findings
}
