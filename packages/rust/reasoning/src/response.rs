//! Recovery of a JSON payload from model output.
//!
//! Models asked for JSON still wrap it in Markdown fences or surround it with
//! prose. We accept, in order: the whole text as JSON, the first fenced code
//! block, then the outermost `{...}` span. Anything else is a parse failure.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use plancheck_shared::ReasoningError;

/// Maximum characters of offending output quoted in an error message.
const SNIPPET_CHARS: usize = 200;

/// Parse model output into JSON.
pub fn parse_json_payload(text: &str) -> Result<Value, ReasoningError> {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid regex")
    });

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ReasoningError::ResponseParse("empty response".into()));
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(inner) = FENCE_RE.captures(trimmed).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str::<Value>(inner.as_str().trim()) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(ReasoningError::ResponseParse(format!(
        "no JSON object in output (got: {})",
        snippet(trimmed)
    )))
}

/// First few characters of `text`, on a char boundary.
pub(crate) fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json() {
        let value = parse_json_payload(r#"{"riskIndex": 40}"#).unwrap();
        assert_eq!(value, json!({ "riskIndex": 40 }));
    }

    #[test]
    fn fenced_json() {
        let text = "Here is the review:\n```json\n{\"overallStatus\": \"Pass\"}\n```\nThanks.";
        let value = parse_json_payload(text).unwrap();
        assert_eq!(value["overallStatus"], "Pass");
    }

    #[test]
    fn bare_fence_without_language() {
        let text = "```\n{\"total\": 1200000}\n```";
        assert_eq!(parse_json_payload(text).unwrap()["total"], 1_200_000);
    }

    #[test]
    fn object_embedded_in_prose() {
        let text = "Sure! {\"level\": \"High\", \"hazards\": []} Let me know if you need more.";
        assert_eq!(parse_json_payload(text).unwrap()["level"], "High");
    }

    #[test]
    fn non_object_json_is_returned_as_is() {
        assert_eq!(parse_json_payload("[1, 2]").unwrap(), json!([1, 2]));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_json_payload("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ReasoningError::ResponseParse(_)));
        assert!(err.to_string().contains("I cannot help"));
    }

    #[test]
    fn empty_is_a_parse_error() {
        assert!(matches!(
            parse_json_payload("   \n"),
            Err(ReasoningError::ResponseParse(_))
        ));
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let long = "é".repeat(500);
        let s = snippet(&long);
        assert!(s.ends_with('…'));
        assert_eq!(s.chars().count(), SNIPPET_CHARS + 1);
    }
}
