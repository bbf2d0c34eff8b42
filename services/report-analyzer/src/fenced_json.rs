//! JSON parsing for model output. The text has to be a single JSON value,
//! optionally wrapped in one Markdown code fence; prose around it is rejected.

use serde_json::Value;

const FENCE: &str = "```";

/// Parse `input` after trimming it and removing an enclosing code fence.
pub fn parse_fenced_json(input: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_code_fence(input.trim()))
}

/// Strips a fence only when the text both opens and closes with one.
fn strip_code_fence(s: &str) -> &str {
    let Some(inner) = s
        .strip_prefix(FENCE)
        .and_then(|rest| rest.strip_suffix(FENCE))
    else {
        return s;
    };
    inner.strip_prefix("json").unwrap_or(inner).trim()
}
