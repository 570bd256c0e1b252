//! Helpers for reading JSON out of free-form model replies.

use serde_json::Value;

/// Strip a surrounding Markdown code fence (```` ```json ... ``` ````) and
/// any stray backticks.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = match trimmed.strip_prefix("```") {
        // Drop the info string ("json") on the opening fence line.
        Some(rest) => match rest.split_once('\n') {
            Some((_, body)) => body.trim_end().strip_suffix("```").unwrap_or(body),
            // Fence and payload on one line: ```[1, 2]```
            None => rest.trim_end_matches('`'),
        },
        None => trimmed,
    };
    inner.trim().trim_matches('`').trim()
}

/// Parse a model reply as JSON, tolerating code fences around it.
pub fn parse_json_reply(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim())
        .ok()
        .or_else(|| serde_json::from_str(strip_code_fences(text)).ok())
}
