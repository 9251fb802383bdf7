//! Helpers for pulling structured JSON out of completion text.
//!
//! Models are asked to respond with bare JSON but routinely wrap it in
//! markdown code fences or surround it with prose. These helpers strip
//! that decoration before serde gets involved.

/// Strip a surrounding markdown code fence, if present.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Extract the outermost JSON object from completion text.
///
/// Returns the slice from the first `{` to the last `}`, after fence
/// stripping. Returns None when no object is present.
pub fn extract_json(text: &str) -> Option<&str> {
    let stripped = strip_code_fences(text);
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&stripped[start..=end])
}

/// Truncate text for inclusion in error messages and prompts.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
