//! Designator cleanup for OCR text attached to endpoints.

use regex::Regex;
use std::sync::LazyLock;

static DESIGNATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[RCDL]\d+").expect("designator pattern is valid"));

/// Extract a part designator (`R12`, `C3`, `D1`, `L4`) from raw OCR text.
pub fn normalize_designator(raw: &str) -> Option<String> {
    let m = DESIGNATOR.find(raw)?;
    let s = m.as_str();
    let mut out = String::with_capacity(s.len());
    out.push(s.as_bytes()[0].to_ascii_uppercase() as char);
    out.push_str(&s[1..]);
    Some(out)
}

/// Label for a node: the designator when one is found, otherwise the
/// trimmed text, or nothing for blank text.
pub fn node_label(raw: &str) -> Option<String> {
    if let Some(d) = normalize_designator(raw) {
        return Some(d);
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        tracing::debug!(text = trimmed, "OCR text has no part designator, keeping it verbatim");
        Some(trimmed.to_string())
    }
}
