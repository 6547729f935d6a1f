// src/normalize.rs
//! Free-text canonicalization used for keyword and pattern search.

use once_cell::sync::Lazy;
use regex::Regex;

// \w is Unicode-aware; Hangul ranges are listed explicitly so jamo never get stripped.
static RE_STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w가-힣ㄱ-ㅎㅏ-ㅣ\s]").expect("strip regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Lowercase, replace punctuation/symbols with spaces, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    let lowered = s.to_lowercase();
    let stripped = RE_STRIP.replace_all(&lowered, " ");
    let collapsed = RE_WS.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}
