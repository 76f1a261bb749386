//! Completion-model reply parsing.
//!
//! The model is instructed to emit a `답변:` line and a `제목:` line;
//! either label may be followed by `:` or `-`. A missing line yields an
//! empty string and the controller substitutes defaults.

use std::sync::LazyLock;

use regex::Regex;

static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"답변[:\-]\s*(.+)").unwrap());
static TITLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"제목[:\-]\s*(.+)").unwrap());

/// Extracts (answer, title) from the raw model reply; absent labels give
/// empty strings.
pub fn parse_model_reply(reply: &str) -> (String, String) {
    let answer = ANSWER_LINE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let title = TITLE_LINE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    (answer, title)
}
