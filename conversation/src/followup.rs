//! Continuation-request detection.
//!
//! A purely stateless pattern test: does this message ask for more of
//! the previous answer ("또?", "다른 곳은?", "더 알려줘") or is it a
//! fresh query?

use std::sync::LazyLock;

use regex::Regex;

/// Standalone "또"/"또?" or any continuation fragment anywhere in the text.
static FOLLOWUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(또\??|또)$|(다른 곳|또 다른|그 외|그밖에|추가로|더 있어|더 없어|더 보여|또 어디|또 뭐|또 있|나머지|계속|다시|더 말|더 알려|또 알려|그럼|그 외에도|다른 데|추가 있)",
    )
    .unwrap()
});

/// True when the message is a request to continue the previous
/// multi-item answer. No side effects.
pub fn is_followup(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && FOLLOWUP_PATTERN.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_more_matches() {
        assert!(is_followup("또"));
        assert!(is_followup("또?"));
        assert!(is_followup(" 또? "));
    }

    #[test]
    fn continuation_fragments_match_anywhere() {
        assert!(is_followup("다른 곳은 없어?"));
        assert!(is_followup("그 외에 더 있어?"));
        assert!(is_followup("나머지도 알려줘"));
        assert!(is_followup("계속"));
        assert!(is_followup("더 알려줘"));
    }

    #[test]
    fn fresh_queries_do_not_match() {
        assert!(!is_followup(""));
        assert!(!is_followup("공학관 어디야?"));
        assert!(!is_followup("어디서 공부할 수 있어?"));
    }
}
