// filterhtml-core/src/diagnostics.rs
//! Log-safe rendering of untrusted input.
//!
//! Markup handed to the filter is attacker-controlled. Debug logs describe what
//! was stripped without echoing it, unless `FILTERHTML_ALLOW_DEBUG_VALUES=true`.

use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    /// Read once; whether raw untrusted values may appear in debug logs.
    static ref DEBUG_VALUES_ALLOWED: bool = {
        std::env::var("FILTERHTML_ALLOW_DEBUG_VALUES")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// Placeholder for an untrusted value.
pub fn mask_untrusted(s: &str) -> String {
    const MAX_LEN: usize = 8;
    let len = s.chars().count();
    if len <= MAX_LEN {
        "[UNTRUSTED]".to_string()
    } else {
        format!("[UNTRUSTED: {} chars]", len)
    }
}

/// The value itself when debug values are allowed, a placeholder otherwise.
pub fn loggable(untrusted: &str) -> String {
    if *DEBUG_VALUES_ALLOWED {
        untrusted.to_string()
    } else {
        mask_untrusted(untrusted)
    }
}

pub fn log_dropped_attribute(tag: &str, attribute: &str, value: Option<&str>) {
    debug!(
        target: "filterhtml_core::parser",
        "Dropped attribute '{}' on <{}> (value: {})",
        attribute,
        tag,
        value.map(loggable).unwrap_or_else(|| "none".to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_short_value() {
        assert_eq!(mask_untrusted("alert"), "[UNTRUSTED]");
    }

    #[test]
    fn test_mask_long_value_counts_chars() {
        assert_eq!(mask_untrusted("javascript:x"), "[UNTRUSTED: 12 chars]");
        assert_eq!(mask_untrusted("\u{2713}\u{2713}\u{2713}\u{2713}\u{2713}\u{2713}\u{2713}\u{2713}\u{2713}"), "[UNTRUSTED: 9 chars]");
    }

    #[test_log::test]
    fn test_log_dropped_attribute_does_not_panic() {
        log_dropped_attribute("a", "onclick", Some("alert(1)"));
        log_dropped_attribute("input", "checked", None);
    }
}
