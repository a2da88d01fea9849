//! Display-time masking of secret values.
//!
//! Redaction only affects what is shown (logs, snapshots, diagnostics, JSON
//! output). Owners of a value keep access to the raw string.

/// Marker that replaces every secret value in user-facing output.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Return the marker when `is_secret`, otherwise the value unchanged.
pub fn redact(value: &str, is_secret: bool) -> &str {
    if is_secret {
        REDACTION_MARKER
    } else {
        value
    }
}

/// Optional variant of [`redact`]: `None` stays `None`.
pub fn redact_opt(value: Option<&str>, is_secret: bool) -> Option<&str> {
    value.map(|v| redact(v, is_secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_value() {
        assert_eq!(REDACTION_MARKER, "[REDACTED]");
    }

    #[test]
    fn test_public_value_passes_through() {
        assert_eq!(redact("https://api.example.com", false), "https://api.example.com");
        assert_eq!(redact("", false), "");
        assert_eq!(redact("   ", false), "   ");
    }

    #[test]
    fn test_secret_value_is_masked() {
        assert_eq!(redact("sk_live_abc123", true), REDACTION_MARKER);
        assert_eq!(redact("", true), REDACTION_MARKER);
        assert_eq!(redact("line one\nline two", true), REDACTION_MARKER);
    }

    #[test]
    fn test_secret_never_contains_original() {
        let long = "x".repeat(10_000);
        for value in ["пароль", "tok", long.as_str()] {
            let shown = redact(value, true);
            assert!(!shown.contains(value));
        }
    }

    #[test]
    fn test_optional_redaction() {
        assert_eq!(redact_opt(None, true), None);
        assert_eq!(redact_opt(None, false), None);
        assert_eq!(redact_opt(Some(""), true), Some(REDACTION_MARKER));
        assert_eq!(redact_opt(Some("public"), false), Some("public"));
    }

    #[test]
    fn test_optional_matches_plain() {
        for secret in [true, false] {
            assert_eq!(redact_opt(Some("value"), secret), Some(redact("value", secret)));
        }
    }
}
