use crate::error::{AppError, Result};
use crate::models::payload::Payload;

/// Decides whether a decoded payload still represents a live session.
///
/// `None` stands for a token that failed to open. A payload is live only while
/// `exp` is strictly after `now` (Unix seconds).
pub fn validate_payload(payload: Option<&Payload>, now: i64) -> bool {
    match payload {
        Some(p) => p.exp > now,
        None => false,
    }
}

/// Validates a user identifier before it is sealed.
///
/// Length bounds are enforced on the request body; this rejects identifiers
/// that are blank or carry control characters.
pub fn validate_user_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(AppError::Validation("User id cannot be blank".to_string()));
    }

    if id.chars().any(char::is_control) {
        return Err(AppError::Validation(
            "User id cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn payload(exp: i64) -> Payload {
        Payload {
            id: "abc".to_string(),
            exp,
        }
    }

    #[test]
    fn absent_payload_is_invalid() {
        assert!(!validate_payload(None, NOW));
    }

    #[test]
    fn expiry_boundary() {
        assert!(!validate_payload(Some(&payload(NOW)), NOW));
        assert!(!validate_payload(Some(&payload(NOW - 1)), NOW));
        assert!(validate_payload(Some(&payload(NOW + 1)), NOW));
    }

    #[test]
    fn extreme_expiries_do_not_panic() {
        assert!(!validate_payload(Some(&payload(i64::MIN)), NOW));
        assert!(validate_payload(Some(&payload(i64::MAX)), NOW));
    }

    #[test]
    fn user_id_rules() {
        assert!(validate_user_id("user_01HXYZ").is_ok());
        assert!(validate_user_id("   ").is_err());
        assert!(validate_user_id("abc\ndef").is_err());
        assert!(validate_user_id("abc\u{0}").is_err());
    }
}
