use serde::Serialize;

use crate::crypto::seal::PayloadSealer;
use crate::error::SealError;
use crate::models::payload::Payload;
use crate::validation::payload::validate_payload;

/// A freshly sealed token together with its expiry.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub exp: i64,
}

/// Seals a new payload for `id`, valid for `ttl_secs` from `now`.
///
/// # Arguments
///
/// * `sealer` - The payload sealer.
/// * `id` - The user identifier to carry.
/// * `ttl_secs` - Lifetime of the token in seconds.
/// * `now` - Current Unix time in seconds.
pub fn issue(sealer: &PayloadSealer, id: &str, ttl_secs: i64, now: i64) -> Result<IssuedToken, SealError> {
    let payload = Payload::issue(id, ttl_secs, now);
    let token = sealer.seal(&payload)?;

    tracing::debug!("🔐 Sealed token issued, expires at {}", payload.exp);

    Ok(IssuedToken {
        token,
        exp: payload.exp,
    })
}

/// Opens `token` and checks that it is still live at `now`.
///
/// A token that opens but has expired is [`SealError::Expired`].
pub fn authenticate(sealer: &PayloadSealer, token: &str, now: i64) -> Result<Payload, SealError> {
    let payload = sealer.open(token).inspect_err(|e| {
        tracing::debug!("❌ Token failed to open: {}", e);
    })?;

    if !validate_payload(Some(&payload), now) {
        tracing::debug!("❌ Token expired at {}", payload.exp);
        return Err(SealError::Expired(payload.exp));
    }

    Ok(payload)
}

/// Reissues a token for an authenticated payload with a new expiry.
///
/// The previous token stays cryptographically valid until its own expiry.
pub fn refresh(sealer: &PayloadSealer, payload: &Payload, ttl_secs: i64, now: i64) -> Result<IssuedToken, SealError> {
    issue(sealer, &payload.id, ttl_secs, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key::SealKey;

    const NOW: i64 = 1_700_000_000;

    fn sealer() -> PayloadSealer {
        PayloadSealer::new(SealKey::from_bytes(&[0x24; 16]).unwrap())
    }

    #[test]
    fn issued_token_authenticates() {
        let s = sealer();
        let issued = issue(&s, "user-123", 3600, NOW).unwrap();
        assert_eq!(issued.exp, NOW + 3600);

        let payload = authenticate(&s, &issued.token, NOW).unwrap();
        assert_eq!(payload.id, "user-123");
        assert_eq!(payload.exp, NOW + 3600);
    }

    #[test]
    fn stale_token_is_expired_not_malformed() {
        let s = sealer();
        let issued = issue(&s, "abc", -1, NOW).unwrap();
        let err = authenticate(&s, &issued.token, NOW).unwrap_err();
        assert!(matches!(err, SealError::Expired(exp) if exp == NOW - 1));
    }

    #[test]
    fn token_expiring_now_is_rejected() {
        let s = sealer();
        let issued = issue(&s, "abc", 0, NOW).unwrap();
        assert!(authenticate(&s, &issued.token, NOW).is_err());
        assert!(authenticate(&s, &issued.token, NOW - 1).is_ok());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            authenticate(&sealer(), "AAAA.BBBB", NOW),
            Err(SealError::Format(_))
        ));
    }

    #[test]
    fn refresh_extends_expiry_and_changes_token() {
        let s = sealer();
        let first = issue(&s, "abc", 60, NOW).unwrap();
        let payload = authenticate(&s, &first.token, NOW).unwrap();

        let second = refresh(&s, &payload, 3600, NOW + 30).unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(second.exp, NOW + 30 + 3600);
        assert_eq!(authenticate(&s, &second.token, NOW + 120).unwrap().id, "abc");
        assert!(authenticate(&s, &first.token, NOW + 120).is_err());
    }
}
