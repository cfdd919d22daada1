use serde::{Deserialize, Serialize};

/// The claim carried inside a sealed token.
///
/// Serialized as `{"id":"…","exp":…}`, in that field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Opaque user identifier.
    pub id: String,
    /// Expiry, Unix epoch seconds.
    pub exp: i64,
}

impl Payload {
    /// Builds a payload for `id` that expires `ttl_secs` after `now`.
    pub fn issue(id: impl Into<String>, ttl_secs: i64, now: i64) -> Self {
        Self {
            id: id.into(),
            exp: now.saturating_add(ttl_secs),
        }
    }
}
