use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Fingerprint value carried by tokens issued to subjects that never changed
/// their credential. A credential change always stamps a real (non-zero)
/// millisecond timestamp, so this value cannot collide with a post-change
/// fingerprint.
pub const FINGERPRINT_NEVER_CHANGED: i64 = 0;

/// Payload of a signed authentication token.
///
/// Self-contained: nothing about the token is stored server-side. Expiry is
/// not encoded as a standard `exp` claim because the time-to-live window is a
/// server-side setting applied relative to `ttl_marker_millis` at validation
/// time; the codec therefore signs and checks structure only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject identifier.
    pub sub: Uuid,

    /// Time-to-live marker, Unix milliseconds. Normally the issuance instant;
    /// a far-future marker yields an effectively non-expiring token.
    #[serde(rename = "tm")]
    pub ttl_marker_millis: i64,

    /// Credential fingerprint at issuance: the subject's credential-change
    /// timestamp in Unix milliseconds, or [`FINGERPRINT_NEVER_CHANGED`].
    #[serde(rename = "cf")]
    pub fingerprint_millis: i64,
}

impl TokenClaims {
    pub fn new(subject: Uuid, ttl_marker_millis: i64, fingerprint_millis: i64) -> Self {
        Self {
            sub: subject,
            ttl_marker_millis,
            fingerprint_millis,
        }
    }

    /// Whether the marker has aged out of the given window at `now`.
    ///
    /// A token is still valid exactly at `marker + window`.
    pub fn is_expired(&self, now_millis: i64, ttl_window_millis: i64) -> bool {
        now_millis > self.ttl_marker_millis.saturating_add(ttl_window_millis)
    }
}
