use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Field name to message map produced by record validation. Empty means the
/// candidate is acceptable.
pub type FieldErrors = BTreeMap<String, String>;

/// Optimistic-concurrency check value for a record.
///
/// Defined as the millisecond value of the record's `updated_at` at the
/// moment the caller last observed it. Callers therefore never need a
/// side-channel version field: any previously fetched representation of the
/// record is enough to compute the token. Equality is exact millisecond
/// equality, and clients see the value as a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(i64);

impl VersionToken {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl From<DateTime<Utc>> for VersionToken {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis())
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for VersionToken {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(VersionToken)
    }
}

/// A record managed under optimistic concurrency control.
pub trait VersionedRecord: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;

    /// The record's current version check value.
    fn version(&self) -> VersionToken {
        VersionToken::from(self.updated_at())
    }
}

/// Capability interface implemented once per record kind.
///
/// The optimistic create/update/delete algorithm is written once against this
/// trait; a kind contributes only its validation rules and the mapping
/// between drafts, stored records, and listing briefs.
pub trait RecordKind: Send + Sync + 'static {
    /// Stored form.
    type Record: VersionedRecord;
    /// Caller-supplied candidate for create and update.
    type Draft: Send + 'static;
    /// Reduced listing form returned by bulk reads.
    type Brief: Send + 'static;

    /// Kind-specific validation. A non-empty map aborts the operation.
    fn validate(&self, draft: &Self::Draft) -> FieldErrors;

    /// Build a brand-new record from a draft with the given identity and
    /// creation instant. Called only after `validate` returned empty.
    fn materialize(&self, draft: Self::Draft, id: Uuid, at: DateTime<Utc>) -> Self::Record;

    /// Build the successor of `current` from a draft. Identity and creation
    /// time come from `current` (the caller cannot alter them); `at` becomes
    /// the new `updated_at`. Called only after `validate` returned empty.
    fn rebase(&self, current: &Self::Record, draft: Self::Draft, at: DateTime<Utc>)
        -> Self::Record;

    /// Project a stored record into its listing form.
    fn brief(&self, record: &Self::Record) -> Self::Brief;
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_version_token_from_datetime() {
        let at = Utc.timestamp_millis_opt(1_234_567).unwrap();
        assert_eq!(VersionToken::from(at).as_millis(), 1_234_567);
    }

    #[test]
    fn test_version_token_display_and_parse_round_trip() {
        let token = VersionToken::from_millis(1_700_000_000_123);
        let shown = token.to_string();
        assert_eq!(shown, "1700000000123");
        assert_eq!(shown.parse::<VersionToken>().unwrap(), token);
    }

    #[test]
    fn test_version_token_serializes_as_plain_integer() {
        let token = VersionToken::from_millis(42);
        assert_eq!(serde_json::to_string(&token).unwrap(), "42");
        assert_eq!(
            serde_json::from_str::<VersionToken>("42").unwrap(),
            token
        );
    }

    #[test]
    fn test_version_token_exact_equality() {
        assert_eq!(VersionToken::from_millis(5), VersionToken::from_millis(5));
        assert_ne!(VersionToken::from_millis(5), VersionToken::from_millis(6));
    }
}
