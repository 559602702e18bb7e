use std::fmt;
use std::str::FromStr;

use auth::token::FINGERPRINT_NEVER_CHANGED;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::record::models::FieldErrors;
use crate::domain::record::models::RecordKind;
use crate::domain::record::models::VersionedRecord;
use crate::domain::subject::errors::EmailError;
use crate::domain::subject::errors::UsernameError;

/// Subject aggregate: the authenticated entity that owns credentials and a
/// role.
///
/// Invariants: `updated_at >= created_at`; `password_updated_at` moves only
/// when `password_hash` changes (the credential path), never on profile
/// updates.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` until the first password change after registration.
    pub password_updated_at: Option<DateTime<Utc>>,
    pub password_hash: String,
    pub state: SubjectState,
    pub role: SubjectRole,
    pub username: Username,
    pub email: EmailAddress,
    pub display_name: Option<String>,
}

impl Subject {
    /// Credential fingerprint embedded in issued tokens: the millisecond
    /// value of the last password change, or the never-changed sentinel. A
    /// token is credential-fresh only while its embedded fingerprint equals
    /// this value.
    pub fn fingerprint_millis(&self) -> i64 {
        self.password_updated_at
            .map(|at| at.timestamp_millis())
            .unwrap_or(FINGERPRINT_NEVER_CHANGED)
    }
}

impl VersionedRecord for Subject {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Subject lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectState {
    /// Fully usable account.
    Active,
    /// Registered but not yet activated.
    Waiting,
    /// Login blocked by an administrator.
    Blocked,
}

impl SubjectState {
    /// Whether the account is enabled at all. Only `Waiting` accounts are
    /// disabled.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SubjectState::Waiting)
    }

    /// Whether the account may log in. Only `Active` accounts may.
    pub fn login_permitted(&self) -> bool {
        matches!(self, SubjectState::Active)
    }
}

/// Role attached to a subject. Single role per subject; no further policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectRole {
    Admin,
    Member,
}

impl SubjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectRole::Admin => "admin",
            SubjectRole::Member => "member",
        }
    }
}

impl fmt::Display for SubjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters and contains only alphanumeric,
/// underscore, and hyphen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - shorter than 3 characters
    /// * `TooLong` - longer than 32 characters
    /// * `InvalidCharacters` - contains characters outside alphanumeric, `_`, `-`
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.len();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated candidate for subject creation and profile update.
///
/// Credential fields never travel through this draft: `initial_password_hash`
/// is consumed at creation only and ignored on rebase, where the stored hash
/// and its change timestamp always carry forward.
#[derive(Debug)]
pub struct SubjectDraft {
    pub username: Username,
    pub email: EmailAddress,
    pub display_name: Option<String>,
    pub role: SubjectRole,
    pub state: SubjectState,
    pub initial_password_hash: Option<String>,
}

impl SubjectDraft {
    const MAX_DISPLAY_NAME: usize = 64;

    /// Parse raw profile fields, collecting every failure into a field map.
    pub fn parse(
        username: String,
        email: String,
        display_name: Option<String>,
        role: SubjectRole,
        state: SubjectState,
    ) -> Result<Self, FieldErrors> {
        let mut problems = FieldErrors::new();

        let username = match Username::new(username) {
            Ok(username) => Some(username),
            Err(e) => {
                problems.insert("username".to_string(), e.to_string());
                None
            }
        };

        let email = match EmailAddress::new(email) {
            Ok(email) => Some(email),
            Err(e) => {
                problems.insert("email".to_string(), e.to_string());
                None
            }
        };

        if let Some(name) = &display_name {
            if name.len() > Self::MAX_DISPLAY_NAME {
                problems.insert(
                    "display_name".to_string(),
                    format!("must be at most {} characters", Self::MAX_DISPLAY_NAME),
                );
            }
        }

        match (username, email) {
            (Some(username), Some(email)) if problems.is_empty() => Ok(Self {
                username,
                email,
                display_name,
                role,
                state,
                initial_password_hash: None,
            }),
            _ => Err(problems),
        }
    }

    pub fn with_password_hash(mut self, hash: String) -> Self {
        self.initial_password_hash = Some(hash);
        self
    }
}

/// Listing form of a subject. Credential material never appears here.
#[derive(Debug, Clone)]
pub struct SubjectBrief {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: SubjectRole,
    pub state: SubjectState,
    pub updated_at: DateTime<Utc>,
}

/// Record-kind capability for subjects, driving the generic record service.
pub struct SubjectKind;

impl RecordKind for SubjectKind {
    type Record = Subject;
    type Draft = SubjectDraft;
    type Brief = SubjectBrief;

    fn validate(&self, _draft: &SubjectDraft) -> FieldErrors {
        // Field-level checks happen in SubjectDraft::parse; a constructed
        // draft is valid by construction.
        FieldErrors::new()
    }

    fn materialize(&self, draft: SubjectDraft, id: Uuid, at: DateTime<Utc>) -> Subject {
        Subject {
            id,
            created_at: at,
            updated_at: at,
            password_updated_at: None,
            // An absent hash can never verify, so a subject created without
            // one simply cannot log in until a credential is set.
            password_hash: draft.initial_password_hash.unwrap_or_default(),
            state: draft.state,
            role: draft.role,
            username: draft.username,
            email: draft.email,
            display_name: draft.display_name,
        }
    }

    fn rebase(&self, current: &Subject, draft: SubjectDraft, at: DateTime<Utc>) -> Subject {
        Subject {
            id: current.id,
            created_at: current.created_at,
            updated_at: at,
            password_updated_at: current.password_updated_at,
            password_hash: current.password_hash.clone(),
            state: draft.state,
            role: draft.role,
            username: draft.username,
            email: draft.email,
            display_name: draft.display_name,
        }
    }

    fn brief(&self, record: &Subject) -> SubjectBrief {
        SubjectBrief {
            id: record.id,
            username: record.username.as_str().to_string(),
            email: record.email.as_str().to_string(),
            role: record.role,
            state: record.state,
            updated_at: record.updated_at,
        }
    }
}
