use std::sync::Arc;

use auth::Clock;
use auth::CredentialHasher;
use uuid::Uuid;

use crate::domain::record::errors::RecordError;
use crate::domain::record::models::FieldErrors;
use crate::domain::record::models::VersionToken;
use crate::domain::record::models::VersionedRecord;
use crate::domain::record::ports::Cas;
use crate::domain::record::ports::Repository;
use crate::domain::record::service::RecordService;
use crate::domain::subject::errors::SubjectError;
use crate::domain::subject::models::Subject;
use crate::domain::subject::models::SubjectBrief;
use crate::domain::subject::models::SubjectDraft;
use crate::domain::subject::models::SubjectKind;
use crate::domain::subject::models::SubjectRole;
use crate::domain::subject::models::SubjectState;

const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

/// Raw registration input.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: SubjectRole,
    pub password: String,
}

/// Raw profile-update input. The credential never travels this path.
#[derive(Debug)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: SubjectRole,
    pub state: SubjectState,
}

/// Domain service for subjects: profile CRUD through the generic optimistic
/// record service, plus the separate credential path.
///
/// Password changes are the one mutation that may touch `password_hash` and
/// `password_updated_at`; bumping the latter is what silently invalidates
/// every previously issued token for the subject.
pub struct SubjectService<R, C>
where
    R: Repository<Subject>,
    C: Clock,
{
    records: RecordService<SubjectKind, R, C>,
    repository: Arc<R>,
    clock: Arc<C>,
    hasher: CredentialHasher,
}

impl<R, C> SubjectService<R, C>
where
    R: Repository<Subject>,
    C: Clock,
{
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            records: RecordService::new(SubjectKind, Arc::clone(&repository), Arc::clone(&clock)),
            repository,
            clock,
            hasher: CredentialHasher::new(),
        }
    }

    /// Create a subject with its initial credential.
    ///
    /// New subjects start `Active` with `password_updated_at` unset (the
    /// never-changed fingerprint sentinel).
    ///
    /// # Errors
    /// * `Record(Validation)` - field map covering profile fields and password policy
    /// * `Password` - hashing failed
    /// * `Record(Storage)` - persistence failed
    pub async fn register(&self, registration: Registration) -> Result<Subject, SubjectError> {
        let password_problem = password_policy(&registration.password);

        let draft = SubjectDraft::parse(
            registration.username,
            registration.email,
            registration.display_name,
            registration.role,
            SubjectState::Active,
        );

        let draft = match (draft, password_problem) {
            (Ok(draft), None) => draft,
            (Ok(_), Some(message)) => {
                let mut problems = FieldErrors::new();
                problems.insert("password".to_string(), message);
                return Err(RecordError::Validation(problems).into());
            }
            (Err(mut problems), password_problem) => {
                if let Some(message) = password_problem {
                    problems.insert("password".to_string(), message);
                }
                return Err(RecordError::Validation(problems).into());
            }
        };

        let hash = self.hasher.hash(&registration.password)?;
        let subject = self.records.create(draft.with_password_hash(hash)).await?;

        tracing::debug!(id = %subject.id, username = %subject.username, "subject registered");
        Ok(subject)
    }

    /// Update profile fields, guarded by the caller's version.
    pub async fn update_profile(
        &self,
        update: ProfileUpdate,
        id: Uuid,
        caller_version: VersionToken,
    ) -> Result<Subject, SubjectError> {
        let draft = SubjectDraft::parse(
            update.username,
            update.email,
            update.display_name,
            update.role,
            update.state,
        )
        .map_err(RecordError::Validation)?;

        Ok(self.records.update(draft, id, caller_version).await?)
    }

    /// Replace the subject's credential, guarded by the caller's version.
    ///
    /// Bumps both `updated_at` and `password_updated_at`, so every token
    /// issued before this call becomes credential-stale at its next
    /// validation.
    pub async fn change_password(
        &self,
        id: Uuid,
        caller_version: VersionToken,
        new_password: &str,
    ) -> Result<Subject, SubjectError> {
        if let Some(message) = password_policy(new_password) {
            let mut problems = FieldErrors::new();
            problems.insert("password".to_string(), message);
            return Err(RecordError::Validation(problems).into());
        }

        let current = self
            .repository
            .find_by_id(&id)
            .await
            .map_err(RecordError::from)?
            .ok_or(RecordError::NotFound(id))?;

        let stored_version = current.version();
        if caller_version != stored_version {
            tracing::warn!(%id, supplied = %caller_version, stored = %stored_version, "stale version on password change");
            return Err(RecordError::VersionConflict {
                supplied: caller_version,
                current: stored_version,
            }
            .into());
        }

        let now = self.clock.now();
        let mut next = current;
        next.password_hash = self.hasher.hash(new_password)?;
        next.password_updated_at = Some(now);
        next.updated_at = now;

        match self
            .repository
            .update_if_version_matches(next, stored_version)
            .await
            .map_err(RecordError::from)?
        {
            Cas::Applied(stored) => Ok(stored),
            Cas::Stale => Err(RecordError::VersionConflict {
                supplied: caller_version,
                current: stored_version,
            }
            .into()),
            Cas::Missing => Err(RecordError::NotFound(id).into()),
        }
    }

    /// Check a plaintext credential against the subject's stored hash.
    ///
    /// False for a wrong password and for a subject whose hash is absent or
    /// malformed; never an error.
    pub fn verify_password(&self, subject: &Subject, plaintext: &str) -> bool {
        self.hasher.verify(plaintext, &subject.password_hash)
    }

    /// Remove a subject, guarded by the caller's version.
    pub async fn delete(&self, id: Uuid, caller_version: VersionToken) -> Result<(), SubjectError> {
        Ok(self.records.delete(id, caller_version).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Subject>, SubjectError> {
        Ok(self.records.get(id).await?)
    }

    pub async fn list(&self) -> Result<Vec<SubjectBrief>, SubjectError> {
        Ok(self.records.list().await?)
    }

    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<SubjectBrief>, SubjectError> {
        Ok(self.records.list_by_ids(ids).await?)
    }

    pub async fn count(&self) -> Result<u64, SubjectError> {
        Ok(self.records.count().await?)
    }
}

fn password_policy(password: &str) -> Option<String> {
    if password.len() < PASSWORD_MIN {
        Some(format!("must be at least {} characters", PASSWORD_MIN))
    } else if password.len() > PASSWORD_MAX {
        Some(format!("must be at most {} characters", PASSWORD_MAX))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use auth::FixedClock;
    use chrono::DateTime;
    use mockall::mock;

    use super::*;
    use crate::domain::record::errors::StorageError;
    use crate::domain::record::models::RecordKind;

    mock! {
        pub SubjectRepository {}

        #[async_trait]
        impl Repository<Subject> for SubjectRepository {
            async fn save(&self, record: Subject) -> Result<Subject, StorageError>;
            async fn find_by_id(&self, id: &Uuid) -> Result<Option<Subject>, StorageError>;
            async fn find_all(&self) -> Result<Vec<Subject>, StorageError>;
            async fn find_all_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Subject>, StorageError>;
            async fn exists_by_id(&self, id: &Uuid) -> Result<bool, StorageError>;
            async fn count(&self) -> Result<u64, StorageError>;
            async fn delete_by_id(&self, id: &Uuid) -> Result<(), StorageError>;
            async fn update_if_version_matches(
                &self,
                record: Subject,
                expected: VersionToken,
            ) -> Result<Cas<Subject>, StorageError>;
            async fn delete_if_version_matches(
                &self,
                id: &Uuid,
                expected: VersionToken,
            ) -> Result<Cas<()>, StorageError>;
        }
    }

    fn registration(password: &str) -> Registration {
        Registration {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: Some("Alice".to_string()),
            role: SubjectRole::Member,
            password: password.to_string(),
        }
    }

    fn stored_subject(at_millis: i64) -> Subject {
        let at = DateTime::from_timestamp_millis(at_millis).unwrap();
        let draft = SubjectDraft::parse(
            "alice".to_string(),
            "alice@example.com".to_string(),
            None,
            SubjectRole::Member,
            SubjectState::Active,
        )
        .unwrap()
        .with_password_hash("$argon2id$stored".to_string());
        SubjectKind.materialize(draft, Uuid::new_v4(), at)
    }

    #[tokio::test]
    async fn test_register_hashes_and_persists() {
        let mut repository = MockSubjectRepository::new();
        repository
            .expect_save()
            .withf(|subject| {
                subject.username.as_str() == "alice"
                    && subject.password_hash.starts_with("$argon2")
                    && subject.password_updated_at.is_none()
                    && subject.state == SubjectState::Active
            })
            .times(1)
            .returning(|subject| Ok(subject));

        let service = SubjectService::new(Arc::new(repository), Arc::new(FixedClock::at(1_000)));
        let subject = service.register(registration("Secret123")).await.unwrap();

        assert_eq!(subject.created_at.timestamp_millis(), 1_000);
        assert_eq!(subject.fingerprint_millis(), 0);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let mut repository = MockSubjectRepository::new();
        repository.expect_save().times(0);

        let service = SubjectService::new(Arc::new(repository), Arc::new(FixedClock::at(0)));
        let result = service.register(registration("short")).await;

        match result {
            Err(SubjectError::Record(RecordError::Validation(problems))) => {
                assert!(problems.contains_key("password"));
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_register_collects_profile_and_password_problems() {
        let mut repository = MockSubjectRepository::new();
        repository.expect_save().times(0);

        let service = SubjectService::new(Arc::new(repository), Arc::new(FixedClock::at(0)));
        let result = service
            .register(Registration {
                username: "a".to_string(),
                email: "nope".to_string(),
                display_name: None,
                role: SubjectRole::Member,
                password: "x".to_string(),
            })
            .await;

        match result {
            Err(SubjectError::Record(RecordError::Validation(problems))) => {
                assert!(problems.contains_key("username"));
                assert!(problems.contains_key("email"));
                assert!(problems.contains_key("password"));
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_change_password_bumps_fingerprint() {
        let stored = stored_subject(1_000);
        let stored_id = stored.id;
        let mut repository = MockSubjectRepository::new();
        let returned = stored.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));
        repository
            .expect_update_if_version_matches()
            .withf(move |subject, expected| {
                subject.id == stored_id
                    && subject.updated_at.timestamp_millis() == 5_000
                    && subject.password_updated_at.map(|at| at.timestamp_millis()) == Some(5_000)
                    && subject.password_hash.starts_with("$argon2")
                    && *expected == VersionToken::from_millis(1_000)
            })
            .times(1)
            .returning(|subject, _| Ok(Cas::Applied(subject)));

        let service = SubjectService::new(Arc::new(repository), Arc::new(FixedClock::at(5_000)));
        let updated = service
            .change_password(stored_id, VersionToken::from_millis(1_000), "NewSecret123")
            .await
            .unwrap();

        assert_eq!(updated.fingerprint_millis(), 5_000);
        assert!(service.verify_password(&updated, "NewSecret123"));
        assert!(!service.verify_password(&updated, "Secret123"));
    }

    #[tokio::test]
    async fn test_change_password_rejects_stale_version() {
        let stored = stored_subject(2_000);
        let mut repository = MockSubjectRepository::new();
        let returned = stored.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));
        repository.expect_update_if_version_matches().times(0);

        let service = SubjectService::new(Arc::new(repository), Arc::new(FixedClock::at(5_000)));
        let result = service
            .change_password(stored.id, VersionToken::from_millis(1), "NewSecret123")
            .await;

        assert!(matches!(
            result,
            Err(SubjectError::Record(RecordError::VersionConflict { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_credentials() {
        let stored = stored_subject(2_000);
        let stored_id = stored.id;
        let mut repository = MockSubjectRepository::new();
        let returned = stored.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));
        repository
            .expect_update_if_version_matches()
            .withf(|subject, _| {
                subject.password_hash == "$argon2id$stored"
                    && subject.password_updated_at.is_none()
                    && subject.username.as_str() == "bob"
            })
            .times(1)
            .returning(|subject, _| Ok(Cas::Applied(subject)));

        let service = SubjectService::new(Arc::new(repository), Arc::new(FixedClock::at(9_000)));
        let updated = service
            .update_profile(
                ProfileUpdate {
                    username: "bob".to_string(),
                    email: "bob@example.com".to_string(),
                    display_name: None,
                    role: SubjectRole::Admin,
                    state: SubjectState::Active,
                },
                stored_id,
                VersionToken::from_millis(2_000),
            )
            .await
            .unwrap();

        assert_eq!(updated.updated_at.timestamp_millis(), 9_000);
        assert_eq!(updated.created_at.timestamp_millis(), 2_000);
    }
}
