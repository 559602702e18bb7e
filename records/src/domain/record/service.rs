use std::sync::Arc;

use auth::Clock;
use uuid::Uuid;

use crate::domain::record::errors::RecordError;
use crate::domain::record::models::RecordKind;
use crate::domain::record::models::VersionToken;
use crate::domain::record::models::VersionedRecord;
use crate::domain::record::ports::Cas;
use crate::domain::record::ports::Repository;

/// Generic create/update/delete/read service with optimistic concurrency,
/// written once and instantiated per record kind.
///
/// Mutations require the caller to present the version it last observed
/// (the record's `updated_at` in milliseconds). A mismatch means another
/// writer got there first and the operation is rejected; the caller must
/// re-fetch and reapply. No operation is ever retried automatically.
///
/// Known gap: two updates committing within the same millisecond can leave
/// the second writer's stamp equal to the first's pre-check value, in which
/// case a third writer holding the older observation slips past the check.
/// The token stays defined as the timestamp because external callers compute
/// it from any previously fetched representation.
pub struct RecordService<K, R, C>
where
    K: RecordKind,
    R: Repository<K::Record>,
    C: Clock,
{
    kind: K,
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<K, R, C> RecordService<K, R, C>
where
    K: RecordKind,
    R: Repository<K::Record>,
    C: Clock,
{
    pub fn new(kind: K, repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            kind,
            repository,
            clock,
        }
    }

    /// Validate a draft and persist it as a new record.
    ///
    /// Assigns a fresh identifier and stamps both `created_at` and
    /// `updated_at` to now.
    ///
    /// # Errors
    /// * `Validation` - the draft failed kind-specific validation
    /// * `Storage` - persistence failed
    pub async fn create(&self, draft: K::Draft) -> Result<K::Record, RecordError> {
        let problems = self.kind.validate(&draft);
        if !problems.is_empty() {
            return Err(RecordError::Validation(problems));
        }

        let record = self.kind.materialize(draft, Uuid::new_v4(), self.clock.now());
        Ok(self.repository.save(record).await?)
    }

    /// Replace a record's mutable fields, guarded by the caller's version.
    ///
    /// Identity and creation time always carry forward from the stored
    /// record; `updated_at` is stamped to now on success.
    ///
    /// # Errors
    /// * `NotFound` - no record with that identifier
    /// * `VersionConflict` - the caller's version is stale
    /// * `Validation` - the draft failed kind-specific validation
    /// * `Storage` - persistence failed
    pub async fn update(
        &self,
        draft: K::Draft,
        id: Uuid,
        caller_version: VersionToken,
    ) -> Result<K::Record, RecordError> {
        let current = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or(RecordError::NotFound(id))?;

        let stored_version = current.version();
        if caller_version != stored_version {
            tracing::warn!(%id, supplied = %caller_version, stored = %stored_version, "stale version on update");
            return Err(RecordError::VersionConflict {
                supplied: caller_version,
                current: stored_version,
            });
        }

        let problems = self.kind.validate(&draft);
        if !problems.is_empty() {
            return Err(RecordError::Validation(problems));
        }

        let next = self.kind.rebase(&current, draft, self.clock.now());
        match self
            .repository
            .update_if_version_matches(next, stored_version)
            .await?
        {
            Cas::Applied(stored) => Ok(stored),
            // A writer slipped in between our read and the commit.
            Cas::Stale => Err(RecordError::VersionConflict {
                supplied: caller_version,
                current: stored_version,
            }),
            Cas::Missing => Err(RecordError::NotFound(id)),
        }
    }

    /// Physically remove a record, guarded by the caller's version.
    ///
    /// # Errors
    /// * `NotFound` - no record with that identifier
    /// * `VersionConflict` - the caller's version is stale
    /// * `Storage` - persistence failed
    pub async fn delete(&self, id: Uuid, caller_version: VersionToken) -> Result<(), RecordError> {
        let current = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or(RecordError::NotFound(id))?;

        let stored_version = current.version();
        if caller_version != stored_version {
            tracing::warn!(%id, supplied = %caller_version, stored = %stored_version, "stale version on delete");
            return Err(RecordError::VersionConflict {
                supplied: caller_version,
                current: stored_version,
            });
        }

        match self
            .repository
            .delete_if_version_matches(&id, stored_version)
            .await?
        {
            Cas::Applied(()) => Ok(()),
            Cas::Stale => Err(RecordError::VersionConflict {
                supplied: caller_version,
                current: stored_version,
            }),
            Cas::Missing => Err(RecordError::NotFound(id)),
        }
    }

    /// Pure read; never touches any record's timestamps.
    pub async fn get(&self, id: Uuid) -> Result<Option<K::Record>, RecordError> {
        Ok(self.repository.find_by_id(&id).await?)
    }

    pub async fn list(&self) -> Result<Vec<K::Brief>, RecordError> {
        let records = self.repository.find_all().await?;
        Ok(records.iter().map(|r| self.kind.brief(r)).collect())
    }

    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<K::Brief>, RecordError> {
        let records = self.repository.find_all_by_ids(ids).await?;
        Ok(records.iter().map(|r| self.kind.brief(r)).collect())
    }

    pub async fn count(&self) -> Result<u64, RecordError> {
        Ok(self.repository.count().await?)
    }
}
