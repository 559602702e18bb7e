use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::record::errors::StorageError;
use crate::domain::record::models::VersionToken;
use crate::domain::record::models::VersionedRecord;

/// Outcome of a compare-and-swap write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cas<T> {
    /// The stored version matched and the write committed.
    Applied(T),
    /// The stored version no longer matched; nothing was written.
    Stale,
    /// No record with that identifier exists.
    Missing,
}

/// Persistence port for versioned records.
///
/// The service performs the version comparison; the atomicity of the
/// check-and-write belongs here. `update_if_version_matches` and
/// `delete_if_version_matches` must evaluate the stored version and commit
/// as one step per identifier, with no other write to the same identifier
/// interleaving between check and commit.
#[async_trait]
pub trait Repository<E: VersionedRecord>: Send + Sync + 'static {
    /// Persist a record unconditionally (used for creation).
    async fn save(&self, record: E) -> Result<E, StorageError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<E>, StorageError>;

    async fn find_all(&self) -> Result<Vec<E>, StorageError>;

    /// Missing identifiers are skipped without error.
    async fn find_all_by_ids(&self, ids: &[Uuid]) -> Result<Vec<E>, StorageError>;

    async fn exists_by_id(&self, id: &Uuid) -> Result<bool, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;

    /// Remove a record unconditionally. Removing an absent identifier is not
    /// an error.
    async fn delete_by_id(&self, id: &Uuid) -> Result<(), StorageError>;

    /// Commit `record` only while the stored version equals `expected`.
    async fn update_if_version_matches(
        &self,
        record: E,
        expected: VersionToken,
    ) -> Result<Cas<E>, StorageError>;

    /// Remove the record only while the stored version equals `expected`.
    async fn delete_if_version_matches(
        &self,
        id: &Uuid,
        expected: VersionToken,
    ) -> Result<Cas<()>, StorageError>;
}
