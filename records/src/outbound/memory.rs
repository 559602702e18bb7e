use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::record::errors::StorageError;
use crate::domain::record::models::VersionToken;
use crate::domain::record::models::VersionedRecord;
use crate::domain::record::ports::Cas;
use crate::domain::record::ports::Repository;
use crate::domain::subject::models::Subject;
use crate::domain::subject::ports::SubjectLookup;

/// Map-backed repository.
///
/// The compare-and-swap operations run entirely under the write lock, which
/// makes them linearizable per identifier: no other write to the same record
/// can land between the version check and the commit.
pub struct InMemoryRepository<E: VersionedRecord> {
    records: Arc<RwLock<HashMap<Uuid, E>>>,
}

impl<E: VersionedRecord> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<E: VersionedRecord> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: VersionedRecord> Clone for InMemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

#[async_trait]
impl<E: VersionedRecord> Repository<E> for InMemoryRepository<E> {
    async fn save(&self, record: E) -> Result<E, StorageError> {
        self.records.write().await.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<E>, StorageError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<E>, StorageError> {
        let records = self.records.read().await;
        let mut all: Vec<E> = records.values().cloned().collect();
        // Stable listing order for callers and tests.
        all.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(all)
    }

    async fn find_all_by_ids(&self, ids: &[Uuid]) -> Result<Vec<E>, StorageError> {
        let records = self.records.read().await;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn exists_by_id(&self, id: &Uuid) -> Result<bool, StorageError> {
        Ok(self.records.read().await.contains_key(id))
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn delete_by_id(&self, id: &Uuid) -> Result<(), StorageError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn update_if_version_matches(
        &self,
        record: E,
        expected: VersionToken,
    ) -> Result<Cas<E>, StorageError> {
        let mut records = self.records.write().await;
        match records.get(&record.id()) {
            None => Ok(Cas::Missing),
            Some(current) if current.version() != expected => Ok(Cas::Stale),
            Some(_) => {
                records.insert(record.id(), record.clone());
                Ok(Cas::Applied(record))
            }
        }
    }

    async fn delete_if_version_matches(
        &self,
        id: &Uuid,
        expected: VersionToken,
    ) -> Result<Cas<()>, StorageError> {
        let mut records = self.records.write().await;
        match records.get(id) {
            None => Ok(Cas::Missing),
            Some(current) if current.version() != expected => Ok(Cas::Stale),
            Some(_) => {
                records.remove(id);
                Ok(Cas::Applied(()))
            }
        }
    }
}

#[async_trait]
impl SubjectLookup for InMemoryRepository<Subject> {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Subject>, StorageError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_name(&self, username: &str) -> Result<Option<Subject>, StorageError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|subject| subject.username.as_str() == username)
            .cloned())
    }
}
