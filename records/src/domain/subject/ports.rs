use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::record::errors::StorageError;
use crate::domain::subject::models::Subject;

/// Read-side port used by token validation and the authentication gate.
///
/// Every token validation resolves the subject fresh through this port; that
/// lookup is what makes the embedded credential fingerprint work without a
/// revocation list.
#[async_trait]
pub trait SubjectLookup: Send + Sync + 'static {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Subject>, StorageError>;

    async fn find_by_name(&self, username: &str) -> Result<Option<Subject>, StorageError>;
}
