use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::record::models::FieldErrors;
use crate::domain::record::models::RecordKind;
use crate::domain::record::models::VersionedRecord;
use crate::domain::record::service::RecordService;

/// Stored-file metadata record.
///
/// The blob itself lives in an external store; `blob_ref` is the opaque
/// pointer into it. Only the metadata participates in versioned CRUD.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Uuid,
    pub filename: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub blob_ref: String,
}

impl VersionedRecord for FileRecord {
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

/// Candidate for file creation and update.
#[derive(Debug, Clone)]
pub struct FileDraft {
    pub owner: Uuid,
    pub filename: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub blob_ref: String,
}

/// Listing form of a file record.
#[derive(Debug, Clone)]
pub struct FileBrief {
    pub id: Uuid,
    pub filename: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

/// Record-kind capability for stored files.
pub struct FileKind;

const MAX_FILENAME: usize = 255;

impl RecordKind for FileKind {
    type Record = FileRecord;
    type Draft = FileDraft;
    type Brief = FileBrief;

    fn validate(&self, draft: &FileDraft) -> FieldErrors {
        let mut problems = FieldErrors::new();

        if draft.filename.is_empty() {
            problems.insert("filename".to_string(), "must not be empty".to_string());
        } else if draft.filename.len() > MAX_FILENAME {
            problems.insert(
                "filename".to_string(),
                format!("must be at most {} characters", MAX_FILENAME),
            );
        } else if draft.filename.contains('/') || draft.filename.contains('\\') {
            problems.insert(
                "filename".to_string(),
                "must not contain path separators".to_string(),
            );
        }

        if draft.media_type.is_empty() {
            problems.insert("media_type".to_string(), "must not be empty".to_string());
        }

        if draft.blob_ref.is_empty() {
            problems.insert("blob_ref".to_string(), "must not be empty".to_string());
        }

        problems
    }

    fn materialize(&self, draft: FileDraft, id: Uuid, at: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id,
            created_at: at,
            updated_at: at,
            owner: draft.owner,
            filename: draft.filename,
            media_type: draft.media_type,
            size_bytes: draft.size_bytes,
            blob_ref: draft.blob_ref,
        }
    }

    fn rebase(&self, current: &FileRecord, draft: FileDraft, at: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id: current.id,
            created_at: current.created_at,
            updated_at: at,
            owner: draft.owner,
            filename: draft.filename,
            media_type: draft.media_type,
            size_bytes: draft.size_bytes,
            blob_ref: draft.blob_ref,
        }
    }

    fn brief(&self, record: &FileRecord) -> FileBrief {
        FileBrief {
            id: record.id,
            filename: record.filename.clone(),
            media_type: record.media_type.clone(),
            size_bytes: record.size_bytes,
            updated_at: record.updated_at,
        }
    }
}

/// File operations are exactly the generic versioned CRUD surface.
pub type FileService<R, C> = RecordService<FileKind, R, C>;
