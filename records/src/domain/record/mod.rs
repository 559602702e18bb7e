pub mod errors;
pub mod models;
pub mod ports;
pub mod service;

pub use errors::RecordError;
pub use errors::StorageError;
pub use models::FieldErrors;
pub use models::RecordKind;
pub use models::VersionToken;
pub use models::VersionedRecord;
pub use ports::Cas;
pub use ports::Repository;
pub use service::RecordService;
