pub mod models;

pub use models::FileBrief;
pub use models::FileDraft;
pub use models::FileKind;
pub use models::FileRecord;
pub use models::FileService;
