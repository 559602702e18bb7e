pub mod errors;
pub mod models;
pub mod ports;
pub mod service;

pub use errors::SubjectError;
pub use models::EmailAddress;
pub use models::Subject;
pub use models::SubjectBrief;
pub use models::SubjectDraft;
pub use models::SubjectKind;
pub use models::SubjectRole;
pub use models::SubjectState;
pub use models::Username;
pub use ports::SubjectLookup;
pub use service::ProfileUpdate;
pub use service::Registration;
pub use service::SubjectService;
