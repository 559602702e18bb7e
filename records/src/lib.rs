//! Record-management core: versioned records behind optimistic concurrency
//! control, subject (user) and stored-file record kinds, and a stateless
//! token-based authentication layer.
//!
//! The web, persistence, mail and blob-storage surfaces are collaborators
//! consumed through ports; this crate carries the domain logic only.

pub mod config;
pub mod domain;
pub mod outbound;

pub use domain::access;
pub use domain::file;
pub use domain::record;
pub use domain::subject;
