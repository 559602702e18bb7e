pub mod access;
pub mod file;
pub mod record;
pub mod subject;
