pub mod cache;

pub use cache::AliasCache;
