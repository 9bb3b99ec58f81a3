//! File storage

pub mod files;

// Re-exports for convenience
pub use files::{FileStore, PendingUpload, StoredFile};
