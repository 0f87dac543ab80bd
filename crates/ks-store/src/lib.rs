//! ks-store: content-addressed case and run storage.
//!
//! Cases are deduplicated by a SHA-1 hash over their identity fields; runs
//! are append-only directories of simulation artifacts under their case.
//! Reads are best-effort: a missing or unreadable file is "absent", never
//! an error, because the store is advisory project data rather than a
//! transactional database.

pub mod hash;
pub mod store;
pub mod summary;
pub mod types;

pub use hash::{case_hash, case_id_from_hash};
pub use store::CaseRunStore;
pub use summary::{RunSummary, SignalStats, build_summary};
pub use types::{CaseInfo, RunEntry};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
