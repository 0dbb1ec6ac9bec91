//! Core domain logic for the day planner.
//! This crate is the single source of truth for task and focus-area invariants.

pub mod backend;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod repo;
pub mod store;

pub use backend::{BackendError, BackendResult, CreateTaskRequest, RemoteBackend, SqliteBackend};
pub use config::{ConfigError, PlannerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::focus_area::FocusArea;
pub use model::snapshot::PlannerSnapshot;
pub use model::task::{is_valid_iso_date, NewTask, Task, TaskId, TaskPatch};
pub use persist::local::DEFAULT_STORAGE_KEY;
pub use persist::{
    BlobStorage, FileBlobStorage, LocalStrategy, MemoryBlobStorage, PersistError,
    PersistenceMode, PersistenceStrategy, RemoteStrategy,
};
pub use repo::snapshot_repo::MigrationReport;
pub use repo::{RepoError, RepoResult};
pub use store::{StoreError, StoreEvent, StoreResult, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
