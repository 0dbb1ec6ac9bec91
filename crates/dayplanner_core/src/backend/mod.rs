//! Remote persistence contract.
//!
//! # Responsibility
//! - Define the task/focus-area operations a backing service offers to the
//!   store in remote mode.
//! - Ship the SQLite implementation used as the default backing service.
//!
//! # Invariants
//! - Malformed requests fail with `InvalidRequest` instead of being ignored.
//! - `list_tasks` returns tasks in display order with their dates.

use crate::db::DbError;
use crate::model::snapshot::PlannerSnapshot;
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repo::snapshot_repo::MigrationReport;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite;

pub use sqlite::SqliteBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// Errors surfaced by a backing service.
#[derive(Debug)]
pub enum BackendError {
    /// Request is missing a required field or carries a blank one.
    InvalidRequest(&'static str),
    TaskNotFound(TaskId),
    /// Service cannot be reached or opened.
    Unavailable(String),
    Repo(RepoError),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Unavailable(message) => write!(f, "backend unavailable: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BackendError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Create-task request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub name: String,
    pub focus_area: String,
    pub sub_project_id: Option<TaskId>,
    pub is_sub_project: bool,
}

/// Operations offered by a backing service.
pub trait RemoteBackend {
    fn list_tasks(&self) -> BackendResult<Vec<Task>>;
    fn create_task(&self, request: &CreateTaskRequest) -> BackendResult<Task>;
    /// Merges provided fields over the stored task.
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> BackendResult<()>;
    /// Deletes one task. Unknown ids succeed without effect.
    fn delete_task(&self, id: TaskId) -> BackendResult<()>;
    /// Adds one scheduled date, ignoring duplicates.
    fn schedule_task(&self, id: TaskId, date: &str) -> BackendResult<()>;
    fn reorder_tasks(&self, order: &[TaskId]) -> BackendResult<()>;

    fn list_focus_areas(&self) -> BackendResult<Vec<String>>;
    /// Creates one focus area and returns its trimmed name.
    fn create_focus_area(&self, name: &str) -> BackendResult<String>;
    fn delete_focus_area(&self, name: &str) -> BackendResult<()>;
    fn reorder_focus_areas(&self, order: &[String]) -> BackendResult<()>;

    /// Replaces all stored state with `snapshot`.
    fn migrate(&self, snapshot: &PlannerSnapshot) -> BackendResult<MigrationReport>;
}
