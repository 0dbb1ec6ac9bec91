//! Persistence strategies behind the task store.
//!
//! # Responsibility
//! - Define the strategy seam the store commits every mutation through.
//! - Provide the remote (backend + re-fetch) and local (JSON blob)
//!   strategies.
//!
//! # Invariants
//! - A store uses exactly one strategy for its whole lifetime.
//! - `commit` receives the state after the optimistic local apply.
//! - A `Reconciled` outcome carries the authoritative state; last fetch wins.

use crate::backend::BackendError;
use crate::model::snapshot::PlannerSnapshot;
use crate::model::task::{Task, TaskId, TaskPatch};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod local;
pub mod remote;

pub use local::{BlobStorage, FileBlobStorage, LocalStrategy, MemoryBlobStorage};
pub use remote::RemoteStrategy;

pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence mode chosen once at store construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    Remote,
    Local,
}

impl Display for PersistenceMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Errors from persistence strategies.
#[derive(Debug)]
pub enum PersistError {
    Backend(BackendError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "local storage error: {err}"),
            Self::Json(err) => write!(f, "local snapshot encoding error: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<BackendError> for PersistError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<std::io::Error> for PersistError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// One already-applied store mutation, described for replay.
///
/// Ordering mutations carry no payload: the new order is read from the
/// state passed to `commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddFocusArea {
        name: String,
    },
    /// `promote` names a parent that became a sub-project by this add.
    AddTask {
        task: Task,
        promote: Option<TaskId>,
    },
    RemoveTask {
        id: TaskId,
    },
    RemoveFocusArea {
        name: String,
    },
    ReorderFocusAreas,
    ReorderTasks,
    ScheduleTask {
        id: TaskId,
        date: String,
    },
    /// Scheduled and marked complete in one step.
    CompleteTask {
        id: TaskId,
    },
    UpdateTask {
        id: TaskId,
        patch: TaskPatch,
        promote: Option<TaskId>,
    },
    /// Whole state replaced (bulk import).
    ReplaceAll,
}

/// Result of committing one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Local state is authoritative as applied.
    Persisted,
    /// Server snapshot replaces local state.
    Reconciled {
        snapshot: PlannerSnapshot,
        /// Server-assigned id of a task created by this mutation.
        created_id: Option<TaskId>,
    },
}

/// Strategy seam between the store and its storage.
pub trait PersistenceStrategy {
    fn mode(&self) -> PersistenceMode;

    /// Loads the full planner state.
    fn load(&mut self) -> PersistResult<PlannerSnapshot>;

    /// Persists `mutation`, already applied to `state`.
    fn commit(
        &mut self,
        mutation: &Mutation,
        state: &PlannerSnapshot,
    ) -> PersistResult<CommitOutcome>;
}
