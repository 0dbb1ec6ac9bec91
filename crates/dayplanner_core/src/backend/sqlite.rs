//! SQLite implementation of the remote persistence contract.
//!
//! Validates requests above the repository layer, the way an API handler
//! would, and delegates storage to the planner repositories.

use super::{BackendError, BackendResult, CreateTaskRequest, RemoteBackend};
use crate::db::{open_db, open_db_in_memory};
use crate::model::focus_area::normalize_focus_area_name;
use crate::model::snapshot::PlannerSnapshot;
use crate::model::task::{is_valid_iso_date, Task, TaskId, TaskPatch};
use crate::repo::focus_area_repo::{FocusAreaRepository, SqliteFocusAreaRepository};
use crate::repo::snapshot_repo::{MigrationReport, SnapshotRepository, SqliteSnapshotRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskDraft, TaskRepository};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;

/// Backing service over one SQLite connection.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens the database file, reporting failures as `Unavailable`.
    pub fn open(path: impl AsRef<Path>) -> BackendResult<Self> {
        let path = path.as_ref();
        let conn = open_db(path).map_err(|err| {
            BackendError::Unavailable(format!("cannot open `{}`: {err}", path.display()))
        })?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> BackendResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn tasks(&self) -> BackendResult<SqliteTaskRepository<'_>> {
        Ok(SqliteTaskRepository::try_new(&self.conn)?)
    }

    fn focus_areas(&self) -> BackendResult<SqliteFocusAreaRepository<'_>> {
        Ok(SqliteFocusAreaRepository::try_new(&self.conn)?)
    }
}

impl RemoteBackend for SqliteBackend {
    fn list_tasks(&self) -> BackendResult<Vec<Task>> {
        Ok(self.tasks()?.list_tasks()?)
    }

    fn create_task(&self, request: &CreateTaskRequest) -> BackendResult<Task> {
        let name = request.name.trim();
        let focus_area = request.focus_area.trim();
        if name.is_empty() || focus_area.is_empty() {
            return Err(BackendError::InvalidRequest(
                "name and focus area are required",
            ));
        }

        let task = self.tasks()?.create_task(&TaskDraft {
            name: name.to_string(),
            focus_area: focus_area.to_string(),
            sub_project_id: request.sub_project_id,
            is_sub_project: request.is_sub_project,
        })?;
        info!(
            "event=task_create module=backend status=ok task_id={} sub_project={}",
            task.id, task.is_sub_project
        );
        Ok(task)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> BackendResult<()> {
        let repo = self.tasks()?;
        let mut task = repo.get_task(id)?.ok_or(BackendError::TaskNotFound(id))?;
        task.apply_patch(patch);

        let dates = patch
            .scheduled_dates
            .as_ref()
            .map(|_| task.scheduled_dates.as_slice());
        repo.update_task(&task, dates)?;
        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> BackendResult<()> {
        let removed = self.tasks()?.delete_task(id)?;
        info!("event=task_delete module=backend status=ok task_id={id} removed={removed}");
        Ok(())
    }

    fn schedule_task(&self, id: TaskId, date: &str) -> BackendResult<()> {
        let date = date.trim();
        if !is_valid_iso_date(date) {
            return Err(BackendError::InvalidRequest("date must be YYYY-MM-DD"));
        }
        self.tasks()?.add_scheduled_date(id, date)?;
        Ok(())
    }

    fn reorder_tasks(&self, order: &[TaskId]) -> BackendResult<()> {
        Ok(self.tasks()?.reorder_tasks(order)?)
    }

    fn list_focus_areas(&self) -> BackendResult<Vec<String>> {
        Ok(self
            .focus_areas()?
            .list_focus_areas()?
            .into_iter()
            .map(|area| area.name)
            .collect())
    }

    fn create_focus_area(&self, name: &str) -> BackendResult<String> {
        let name = normalize_focus_area_name(name)
            .ok_or(BackendError::InvalidRequest("name is required"))?;
        self.focus_areas()?.create_focus_area(&name)?;
        Ok(name)
    }

    fn delete_focus_area(&self, name: &str) -> BackendResult<()> {
        let removed = self.focus_areas()?.delete_focus_area(name)?;
        info!("event=focus_area_delete module=backend status=ok removed_tasks={removed}");
        Ok(())
    }

    fn reorder_focus_areas(&self, order: &[String]) -> BackendResult<()> {
        Ok(self.focus_areas()?.reorder_focus_areas(order)?)
    }

    fn migrate(&self, snapshot: &PlannerSnapshot) -> BackendResult<MigrationReport> {
        let report = SqliteSnapshotRepository::try_new(&self.conn)?
            .replace_snapshot(snapshot)
            .map_err(|err| {
                error!("event=migrate module=backend status=error error={err}");
                err
            })?;
        info!(
            "event=migrate module=backend status=ok tasks={} focus_areas={} scheduled_dates={}",
            report.tasks, report.focus_areas, report.scheduled_dates
        );
        Ok(report)
    }
}
