//! Bulk snapshot replacement for the relational backend.
//!
//! # Invariants
//! - Replacement is all-or-nothing (one immediate transaction).
//! - Focus-area and task `sort_order` are re-assigned by array position.
//! - Task ids from the snapshot are kept as-is.

use crate::model::snapshot::PlannerSnapshot;
use crate::repo::{ensure_planner_connection_ready, flag_to_int, RepoResult};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Counts reported after a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub tasks: usize,
    pub focus_areas: usize,
    pub scheduled_dates: usize,
}

/// Repository interface for whole-state replacement.
pub trait SnapshotRepository {
    /// Clears every planner table and inserts `snapshot`.
    fn replace_snapshot(&self, snapshot: &PlannerSnapshot) -> RepoResult<MigrationReport>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_planner_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn replace_snapshot(&self, snapshot: &PlannerSnapshot) -> RepoResult<MigrationReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute_batch(
            "DELETE FROM scheduled_dates;
             DELETE FROM tasks;
             DELETE FROM focus_areas;",
        )?;

        let mut report = MigrationReport::default();
        for (index, name) in snapshot.focus_areas.iter().enumerate() {
            report.focus_areas += tx.execute(
                "INSERT OR IGNORE INTO focus_areas (name, sort_order) VALUES (?1, ?2);",
                params![name.as_str(), index as i64],
            )?;
        }

        for (index, task) in snapshot.tasks.iter().enumerate() {
            report.tasks += tx.execute(
                "INSERT INTO tasks (
                    id,
                    name,
                    focus_area,
                    sub_project_id,
                    is_sub_project,
                    completed,
                    sort_order
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    task.id,
                    task.name.as_str(),
                    task.focus_area.as_str(),
                    task.sub_project_id,
                    flag_to_int(task.is_sub_project),
                    flag_to_int(task.completed),
                    index as i64,
                ],
            )?;

            for date in &task.scheduled_dates {
                report.scheduled_dates += tx.execute(
                    "INSERT OR IGNORE INTO scheduled_dates (task_id, scheduled_date)
                     VALUES (?1, ?2);",
                    params![task.id, date.as_str()],
                )?;
            }
        }

        tx.commit()?;
        Ok(report)
    }
}
