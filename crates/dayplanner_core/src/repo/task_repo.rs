//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, scheduling and ordering APIs over `tasks` and
//!   `scheduled_dates`.
//!
//! # Invariants
//! - Task listing is deterministic: `sort_order ASC, id ASC`.
//! - Scheduled dates keep insertion order and are unique per task.
//! - Deleting a sub-project deletes its children; deleting any other task
//!   clears references to it.

use crate::model::task::{Task, TaskId};
use crate::repo::{
    ensure_planner_connection_ready, flag_to_int, parse_flag, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    name,
    focus_area,
    sub_project_id,
    is_sub_project,
    completed,
    sort_order
FROM tasks";

/// Insert model for one task row. The id is assigned by SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub focus_area: String,
    pub sub_project_id: Option<TaskId>,
    pub is_sub_project: bool,
}

/// Repository interface for task rows.
pub trait TaskRepository {
    /// Lists all tasks with their scheduled dates.
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Inserts one task at the end of the global order.
    fn create_task(&self, draft: &TaskDraft) -> RepoResult<Task>;
    /// Writes all scalar fields; replaces scheduled dates when provided.
    fn update_task(&self, task: &Task, scheduled_dates: Option<&[String]>) -> RepoResult<()>;
    /// Adds one date. Returns `false` when it was already scheduled.
    fn add_scheduled_date(&self, id: TaskId, date: &str) -> RepoResult<bool>;
    /// Deletes one task with its cascade. Returns removed task count.
    fn delete_task(&self, id: TaskId) -> RepoResult<usize>;
    /// Rewrites `sort_order` to each id's position in `order`.
    fn reorder_tasks(&self, order: &[TaskId]) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_planner_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut dates = load_all_scheduled_dates(self.conn)?;
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY sort_order ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            task.scheduled_dates = dates.remove(&task.id).unwrap_or_default();
            tasks.push(task);
        }
        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        load_task(self.conn, id)
    }

    fn create_task(&self, draft: &TaskDraft) -> RepoResult<Task> {
        let sort_order: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM tasks;",
            [],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO tasks (
                name,
                focus_area,
                sub_project_id,
                is_sub_project,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                draft.name.as_str(),
                draft.focus_area.as_str(),
                draft.sub_project_id,
                flag_to_int(draft.is_sub_project),
                sort_order,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        load_task(self.conn, id)?.ok_or(RepoError::TaskNotFound(id))
    }

    fn update_task(&self, task: &Task, scheduled_dates: Option<&[String]>) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE tasks
             SET name = ?2,
                 focus_area = ?3,
                 sub_project_id = ?4,
                 is_sub_project = ?5,
                 completed = ?6,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                task.id,
                task.name.as_str(),
                task.focus_area.as_str(),
                task.sub_project_id,
                flag_to_int(task.is_sub_project),
                flag_to_int(task.completed),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(task.id));
        }

        if let Some(dates) = scheduled_dates {
            tx.execute("DELETE FROM scheduled_dates WHERE task_id = ?1;", [task.id])?;
            for date in dates {
                tx.execute(
                    "INSERT OR IGNORE INTO scheduled_dates (task_id, scheduled_date)
                     VALUES (?1, ?2);",
                    params![task.id, date.as_str()],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn add_scheduled_date(&self, id: TaskId, date: &str) -> RepoResult<bool> {
        if !task_exists(self.conn, id)? {
            return Err(RepoError::TaskNotFound(id));
        }
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO scheduled_dates (task_id, scheduled_date)
             VALUES (?1, ?2);",
            params![id, date],
        )?;
        Ok(inserted == 1)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let is_sub_project: Option<i64> = tx
            .query_row(
                "SELECT is_sub_project FROM tasks WHERE id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(is_sub_project) = is_sub_project else {
            return Ok(0);
        };

        let removed = if parse_flag(is_sub_project, "tasks.is_sub_project")? {
            tx.execute(
                "DELETE FROM scheduled_dates
                 WHERE task_id IN (
                    SELECT id FROM tasks WHERE id = ?1 OR sub_project_id = ?1
                 );",
                [id],
            )?;
            tx.execute(
                "DELETE FROM tasks WHERE id = ?1 OR sub_project_id = ?1;",
                [id],
            )?
        } else {
            tx.execute("DELETE FROM scheduled_dates WHERE task_id = ?1;", [id])?;
            let removed = tx.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
            tx.execute(
                "UPDATE tasks
                 SET sub_project_id = NULL,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE sub_project_id = ?1;",
                [id],
            )?;
            removed
        };

        tx.commit()?;
        Ok(removed)
    }

    fn reorder_tasks(&self, order: &[TaskId]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (index, id) in order.iter().enumerate() {
            tx.execute(
                "UPDATE tasks
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id, index as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn load_task(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut task = parse_task_row(row)?;
    let mut dates_stmt = conn.prepare(
        "SELECT scheduled_date
         FROM scheduled_dates
         WHERE task_id = ?1
         ORDER BY id ASC;",
    )?;
    let mut date_rows = dates_stmt.query([id])?;
    while let Some(date_row) = date_rows.next()? {
        task.scheduled_dates.push(date_row.get(0)?);
    }
    Ok(Some(task))
}

fn load_all_scheduled_dates(conn: &Connection) -> RepoResult<HashMap<TaskId, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT task_id, scheduled_date
         FROM scheduled_dates
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut dates: HashMap<TaskId, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let task_id: TaskId = row.get(0)?;
        dates.entry(task_id).or_default().push(row.get(1)?);
    }
    Ok(dates)
}

pub(crate) fn task_exists(conn: &Connection, id: TaskId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let name: String = row.get("name")?;
    if name.trim().is_empty() {
        let id: TaskId = row.get("id")?;
        return Err(RepoError::InvalidData(format!(
            "blank name for task {id} in tasks.name"
        )));
    }

    Ok(Task {
        id: row.get("id")?,
        name,
        focus_area: row.get("focus_area")?,
        sub_project_id: row.get("sub_project_id")?,
        is_sub_project: parse_flag(row.get("is_sub_project")?, "tasks.is_sub_project")?,
        completed: parse_flag(row.get("completed")?, "tasks.completed")?,
        sort_order: row.get("sort_order")?,
        scheduled_dates: Vec::new(),
    })
}
