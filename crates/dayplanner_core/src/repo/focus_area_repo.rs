//! Focus-area repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing is deterministic: `sort_order ASC, id ASC`.
//! - New focus areas go to `MAX(sort_order) + 1`; duplicates are ignored.
//! - Deleting a focus area deletes its tasks and their scheduled dates.

use crate::model::focus_area::FocusArea;
use crate::repo::{ensure_planner_connection_ready, RepoResult};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Repository interface for focus-area rows.
pub trait FocusAreaRepository {
    fn list_focus_areas(&self) -> RepoResult<Vec<FocusArea>>;
    /// Inserts one focus area. Returns `false` when the name already exists.
    fn create_focus_area(&self, name: &str) -> RepoResult<bool>;
    /// Deletes one focus area with its tasks. Returns removed task count.
    fn delete_focus_area(&self, name: &str) -> RepoResult<usize>;
    /// Rewrites `sort_order` to each name's position in `order`.
    fn reorder_focus_areas(&self, order: &[String]) -> RepoResult<()>;
}

/// SQLite-backed focus-area repository.
pub struct SqliteFocusAreaRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFocusAreaRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_planner_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl FocusAreaRepository for SqliteFocusAreaRepository<'_> {
    fn list_focus_areas(&self) -> RepoResult<Vec<FocusArea>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, sort_order
             FROM focus_areas
             ORDER BY sort_order ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut areas = Vec::new();
        while let Some(row) = rows.next()? {
            areas.push(FocusArea {
                name: row.get(0)?,
                sort_order: row.get(1)?,
            });
        }
        Ok(areas)
    }

    fn create_focus_area(&self, name: &str) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO focus_areas (name, sort_order)
             VALUES (?1, (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM focus_areas));",
            [name],
        )?;
        Ok(inserted == 1)
    }

    fn delete_focus_area(&self, name: &str) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM scheduled_dates
             WHERE task_id IN (SELECT id FROM tasks WHERE focus_area = ?1);",
            [name],
        )?;
        let removed = tx.execute("DELETE FROM tasks WHERE focus_area = ?1;", [name])?;
        tx.execute("DELETE FROM focus_areas WHERE name = ?1;", [name])?;
        tx.commit()?;
        Ok(removed)
    }

    fn reorder_focus_areas(&self, order: &[String]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (index, name) in order.iter().enumerate() {
            tx.execute(
                "UPDATE focus_areas SET sort_order = ?2 WHERE name = ?1;",
                params![name.as_str(), index as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
