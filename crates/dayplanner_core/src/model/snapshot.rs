//! Full planner state snapshot.
//!
//! # Responsibility
//! - Carry `{tasks, focusAreas}` between the store and its persistence
//!   strategies.
//! - Decode the local blob format, including the legacy singular
//!   `scheduledDate` field.
//!
//! # Invariants
//! - The singular `scheduledDate` is accepted as input only and never written.

use crate::model::task::{normalize_scheduled_dates, Task, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const LEGACY_SCHEDULED_DATE_KEY: &str = "scheduledDate";
const SCHEDULED_DATES_KEY: &str = "scheduledDates";

/// Ordered planner state. Sequence order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerSnapshot {
    pub tasks: Vec<Task>,
    pub focus_areas: Vec<String>,
}

impl PlannerSnapshot {
    pub fn new(tasks: Vec<Task>, focus_areas: Vec<String>) -> Self {
        Self { tasks, focus_areas }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.focus_areas.is_empty()
    }

    /// Decodes a local blob and migrates legacy task records.
    ///
    /// # Errors
    /// - Returns a JSON error when the blob is not an object with both
    ///   `tasks` and `focusAreas` arrays of valid records.
    pub fn from_local_blob(raw: &str) -> serde_json::Result<Self> {
        let mut value: Value = serde_json::from_str(raw)?;
        if let Some(tasks) = value.get_mut("tasks").and_then(Value::as_array_mut) {
            for task in tasks.iter_mut().filter_map(Value::as_object_mut) {
                migrate_legacy_scheduled_date(task);
            }
        }

        let mut snapshot: Self = serde_json::from_value(value)?;
        for task in &mut snapshot.tasks {
            task.scheduled_dates = normalize_scheduled_dates(&task.scheduled_dates);
        }
        Ok(snapshot)
    }

    /// Encodes this snapshot in the local blob format.
    pub fn to_local_blob(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Returns `max(id) + 1`, or `1` for an empty task list.
    pub fn next_task_id(&self) -> TaskId {
        self.tasks.iter().map(|task| task.id).max().map_or(1, |max| max + 1)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn has_focus_area(&self, name: &str) -> bool {
        self.focus_areas.iter().any(|area| area == name)
    }

    /// Total scheduled date placements across all tasks.
    pub fn scheduled_date_count(&self) -> usize {
        self.tasks.iter().map(|task| task.scheduled_dates.len()).sum()
    }
}

fn migrate_legacy_scheduled_date(task: &mut Map<String, Value>) {
    let Some(legacy) = task.remove(LEGACY_SCHEDULED_DATE_KEY) else {
        return;
    };
    let has_plural = task
        .get(SCHEDULED_DATES_KEY)
        .is_some_and(|value| !value.is_null());
    if has_plural {
        return;
    }
    if let Value::String(date) = legacy {
        if !date.is_empty() {
            task.insert(
                SCHEDULED_DATES_KEY.to_string(),
                Value::Array(vec![Value::String(date)]),
            );
        }
    }
}
