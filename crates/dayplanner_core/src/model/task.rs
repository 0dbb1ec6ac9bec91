//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its partial-update shape.
//! - Provide the date-shape check used by every scheduling path.
//!
//! # Invariants
//! - `scheduled_dates` behaves as an insertion-ordered set.
//! - Only `YYYY-MM-DD` shaped strings are accepted as scheduled dates.
//!   Calendar validity (for example `2024-02-30`) is not checked.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Integer task identifier, assigned as `max + 1` or by the backend.
pub type TaskId = i64;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Name of the owning focus area (soft reference).
    pub focus_area: String,
    /// Parent sub-project id. Only one level of nesting is allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_project_id: Option<TaskId>,
    /// Marks this task as a container for other tasks.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_sub_project: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub completed: bool,
    /// Display order among siblings. Gaps are tolerated.
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default, deserialize_with = "deserialize_dates")]
    pub scheduled_dates: Vec<String>,
}

impl Task {
    /// Creates a plain, unscheduled, incomplete task.
    pub fn new(id: TaskId, name: impl Into<String>, focus_area: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            focus_area: focus_area.into(),
            sub_project_id: None,
            is_sub_project: false,
            completed: false,
            sort_order: 0,
            scheduled_dates: Vec::new(),
        }
    }

    /// Returns whether the task is placed on `date`.
    pub fn is_scheduled_on(&self, date: &str) -> bool {
        self.scheduled_dates.iter().any(|value| value == date)
    }

    /// Appends `date` unless already present.
    ///
    /// Returns `false` when the date was already scheduled. Callers validate
    /// the date shape beforehand.
    pub fn add_scheduled_date(&mut self, date: &str) -> bool {
        if self.is_scheduled_on(date) {
            return false;
        }
        self.scheduled_dates.push(date.to_string());
        true
    }

    /// Merges provided patch fields over this record.
    ///
    /// Blank names and focus areas are ignored; scheduled dates are
    /// normalized before they replace the current set.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(name) = patch.name.as_deref().map(str::trim) {
            if !name.is_empty() {
                self.name = name.to_string();
            }
        }
        if let Some(focus_area) = patch.focus_area.as_deref().map(str::trim) {
            if !focus_area.is_empty() {
                self.focus_area = focus_area.to_string();
            }
        }
        if let Some(sub_project_id) = patch.sub_project_id {
            self.sub_project_id = sub_project_id;
        }
        if let Some(is_sub_project) = patch.is_sub_project {
            self.is_sub_project = is_sub_project;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(dates) = &patch.scheduled_dates {
            self.scheduled_dates = normalize_scheduled_dates(dates);
        }
    }

    /// Grouping key for sub-project reordering: same focus area.
    pub fn shares_sub_project_group(&self, other: &Task) -> bool {
        self.is_sub_project && other.is_sub_project && self.focus_area == other.focus_area
    }

    /// Grouping key for task reordering: same focus area and same parent.
    pub fn shares_task_group(&self, other: &Task) -> bool {
        !self.is_sub_project
            && !other.is_sub_project
            && self.focus_area == other.focus_area
            && self.sub_project_id == other.sub_project_id
    }
}

/// Creation request for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub focus_area: String,
    pub sub_project_id: Option<TaskId>,
}

impl NewTask {
    pub fn new(name: impl Into<String>, focus_area: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            focus_area: focus_area.into(),
            sub_project_id: None,
        }
    }

    /// Places the new task under an existing sub-project.
    pub fn under(mut self, sub_project_id: TaskId) -> Self {
        self.sub_project_id = Some(sub_project_id);
        self
    }
}

/// Partial update for one task. `None` keeps the stored value.
///
/// `sub_project_id` is doubly optional so callers can clear the parent
/// reference with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub focus_area: Option<String>,
    pub sub_project_id: Option<Option<TaskId>>,
    pub is_sub_project: Option<bool>,
    pub completed: Option<bool>,
    pub scheduled_dates: Option<Vec<String>>,
}

impl TaskPatch {
    /// Returns the parent this patch attaches the task to, if any.
    pub fn new_parent(&self) -> Option<TaskId> {
        self.sub_project_id.flatten()
    }
}

/// Returns whether `value` has the `YYYY-MM-DD` shape.
pub fn is_valid_iso_date(value: &str) -> bool {
    ISO_DATE_RE.is_match(value)
}

/// Trims, drops malformed entries and removes duplicates keeping first order.
pub fn normalize_scheduled_dates(dates: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(dates.len());
    for date in dates.iter().map(|value| value.trim()) {
        if is_valid_iso_date(date) && !normalized.iter().any(|value| value == date) {
            normalized.push(date.to_string());
        }
    }
    normalized
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn deserialize_dates<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
