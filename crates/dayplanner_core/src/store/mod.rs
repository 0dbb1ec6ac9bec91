//! Task/focus-area store.
//!
//! # Responsibility
//! - Own the canonical ordered task and focus-area collections.
//! - Enforce hierarchy, ordering and scheduling invariants on every mutation.
//! - Commit each mutation through the persistence strategy picked at startup
//!   and notify subscribers afterwards.
//!
//! # Invariants
//! - Validation failures are silent no-ops (logged at debug level).
//! - Every mutation is applied locally first, then committed. A reconciled
//!   server snapshot replaces local state; a failed commit keeps the local
//!   apply without rollback.
//! - Focus areas only shrink through `remove_focus_area`.
//! - Sub-project deletion cascades to its children.

use crate::model::focus_area::normalize_focus_area_name;
use crate::model::snapshot::PlannerSnapshot;
use crate::model::task::{
    is_valid_iso_date, normalize_scheduled_dates, NewTask, Task, TaskId, TaskPatch,
};
use crate::persist::{
    CommitOutcome, Mutation, PersistError, PersistenceMode, PersistenceStrategy,
};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender};

pub mod reorder;

use reorder::move_item;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the few store operations that can fail explicitly.
#[derive(Debug)]
pub enum StoreError {
    TaskNotFound(TaskId),
    Persist(PersistError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TaskNotFound(_) => None,
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<PersistError> for StoreError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Change notification sent to subscribers after each completed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// Monotonic counter of completed mutations.
    pub revision: u64,
    pub operation: &'static str,
}

/// Single-writer planner state container.
pub struct TaskStore {
    state: PlannerSnapshot,
    strategy: Box<dyn PersistenceStrategy>,
    subscribers: Vec<Sender<StoreEvent>>,
    revision: u64,
}

impl TaskStore {
    /// Creates a store over one strategy, loading its current state.
    ///
    /// A failed load is logged and starts from an empty planner.
    pub fn with_strategy(mut strategy: Box<dyn PersistenceStrategy>) -> Self {
        let state = match strategy.load() {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    "event=store_load module=store status=error mode={} error={}",
                    strategy.mode(),
                    err
                );
                PlannerSnapshot::default()
            }
        };
        Self::from_parts(state, strategy)
    }

    /// Selects remote mode when `remote` loads, otherwise falls back to `local`
    /// for the rest of the session.
    pub fn connect(
        remote: Option<Box<dyn PersistenceStrategy>>,
        local: Box<dyn PersistenceStrategy>,
    ) -> Self {
        if let Some(mut remote) = remote {
            match remote.load() {
                Ok(state) => return Self::from_parts(state, remote),
                Err(err) => warn!(
                    "event=store_connect module=store status=fallback mode=local error={err}"
                ),
            }
        }
        Self::with_strategy(local)
    }

    fn from_parts(state: PlannerSnapshot, strategy: Box<dyn PersistenceStrategy>) -> Self {
        info!(
            "event=store_connect module=store status=ok mode={} tasks={} focus_areas={}",
            strategy.mode(),
            state.tasks.len(),
            state.focus_areas.len()
        );
        Self {
            state,
            strategy,
            subscribers: Vec::new(),
            revision: 0,
        }
    }

    pub fn mode(&self) -> PersistenceMode {
        self.strategy.mode()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn focus_areas(&self) -> &[String] {
        &self.state.focus_areas
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.state.task(id)
    }

    pub fn snapshot(&self) -> &PlannerSnapshot {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Registers a subscriber. Dropped receivers are pruned on next notify.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Replaces local state with a fresh load from the active strategy.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.state = self.strategy.load()?;
        self.notify("reload");
        Ok(())
    }

    /// Appends a focus area. Blank and duplicate names are ignored.
    pub fn add_focus_area(&mut self, name: &str) -> bool {
        let Some(name) = normalize_focus_area_name(name) else {
            debug!("event=add_focus_area module=store status=skip reason=blank_name");
            return false;
        };
        if self.state.has_focus_area(&name) {
            debug!("event=add_focus_area module=store status=skip reason=duplicate");
            return false;
        }

        self.state.focus_areas.push(name.clone());
        self.commit("add_focus_area", Mutation::AddFocusArea { name });
        true
    }

    /// Appends a task, promoting its parent and creating its focus area.
    ///
    /// Returns the new id, or `None` when name or focus area is blank.
    pub fn add_task(&mut self, request: NewTask) -> Option<TaskId> {
        self.insert_task(request, false, "add_task")
    }

    /// Appends a task flagged as a sub-project with no parent.
    pub fn add_sub_project(&mut self, name: &str, focus_area: &str) -> Option<TaskId> {
        self.insert_task(NewTask::new(name, focus_area), true, "add_sub_project")
    }

    fn insert_task(
        &mut self,
        request: NewTask,
        is_sub_project: bool,
        operation: &'static str,
    ) -> Option<TaskId> {
        let name = request.name.trim();
        let Some(focus_area) = normalize_focus_area_name(&request.focus_area) else {
            debug!("event={operation} module=store status=skip reason=blank_focus_area");
            return None;
        };
        if name.is_empty() {
            debug!("event={operation} module=store status=skip reason=blank_name");
            return None;
        }

        let sub_project_id = if is_sub_project {
            None
        } else {
            request
                .sub_project_id
                .filter(|parent| self.accepts_parent(*parent, None))
        };
        let promote = sub_project_id.filter(|parent| {
            self.state
                .task(*parent)
                .is_some_and(|task| !task.is_sub_project)
        });

        let id = self.state.next_task_id();
        let mut task = Task::new(id, name, focus_area.as_str());
        task.sub_project_id = sub_project_id;
        task.is_sub_project = is_sub_project;
        task.sort_order = self.next_sort_order();

        if let Some(parent) = sub_project_id.and_then(|parent| self.state.task_mut(parent)) {
            parent.is_sub_project = true;
        }
        if !self.state.has_focus_area(&focus_area) {
            self.state.focus_areas.push(focus_area);
        }
        self.state.tasks.push(task.clone());

        let created = self.commit(operation, Mutation::AddTask { task, promote });
        Some(created.unwrap_or(id))
    }

    /// Deletes a task. Sub-projects take their children with them; other
    /// tasks leave no dangling parent references behind.
    pub fn remove_task(&mut self, id: TaskId) -> bool {
        let Some(target) = self.state.task(id) else {
            debug!("event=remove_task module=store status=skip reason=not_found task_id={id}");
            return false;
        };

        if target.is_sub_project {
            self.state
                .tasks
                .retain(|task| task.id != id && task.sub_project_id != Some(id));
        } else {
            self.state.tasks.retain(|task| task.id != id);
            for task in &mut self.state.tasks {
                if task.sub_project_id == Some(id) {
                    task.sub_project_id = None;
                }
            }
        }

        self.commit("remove_task", Mutation::RemoveTask { id });
        true
    }

    /// Deletes a focus area and every task filed under it.
    pub fn remove_focus_area(&mut self, name: &str) -> bool {
        let Some(name) = normalize_focus_area_name(name) else {
            debug!("event=remove_focus_area module=store status=skip reason=blank_name");
            return false;
        };

        self.state.focus_areas.retain(|area| *area != name);
        self.state.tasks.retain(|task| task.focus_area != name);
        self.commit("remove_focus_area", Mutation::RemoveFocusArea { name });
        true
    }

    /// Moves `source` next to `target` in the focus-area order.
    pub fn reorder_focus_areas(&mut self, source: &str, target: &str) -> bool {
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() {
            return false;
        }

        let moved = move_item(
            &mut self.state.focus_areas,
            |area| area == source,
            |area| area == target,
        );
        if !moved {
            debug!("event=reorder_focus_areas module=store status=skip");
            return false;
        }
        self.commit("reorder_focus_areas", Mutation::ReorderFocusAreas);
        true
    }

    /// Moves one sub-project next to another in the same focus area.
    pub fn reorder_sub_projects(&mut self, source_id: TaskId, target_id: TaskId) -> bool {
        self.reorder_within_group(source_id, target_id, "reorder_sub_projects", |source, target| {
            source.shares_sub_project_group(target)
        })
    }

    /// Moves one task next to a sibling (same focus area and parent).
    pub fn reorder_tasks(&mut self, source_id: TaskId, target_id: TaskId) -> bool {
        self.reorder_within_group(source_id, target_id, "reorder_tasks", |source, target| {
            source.shares_task_group(target)
        })
    }

    fn reorder_within_group(
        &mut self,
        source_id: TaskId,
        target_id: TaskId,
        operation: &'static str,
        same_group: impl Fn(&Task, &Task) -> bool,
    ) -> bool {
        let grouped = match (self.state.task(source_id), self.state.task(target_id)) {
            (Some(source), Some(target)) => same_group(source, target),
            _ => false,
        };
        if !grouped {
            debug!(
                "event={operation} module=store status=skip source_id={source_id} target_id={target_id}"
            );
            return false;
        }

        if !move_item(
            &mut self.state.tasks,
            |task| task.id == source_id,
            |task| task.id == target_id,
        ) {
            return false;
        }
        for (index, task) in self.state.tasks.iter_mut().enumerate() {
            task.sort_order = index as i64;
        }
        self.commit(operation, Mutation::ReorderTasks);
        true
    }

    /// Places a task on `iso_date`. Idempotent per date.
    pub fn schedule_task(&mut self, id: TaskId, iso_date: &str) -> bool {
        let date = iso_date.trim();
        if !is_valid_iso_date(date) {
            debug!("event=schedule_task module=store status=skip reason=invalid_date");
            return false;
        }
        let Some(task) = self.state.task_mut(id) else {
            debug!("event=schedule_task module=store status=skip reason=not_found task_id={id}");
            return false;
        };
        if !task.add_scheduled_date(date) {
            return false;
        }

        self.commit(
            "schedule_task",
            Mutation::ScheduleTask {
                id,
                date: date.to_string(),
            },
        );
        true
    }

    /// Places a task on `iso_date` and marks it complete in one update.
    pub fn schedule_and_complete_task(&mut self, id: TaskId, iso_date: &str) -> bool {
        let date = iso_date.trim();
        if !is_valid_iso_date(date) {
            debug!("event=schedule_and_complete_task module=store status=skip reason=invalid_date");
            return false;
        }
        let Some(task) = self.state.task_mut(id) else {
            debug!(
                "event=schedule_and_complete_task module=store status=skip reason=not_found task_id={id}"
            );
            return false;
        };
        task.add_scheduled_date(date);
        task.completed = true;

        self.commit("schedule_and_complete_task", Mutation::CompleteTask { id });
        true
    }

    /// Merges `patch` over an existing task.
    ///
    /// A parent reference that would nest deeper than one level, or that
    /// points at a missing task, is dropped from the patch. Sub-projects and
    /// tasks that already have children cannot be given a parent.
    ///
    /// # Errors
    /// - `StoreError::TaskNotFound` when `id` is unknown.
    pub fn update_task(&mut self, id: TaskId, mut patch: TaskPatch) -> StoreResult<()> {
        if self.state.task(id).is_none() {
            return Err(StoreError::TaskNotFound(id));
        }

        patch.name = patch
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        patch.focus_area = patch
            .focus_area
            .as_deref()
            .and_then(normalize_focus_area_name);
        patch.scheduled_dates = patch
            .scheduled_dates
            .as_deref()
            .map(normalize_scheduled_dates);
        if let Some(parent) = patch.new_parent() {
            let becomes_sub_project = patch.is_sub_project == Some(true);
            if becomes_sub_project
                || !self.accepts_parent(parent, Some(id))
                || !self.can_be_nested(id)
            {
                patch.sub_project_id = None;
            }
        }
        let promote = patch.new_parent().filter(|parent| {
            self.state
                .task(*parent)
                .is_some_and(|task| !task.is_sub_project)
        });

        if let Some(parent) = promote.and_then(|parent| self.state.task_mut(parent)) {
            parent.is_sub_project = true;
        }
        if let Some(task) = self.state.task_mut(id) {
            task.apply_patch(&patch);
        }
        if let Some(focus_area) = &patch.focus_area {
            if !self.state.has_focus_area(focus_area) {
                self.state.focus_areas.push(focus_area.clone());
            }
        }

        self.commit("update_task", Mutation::UpdateTask { id, patch, promote });
        Ok(())
    }

    /// Replaces all state with `snapshot` (bulk migration).
    ///
    /// # Errors
    /// - `StoreError::Persist` when the strategy rejects the import. The
    ///   imported state stays applied locally.
    pub fn import_snapshot(&mut self, snapshot: PlannerSnapshot) -> StoreResult<()> {
        self.state = snapshot;
        let result = self.try_commit(&Mutation::ReplaceAll);
        self.notify("import_snapshot");
        result.map(|_| ()).map_err(Into::into)
    }

    fn accepts_parent(&self, parent: TaskId, child: Option<TaskId>) -> bool {
        if Some(parent) == child {
            return false;
        }
        match self.state.task(parent) {
            Some(task) if task.sub_project_id.is_none() => true,
            Some(_) => {
                debug!("event=parent_check module=store status=skip reason=nested parent_id={parent}");
                false
            }
            None => {
                debug!("event=parent_check module=store status=skip reason=not_found parent_id={parent}");
                false
            }
        }
    }

    /// Sub-projects and tasks with children stay at the top level.
    fn can_be_nested(&self, id: TaskId) -> bool {
        let is_sub_project = self.state.task(id).is_some_and(|task| task.is_sub_project);
        let has_children = self
            .state
            .tasks
            .iter()
            .any(|task| task.sub_project_id == Some(id));
        if is_sub_project || has_children {
            debug!("event=parent_check module=store status=skip reason=has_children task_id={id}");
            return false;
        }
        true
    }

    fn next_sort_order(&self) -> i64 {
        self.state
            .tasks
            .iter()
            .map(|task| task.sort_order)
            .max()
            .map_or(0, |max| max + 1)
    }

    fn commit(&mut self, operation: &'static str, mutation: Mutation) -> Option<TaskId> {
        let created = match self.try_commit(&mutation) {
            Ok(created) => created,
            Err(err) => {
                error!(
                    "event={} module=store status=error mode={} error={}",
                    operation,
                    self.strategy.mode(),
                    err
                );
                None
            }
        };
        self.notify(operation);
        created
    }

    fn try_commit(&mut self, mutation: &Mutation) -> Result<Option<TaskId>, PersistError> {
        match self.strategy.commit(mutation, &self.state)? {
            CommitOutcome::Persisted => Ok(None),
            CommitOutcome::Reconciled {
                snapshot,
                created_id,
            } => {
                self.state = snapshot;
                Ok(created_id)
            }
        }
    }

    fn notify(&mut self, operation: &'static str) {
        self.revision += 1;
        let event = StoreEvent {
            revision: self.revision,
            operation,
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
