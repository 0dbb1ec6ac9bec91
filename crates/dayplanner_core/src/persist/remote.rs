//! Remote strategy: replay on the backend, then re-fetch.
//!
//! Every commit ends with a full `list_tasks` + `list_focus_areas` fetch, so
//! the store converges on whatever the backend holds after the call.

use super::{CommitOutcome, Mutation, PersistResult, PersistenceMode, PersistenceStrategy};
use crate::backend::{CreateTaskRequest, RemoteBackend};
use crate::model::snapshot::PlannerSnapshot;
use crate::model::task::{TaskId, TaskPatch};
use log::debug;

/// Strategy that persists through a [`RemoteBackend`].
pub struct RemoteStrategy<B: RemoteBackend> {
    backend: B,
}

impl<B: RemoteBackend> RemoteStrategy<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn promote(&self, parent: Option<TaskId>) -> PersistResult<()> {
        if let Some(parent) = parent {
            self.backend.update_task(
                parent,
                &TaskPatch {
                    is_sub_project: Some(true),
                    ..TaskPatch::default()
                },
            )?;
        }
        Ok(())
    }

    fn replay(&self, mutation: &Mutation, state: &PlannerSnapshot) -> PersistResult<Option<TaskId>> {
        match mutation {
            Mutation::AddFocusArea { name } => {
                self.backend.create_focus_area(name)?;
            }
            Mutation::AddTask { task, promote } => {
                self.promote(*promote)?;
                self.backend.create_focus_area(&task.focus_area)?;
                let created = self.backend.create_task(&CreateTaskRequest {
                    name: task.name.clone(),
                    focus_area: task.focus_area.clone(),
                    sub_project_id: task.sub_project_id,
                    is_sub_project: task.is_sub_project,
                })?;
                return Ok(Some(created.id));
            }
            Mutation::RemoveTask { id } => self.backend.delete_task(*id)?,
            Mutation::RemoveFocusArea { name } => self.backend.delete_focus_area(name)?,
            Mutation::ReorderFocusAreas => self.backend.reorder_focus_areas(&state.focus_areas)?,
            Mutation::ReorderTasks => {
                let order: Vec<TaskId> = state.tasks.iter().map(|task| task.id).collect();
                self.backend.reorder_tasks(&order)?;
            }
            Mutation::ScheduleTask { id, date } => self.backend.schedule_task(*id, date)?,
            Mutation::CompleteTask { id } => {
                let scheduled_dates = state.task(*id).map(|task| task.scheduled_dates.clone());
                self.backend.update_task(
                    *id,
                    &TaskPatch {
                        completed: Some(true),
                        scheduled_dates,
                        ..TaskPatch::default()
                    },
                )?;
            }
            Mutation::UpdateTask { id, patch, promote } => {
                self.promote(*promote)?;
                if let Some(focus_area) = &patch.focus_area {
                    self.backend.create_focus_area(focus_area)?;
                }
                self.backend.update_task(*id, patch)?;
            }
            Mutation::ReplaceAll => {
                self.backend.migrate(state)?;
            }
        }
        Ok(None)
    }
}

impl<B: RemoteBackend> PersistenceStrategy for RemoteStrategy<B> {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::Remote
    }

    fn load(&mut self) -> PersistResult<PlannerSnapshot> {
        let tasks = self.backend.list_tasks()?;
        let focus_areas = self.backend.list_focus_areas()?;
        Ok(PlannerSnapshot::new(tasks, focus_areas))
    }

    fn commit(
        &mut self,
        mutation: &Mutation,
        state: &PlannerSnapshot,
    ) -> PersistResult<CommitOutcome> {
        let created_id = self.replay(mutation, state)?;
        let snapshot = self.load()?;
        debug!(
            "event=remote_reconcile module=persist status=ok tasks={} focus_areas={}",
            snapshot.tasks.len(),
            snapshot.focus_areas.len()
        );
        Ok(CommitOutcome::Reconciled {
            snapshot,
            created_id,
        })
    }
}
