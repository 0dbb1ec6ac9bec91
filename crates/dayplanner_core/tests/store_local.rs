use dayplanner_core::{
    BlobStorage, FileBlobStorage, LocalStrategy, MemoryBlobStorage, NewTask, PersistenceMode,
    StoreError, StoreEvent, TaskId, TaskPatch, TaskStore, DEFAULT_STORAGE_KEY,
};

fn local_store() -> (TaskStore, MemoryBlobStorage) {
    let storage = MemoryBlobStorage::new();
    let store = TaskStore::with_strategy(Box::new(LocalStrategy::with_default_key(
        storage.clone(),
    )));
    (store, storage)
}

fn add(store: &mut TaskStore, name: &str, focus_area: &str) -> TaskId {
    store.add_task(NewTask::new(name, focus_area)).unwrap()
}

fn names(store: &TaskStore) -> Vec<&str> {
    store.tasks().iter().map(|task| task.name.as_str()).collect()
}

#[test]
fn end_to_end_scenario_builds_one_level_hierarchy() {
    let (mut store, _) = local_store();
    assert_eq!(store.mode(), PersistenceMode::Local);

    assert!(store.add_focus_area("Work"));
    let report = add(&mut store, "Report", "Work");
    let q1 = store.add_sub_project("Q1", "Work").unwrap();
    let draft = store
        .add_task(NewTask::new("Draft", "Work").under(q1))
        .unwrap();

    assert_eq!(store.tasks().len(), 3);
    assert_eq!(store.focus_areas(), ["Work"]);
    assert_eq!((report, q1, draft), (1, 2, 3));

    let q1_task = store.task(q1).unwrap();
    assert!(q1_task.is_sub_project);
    assert_eq!(q1_task.sub_project_id, None);
    assert_eq!(store.task(draft).unwrap().sub_project_id, Some(q1));
    assert!(!store.task(report).unwrap().is_sub_project);
}

#[test]
fn focus_areas_survive_removal_of_their_last_task() {
    let (mut store, _) = local_store();

    let id = add(&mut store, "Report", "Work");
    assert_eq!(store.focus_areas(), ["Work"]);

    assert!(store.remove_task(id));
    assert!(store.tasks().is_empty());
    assert_eq!(store.focus_areas(), ["Work"]);

    assert!(store.remove_focus_area("Work"));
    assert!(store.snapshot().is_empty());
}

#[test]
fn add_focus_area_ignores_blank_and_duplicate_names() {
    let (mut store, _) = local_store();

    assert!(store.add_focus_area("  Work  "));
    assert!(!store.add_focus_area("Work"));
    assert!(!store.add_focus_area("   "));
    assert!(store.add_focus_area("work"));

    assert_eq!(store.focus_areas(), ["Work", "work"]);
}

#[test]
fn add_task_requires_name_and_focus_area() {
    let (mut store, _) = local_store();

    assert_eq!(store.add_task(NewTask::new(" ", "Work")), None);
    assert_eq!(store.add_task(NewTask::new("Report", "  ")), None);
    assert!(store.snapshot().is_empty());

    let id = add(&mut store, "  Report  ", " Work ");
    let task = store.task(id).unwrap();
    assert_eq!(task.name, "Report");
    assert_eq!(task.focus_area, "Work");
}

#[test]
fn adding_a_child_promotes_a_plain_parent() {
    let (mut store, _) = local_store();
    let parent = add(&mut store, "Launch", "Work");

    let child = store
        .add_task(NewTask::new("Press kit", "Work").under(parent))
        .unwrap();

    assert!(store.task(parent).unwrap().is_sub_project);
    assert_eq!(store.task(child).unwrap().sub_project_id, Some(parent));
}

#[test]
fn nested_and_dangling_parents_are_dropped() {
    let (mut store, _) = local_store();
    let q1 = store.add_sub_project("Q1", "Work").unwrap();
    let child = store.add_task(NewTask::new("Draft", "Work").under(q1)).unwrap();

    let nested = store
        .add_task(NewTask::new("Deeper", "Work").under(child))
        .unwrap();
    assert_eq!(store.task(nested).unwrap().sub_project_id, None);
    assert!(!store.task(child).unwrap().is_sub_project);

    let dangling = store
        .add_task(NewTask::new("Orphan", "Work").under(99))
        .unwrap();
    assert_eq!(store.task(dangling).unwrap().sub_project_id, None);
}

#[test]
fn sub_project_with_children_cannot_be_nested_by_update() {
    let (mut store, _) = local_store();
    let q2 = store.add_sub_project("Q2", "Work").unwrap();
    let q1 = store.add_sub_project("Q1", "Work").unwrap();
    let draft = store.add_task(NewTask::new("Draft", "Work").under(q1)).unwrap();

    store
        .update_task(
            q1,
            TaskPatch {
                sub_project_id: Some(Some(q2)),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(store.task(q1).unwrap().sub_project_id, None);

    assert!(store.remove_task(q2));
    assert_eq!(names(&store), ["Q1", "Draft"]);
    assert_eq!(store.task(draft).unwrap().sub_project_id, Some(q1));
    for task in store.tasks() {
        if let Some(parent) = task.sub_project_id {
            assert!(store.task(parent).is_some(), "{} has a dangling parent", task.name);
        }
    }
}

#[test]
fn update_cannot_nest_sub_projects_or_parents() {
    let (mut store, _) = local_store();
    let q1 = store.add_sub_project("Q1", "Work").unwrap();
    let empty = store.add_sub_project("Someday", "Work").unwrap();
    let launch = add(&mut store, "Launch", "Work");
    let plain = add(&mut store, "Report", "Work");
    store.add_task(NewTask::new("Press kit", "Work").under(launch)).unwrap();
    store
        .update_task(
            launch,
            TaskPatch {
                is_sub_project: Some(false),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    let under_q1 = TaskPatch {
        sub_project_id: Some(Some(q1)),
        ..TaskPatch::default()
    };
    store.update_task(empty, under_q1.clone()).unwrap();
    store.update_task(launch, under_q1.clone()).unwrap();
    store
        .update_task(
            plain,
            TaskPatch {
                is_sub_project: Some(true),
                ..under_q1
            },
        )
        .unwrap();

    assert_eq!(store.task(empty).unwrap().sub_project_id, None);
    assert_eq!(store.task(launch).unwrap().sub_project_id, None);
    let plain = store.task(plain).unwrap();
    assert_eq!(plain.sub_project_id, None);
    assert!(plain.is_sub_project);
}

#[test]
fn reorder_tasks_moves_within_group_and_is_not_self_inverse() {
    let (mut store, _) = local_store();
    let a = add(&mut store, "A", "Work");
    let b = add(&mut store, "B", "Work");
    let c = add(&mut store, "C", "Work");

    assert!(store.reorder_tasks(a, c));
    assert_eq!(names(&store), ["B", "C", "A"]);
    let orders: Vec<i64> = store.tasks().iter().map(|task| task.sort_order).collect();
    assert_eq!(orders, [0, 1, 2]);

    assert!(store.reorder_tasks(c, a));
    assert_eq!(names(&store), ["B", "A", "C"]);

    assert!(store.reorder_tasks(a, b));
    assert_eq!(names(&store), ["A", "B", "C"]);
}

#[test]
fn reorder_across_groups_is_a_noop() {
    let (mut store, _) = local_store();
    let work = add(&mut store, "Report", "Work");
    let home = add(&mut store, "Laundry", "Home");
    let q1 = store.add_sub_project("Q1", "Work").unwrap();
    let child = store.add_task(NewTask::new("Draft", "Work").under(q1)).unwrap();
    let revision = store.revision();

    assert!(!store.reorder_tasks(work, home));
    assert!(!store.reorder_tasks(work, q1));
    assert!(!store.reorder_tasks(work, child));
    assert!(!store.reorder_tasks(work, work));
    assert!(!store.reorder_tasks(work, 404));
    assert!(!store.reorder_sub_projects(q1, work));

    assert_eq!(names(&store), ["Report", "Laundry", "Q1", "Draft"]);
    assert_eq!(store.revision(), revision);
}

#[test]
fn reorder_sub_projects_within_focus_area() {
    let (mut store, _) = local_store();
    let q1 = store.add_sub_project("Q1", "Work").unwrap();
    add(&mut store, "Report", "Work");
    let q2 = store.add_sub_project("Q2", "Work").unwrap();
    let other = store.add_sub_project("Garden", "Home").unwrap();

    assert!(store.reorder_sub_projects(q2, q1));
    assert_eq!(names(&store), ["Q2", "Q1", "Report", "Garden"]);
    assert!(!store.reorder_sub_projects(q1, other));
}

#[test]
fn reorder_focus_areas_uses_move_semantics() {
    let (mut store, _) = local_store();
    for name in ["Work", "Home", "Health"] {
        store.add_focus_area(name);
    }

    assert!(store.reorder_focus_areas("Work", "Health"));
    assert_eq!(store.focus_areas(), ["Home", "Health", "Work"]);
    assert!(store.reorder_focus_areas("Work", "Home"));
    assert_eq!(store.focus_areas(), ["Work", "Home", "Health"]);

    assert!(!store.reorder_focus_areas("Work", "Work"));
    assert!(!store.reorder_focus_areas("Work", "Missing"));
}

#[test]
fn schedule_task_is_idempotent() {
    let (mut store, _) = local_store();
    let id = add(&mut store, "Report", "Work");

    assert!(store.schedule_task(id, "2024-05-01"));
    assert!(!store.schedule_task(id, " 2024-05-01 "));
    assert!(store.schedule_task(id, "2024-05-02"));

    assert_eq!(
        store.task(id).unwrap().scheduled_dates,
        ["2024-05-01", "2024-05-02"]
    );
}

#[test]
fn schedule_task_checks_shape_only() {
    let (mut store, _) = local_store();
    let id = add(&mut store, "Report", "Work");

    assert!(store.schedule_task(id, "2024-13-40"));
    assert!(!store.schedule_task(id, "2024-1-4"));
    assert!(!store.schedule_task(id, "tomorrow"));
    assert!(!store.schedule_task(404, "2024-05-01"));

    assert_eq!(store.task(id).unwrap().scheduled_dates, ["2024-13-40"]);
}

#[test]
fn schedule_and_complete_marks_completed_in_one_event() {
    let (mut store, _) = local_store();
    let id = add(&mut store, "Report", "Work");
    store.schedule_task(id, "2024-05-01");
    let events = store.subscribe();

    assert!(store.schedule_and_complete_task(id, "2024-05-01"));

    let task = store.task(id).unwrap();
    assert!(task.completed);
    assert_eq!(task.scheduled_dates, ["2024-05-01"]);
    assert_eq!(events.try_iter().count(), 1);
    assert!(!store.schedule_and_complete_task(id, "2024-5-1"));
}

#[test]
fn removing_focus_area_cascades_its_tasks() {
    let (mut store, _) = local_store();
    let plan = store.add_sub_project("Plan", "Work").unwrap();
    store.add_task(NewTask::new("Draft", "Work").under(plan)).unwrap();
    store.add_task(NewTask::new("Review", "Work").under(plan)).unwrap();
    for name in ["Laundry", "Groceries", "Dishes"] {
        add(&mut store, name, "Home");
    }
    assert_eq!(store.tasks().len(), 6);

    assert!(store.remove_focus_area(" Work "));

    assert_eq!(names(&store), ["Laundry", "Groceries", "Dishes"]);
    assert!(store.tasks().iter().all(|task| task.focus_area != "Work"));
    assert_eq!(store.focus_areas(), ["Home"]);
    assert!(!store.remove_focus_area("  "));
}

#[test]
fn removing_sub_project_cascades_to_children() {
    let (mut store, _) = local_store();
    let q1 = store.add_sub_project("Q1", "Work").unwrap();
    let draft = store.add_task(NewTask::new("Draft", "Work").under(q1)).unwrap();
    store.add_task(NewTask::new("Review", "Work").under(q1)).unwrap();
    add(&mut store, "Report", "Work");

    assert!(store.remove_task(draft));
    assert_eq!(names(&store), ["Q1", "Review", "Report"]);

    assert!(store.remove_task(q1));
    assert_eq!(names(&store), ["Report"]);
    assert!(!store.remove_task(q1));
}

#[test]
fn removing_a_parent_that_lost_its_flag_clears_child_references() {
    let (mut store, _) = local_store();
    let parent = add(&mut store, "Launch", "Work");
    let child = store
        .add_task(NewTask::new("Press kit", "Work").under(parent))
        .unwrap();
    store
        .update_task(
            parent,
            TaskPatch {
                is_sub_project: Some(false),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    assert!(store.remove_task(parent));
    assert_eq!(store.task(child).unwrap().sub_project_id, None);
}

#[test]
fn update_task_merges_provided_fields() {
    let (mut store, _) = local_store();
    let id = add(&mut store, "Report", "Work");
    store.schedule_task(id, "2024-05-01");

    store
        .update_task(
            id,
            TaskPatch {
                name: Some("  Final report ".to_string()),
                focus_area: Some("Writing".to_string()),
                completed: Some(true),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    let task = store.task(id).unwrap();
    assert_eq!(task.name, "Final report");
    assert_eq!(task.focus_area, "Writing");
    assert!(task.completed);
    assert_eq!(task.scheduled_dates, ["2024-05-01"]);
    assert_eq!(store.focus_areas(), ["Work", "Writing"]);

    store
        .update_task(
            id,
            TaskPatch {
                name: Some("   ".to_string()),
                scheduled_dates: Some(vec![
                    "2024-06-01".to_string(),
                    "2024-06-01".to_string(),
                    "June".to_string(),
                ]),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    let task = store.task(id).unwrap();
    assert_eq!(task.name, "Final report");
    assert_eq!(task.scheduled_dates, ["2024-06-01"]);
}

#[test]
fn update_task_attaches_and_detaches_parent() {
    let (mut store, _) = local_store();
    let parent = add(&mut store, "Launch", "Work");
    let id = add(&mut store, "Press kit", "Work");

    store
        .update_task(
            id,
            TaskPatch {
                sub_project_id: Some(Some(parent)),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert!(store.task(parent).unwrap().is_sub_project);
    assert_eq!(store.task(id).unwrap().sub_project_id, Some(parent));

    store
        .update_task(
            id,
            TaskPatch {
                sub_project_id: Some(Some(id)),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(store.task(id).unwrap().sub_project_id, Some(parent));

    store
        .update_task(
            id,
            TaskPatch {
                sub_project_id: Some(None),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(store.task(id).unwrap().sub_project_id, None);
}

#[test]
fn update_unknown_task_fails_with_not_found() {
    let (mut store, _) = local_store();
    let revision = store.revision();

    let err = store.update_task(7, TaskPatch::default()).unwrap_err();

    assert!(matches!(err, StoreError::TaskNotFound(7)));
    assert_eq!(store.revision(), revision);
}

#[test]
fn subscribers_see_each_completed_mutation() {
    let (mut store, _) = local_store();
    let events = store.subscribe();
    let dropped = store.subscribe();
    drop(dropped);

    store.add_focus_area("Work");
    store.add_focus_area("Work");
    add(&mut store, "Report", "Work");

    let received: Vec<StoreEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        [
            StoreEvent {
                revision: 1,
                operation: "add_focus_area",
            },
            StoreEvent {
                revision: 2,
                operation: "add_task",
            },
        ]
    );
}

#[test]
fn every_mutation_rewrites_the_blob() {
    let (mut store, storage) = local_store();
    let id = add(&mut store, "Report", "Work");
    store.schedule_task(id, "2024-05-01");

    let mut reopened = TaskStore::with_strategy(Box::new(LocalStrategy::with_default_key(
        storage.clone(),
    )));
    assert_eq!(reopened.snapshot(), store.snapshot());

    store.remove_task(id);
    reopened.reload().unwrap();
    assert!(reopened.tasks().is_empty());
    assert_eq!(reopened.focus_areas(), ["Work"]);
}

#[test]
fn legacy_singular_date_is_migrated_on_load() {
    let mut storage = MemoryBlobStorage::new();
    storage
        .write(
            DEFAULT_STORAGE_KEY,
            r#"{
                "tasks": [
                    {"id": 4, "name": "Report", "focusArea": "Work", "scheduledDate": "2024-03-01"},
                    {"id": 9, "name": "Laundry", "focusArea": "Home", "scheduledDates": null}
                ],
                "focusAreas": ["Work", "Home"]
            }"#,
        )
        .unwrap();

    let mut store = TaskStore::with_strategy(Box::new(LocalStrategy::with_default_key(
        storage.clone(),
    )));
    assert_eq!(store.task(4).unwrap().scheduled_dates, ["2024-03-01"]);
    assert!(store.task(9).unwrap().scheduled_dates.is_empty());

    let next = add(&mut store, "Draft", "Work");
    assert_eq!(next, 10);

    let raw = storage.read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert!(raw.contains("\"scheduledDates\""));
    assert!(!raw.contains("\"scheduledDate\""));
}

#[test]
fn malformed_blob_starts_empty() {
    let mut storage = MemoryBlobStorage::new();
    storage.write(DEFAULT_STORAGE_KEY, "{not json").unwrap();

    let store = TaskStore::with_strategy(Box::new(LocalStrategy::with_default_key(storage)));

    assert!(store.snapshot().is_empty());
}

#[test]
fn file_storage_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let open = || {
        TaskStore::with_strategy(Box::new(LocalStrategy::new(
            FileBlobStorage::new(dir.path()),
            "planner",
        )))
    };

    let mut first = open();
    let q1 = first.add_sub_project("Q1", "Work").unwrap();
    first.add_task(NewTask::new("Draft", "Work").under(q1)).unwrap();
    drop(first);

    let second = open();
    assert_eq!(names(&second), ["Q1", "Draft"]);
    assert_eq!(second.task(2).unwrap().sub_project_id, Some(q1));
    assert!(dir.path().join("planner.json").exists());
}
