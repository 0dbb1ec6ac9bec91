//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a planner store from an optional JSON config path.
//! - Print a deterministic summary of focus areas and tasks.

use dayplanner_core::{core_version, PlannerConfig, TaskStore};
use log::info;
use std::process::ExitCode;

const DEFAULT_DATA_DIR: &str = "dayplanner-data";

fn main() -> ExitCode {
    let config = match std::env::args().nth(1) {
        Some(path) => match PlannerConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("dayplanner: {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => PlannerConfig::local(DEFAULT_DATA_DIR),
    };
    if let Err(err) = config.init_logging() {
        eprintln!("dayplanner: logging disabled: {err}");
    }

    let store = config.open_store();
    info!(
        "event=cli_summary module=cli status=ok mode={} tasks={}",
        store.mode(),
        store.tasks().len()
    );
    print_summary(&store);
    ExitCode::SUCCESS
}

fn print_summary(store: &TaskStore) {
    println!("dayplanner_core version={}", core_version());
    println!("mode={}", store.mode());
    println!(
        "tasks={} scheduled_dates={}",
        store.tasks().len(),
        store.snapshot().scheduled_date_count()
    );
    for area in store.focus_areas() {
        let tasks: Vec<_> = store
            .tasks()
            .iter()
            .filter(|task| task.focus_area == *area)
            .collect();
        let done = tasks.iter().filter(|task| task.completed).count();
        println!("{area}: {} tasks, {done} completed", tasks.len());
        for task in tasks.iter().filter(|task| task.sub_project_id.is_none()) {
            let marker = if task.is_sub_project { "+" } else { "-" };
            println!("  {marker} [{}] {}", task.id, task.name);
            for child in store
                .tasks()
                .iter()
                .filter(|child| child.sub_project_id == Some(task.id))
            {
                println!("      - [{}] {}", child.id, child.name);
            }
        }
    }
}
