// store/views.rs — read-only filter and progress helpers over a task snapshot.
//
// The HTTP API always serves the full list; these views back the CLI
// (`taskd tasks list --pending`, `taskd tasks summary`).

use super::Task;

/// Tasks not yet completed, in insertion order.
pub fn pending(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| !t.completed).collect()
}

/// Completed tasks, in insertion order.
pub fn completed(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| t.completed).collect()
}

/// Completion percentage: `round(100 * completed / total)`. 0 for an empty list.
pub fn progress_percent(tasks: &[Task]) -> u32 {
    if tasks.is_empty() {
        return 0;
    }
    let done = tasks.iter().filter(|t| t.completed).count();
    (100.0 * done as f64 / tasks.len() as f64).round() as u32
}
