//! Project: the objective, its key results, and the board's tasks.

use serde::{Deserialize, Serialize};

use super::task::{MoveDirection, Task, TaskId};

/// Result of one analysis, owned by the board for the lifetime of a session.
///
/// # Invariants
/// - Task ids are unique
/// - High-priority tasks precede normal ones at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    objective: String,
    key_results: Vec<String>,
    tasks: Vec<Task>,
}

impl Project {
    pub fn new(objective: String, key_results: Vec<String>, tasks: Vec<Task>) -> Self {
        Self {
            objective,
            key_results,
            tasks,
        }
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn key_results(&self) -> &[String] {
        &self.key_results
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// Sum of all hour estimates.
    pub fn total_hours(&self) -> u64 {
        self.tasks
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.hours_estimate()))
    }

    /// Move a task one column. Unknown ids and board edges are no-ops.
    pub(crate) fn move_task(&mut self, id: &TaskId, direction: MoveDirection) -> bool {
        self.tasks
            .iter_mut()
            .find(|t| t.id() == id)
            .map_or(false, |t| t.advance(direction))
    }
}
