//! Board task type and its status lifecycle.
//!
//! # Invariants
//! - `id` is unique within a project
//! - Only `status` changes after construction, and only one column at a time

use serde::{Deserialize, Serialize};

/// Opaque task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kanban column of a task.
///
/// # Order
/// ```text
/// Todo <-> InProgress <-> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Board columns, left to right.
    pub const ORDER: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn index(self) -> usize {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }

    /// Neighbouring column in `direction`, clamped to the board edges.
    ///
    /// # Property
    /// `Done.step(Next) == Done` and `Todo.step(Prev) == Todo`
    pub fn step(self, direction: MoveDirection) -> TaskStatus {
        let index = match direction {
            MoveDirection::Next => (self.index() + 1).min(Self::ORDER.len() - 1),
            MoveDirection::Prev => self.index().saturating_sub(1),
        };
        Self::ORDER[index]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Normal,
    High,
}

/// Direction of a card move on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Next,
    Prev,
}

/// A card on the board.
///
/// Fields are private; everything except `status` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    hours_estimate: u64,
    status: TaskStatus,
    priority: TaskPriority,
}

impl Task {
    /// Create a fresh task in the `Todo` column.
    pub fn new(
        id: TaskId,
        title: String,
        description: String,
        hours_estimate: u64,
        priority: TaskPriority,
    ) -> Self {
        Self {
            id,
            title,
            description,
            hours_estimate,
            status: TaskStatus::Todo,
            priority,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hours_estimate(&self) -> u64 {
        self.hours_estimate
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority == TaskPriority::High
    }

    /// Move one column in `direction`.
    ///
    /// # Returns
    /// `true` if the status changed, `false` at a board edge.
    pub(crate) fn advance(&mut self, direction: MoveDirection) -> bool {
        let next = self.status.step(direction);
        if next == self.status {
            return false;
        }
        self.status = next;
        true
    }
}
