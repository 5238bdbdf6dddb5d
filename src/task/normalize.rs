//! Maps the raw extraction JSON into a [`Project`].
//!
//! The model is asked for a strict schema but may still omit fields, so every
//! field is read through an explicit presence check with a literal default.

use serde_json::Value;
use uuid::Uuid;

use super::project::Project;
use super::task::{Task, TaskId, TaskPriority};

pub const UNTITLED_OBJECTIVE: &str = "Untitled Objective";

/// Substrings (lowercase) that flag a task as high priority.
const HIGH_PRIORITY_KEYWORDS: [&str; 2] = ["marketing", "influencer"];

/// Hands out task ids for one normalization run.
///
/// Ids look like `task-<unix-millis>-<uuid>-<index>`; the random v4 segment
/// keeps two runs in the same millisecond apart.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    prefix: String,
}

impl IdAllocator {
    pub fn new() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self {
            prefix: format!("task-{}-{}", millis, Uuid::new_v4().simple()),
        }
    }

    /// Fixed prefix, for deterministic ids in tests.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn id(&self, index: usize) -> TaskId {
        TaskId::new(format!("{}-{}", self.prefix, index))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Priority heuristic: keyword match on lowercase `"{title} {description}"`.
pub fn priority_for(title: &str, description: &str) -> TaskPriority {
    let text = format!("{} {}", title, description).to_lowercase();
    if HIGH_PRIORITY_KEYWORDS.iter().any(|k| text.contains(k)) {
        TaskPriority::High
    } else {
        TaskPriority::Normal
    }
}

/// Normalize with freshly allocated ids.
pub fn normalize(raw: &Value) -> Project {
    normalize_with(raw, &IdAllocator::new())
}

/// Normalize a raw extraction object into a project.
///
/// # Postconditions
/// - Every task has `status == Todo`
/// - High-priority tasks come first; order within each priority group is preserved
pub fn normalize_with(raw: &Value, ids: &IdAllocator) -> Project {
    let objective = raw
        .get("objective")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNTITLED_OBJECTIVE)
        .to_string();

    let key_results = raw
        .get("keyResults")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let tasks: Vec<Task> = raw
        .get("tasks")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| task_from_raw(item, ids.id(index)))
                .collect()
        })
        .unwrap_or_default();

    Project::new(objective, key_results, high_priority_first(tasks))
}

fn task_from_raw(item: &Value, id: TaskId) -> Task {
    let title = string_field(item, "title");
    let description = string_field(item, "description");
    let hours = hours_field(item);
    let priority = priority_for(&title, &description);
    Task::new(id, title, description, hours, priority)
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Hours as a non-negative integer. Fractions round; negatives and junk become 0.
fn hours_field(item: &Value) -> u64 {
    let hours = match item.get("hours") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match hours {
        Some(h) if h.is_finite() && h > 0.0 => h.round() as u64,
        _ => 0,
    }
}

/// Stable partition: all high-priority tasks, then all normal ones.
fn high_priority_first(tasks: Vec<Task>) -> Vec<Task> {
    let (mut high, normal): (Vec<Task>, Vec<Task>) =
        tasks.into_iter().partition(Task::is_high_priority);
    high.extend(normal);
    high
}
