//! Task module - board tasks, the project they belong to, and normalization
//! of raw extraction output.
//!
//! - Types are plain data with private fields; status is the only mutable part
//! - Normalization is a pure function of the raw JSON (plus id allocation)

pub mod normalize;
mod project;
pub mod task;

pub use normalize::{normalize, normalize_with, priority_for, IdAllocator, UNTITLED_OBJECTIVE};
pub use project::Project;
pub use task::{MoveDirection, Task, TaskId, TaskPriority, TaskStatus};
