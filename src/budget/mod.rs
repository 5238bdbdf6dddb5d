//! Budget module - derived cost of a project.
//!
//! # Key Concepts
//! - Estimate: total hours × hourly rate
//! - Columns: task count and hours per board column

mod estimate;

pub use estimate::{BudgetEstimate, ColumnSummary, DEFAULT_HOURLY_RATE};
