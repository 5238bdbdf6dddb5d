//! Budget estimate derived from a project's hour estimates.
//!
//! # Invariants
//! - `total_cost == total_hours * hourly_rate` (saturating)
//! - `columns` covers every status exactly once, in board order

use serde::{Deserialize, Serialize};

use crate::task::{Project, TaskStatus};

/// Default billing rate, in whole currency units per hour.
pub const DEFAULT_HOURLY_RATE: u64 = 150;

/// Per-column totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
    pub status: TaskStatus,
    pub task_count: usize,
    pub hours: u64,
}

/// Cost and workload summary for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEstimate {
    pub total_hours: u64,
    pub hourly_rate: u64,
    pub total_cost: u64,
    pub columns: Vec<ColumnSummary>,
}

impl BudgetEstimate {
    /// Estimate the budget for `project` at `hourly_rate`.
    pub fn for_project(project: &Project, hourly_rate: u64) -> Self {
        let total_hours = project.total_hours();

        let columns = TaskStatus::ORDER
            .iter()
            .map(|&status| {
                let (task_count, hours) = project
                    .tasks()
                    .iter()
                    .filter(|t| t.status() == status)
                    .fold((0usize, 0u64), |(count, hours), t| {
                        (count + 1, hours.saturating_add(t.hours_estimate()))
                    });
                ColumnSummary {
                    status,
                    task_count,
                    hours,
                }
            })
            .collect();

        Self {
            total_hours,
            hourly_rate,
            total_cost: total_hours.saturating_mul(hourly_rate),
            columns,
        }
    }

    pub fn column(&self, status: TaskStatus) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.status == status)
    }
}
