//! Session state machine for one board.
//!
//! # State Machine
//! ```text
//! Upload --start--> Analyzing --complete--> Dashboard
//!                            \--fail------> Error
//! (any) --reset--> Upload
//! ```
//!
//! # Invariants
//! - `view == Dashboard` <=> `project.is_some()`
//! - `error.is_some()` only in `Error`
//! - `generation` increases on every start and reset; completions carrying an
//!   older generation are rejected

use serde::{Deserialize, Serialize};

use crate::budget::{BudgetEstimate, DEFAULT_HOURLY_RATE};
use crate::task::{MoveDirection, Project, TaskId};

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionView {
    Upload,
    Analyzing,
    Dashboard,
    Error,
}

impl std::fmt::Display for SessionView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionView::Upload => "upload",
            SessionView::Analyzing => "analyzing",
            SessionView::Dashboard => "dashboard",
            SessionView::Error => "error",
        };
        f.write_str(name)
    }
}

/// Proof that an analysis was started at a given board generation.
///
/// Only the holder of the current ticket can finish the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    generation: u64,
}

impl AnalysisTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Invalid board transition from {from} to {to}")]
    InvalidTransition { from: SessionView, to: SessionView },

    #[error("Stale analysis result (generation {ticket}, board is at {current})")]
    StaleAnalysis { ticket: u64, current: u64 },
}

/// Read-only view of the board handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub view: SessionView,
    pub project: Option<Project>,
    pub error: Option<String>,
    /// Present only on the dashboard
    pub budget: Option<BudgetEstimate>,
}

/// The single owned session state.
#[derive(Debug, Clone)]
pub struct BoardState {
    view: SessionView,
    project: Option<Project>,
    error: Option<String>,
    generation: u64,
    hourly_rate: u64,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(DEFAULT_HOURLY_RATE)
    }
}

impl BoardState {
    /// Fresh board on the upload screen.
    pub fn new(hourly_rate: u64) -> Self {
        Self {
            view: SessionView::Upload,
            project: None,
            error: None,
            generation: 0,
            hourly_rate,
        }
    }

    pub fn view(&self) -> SessionView {
        self.view
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Upload -> Analyzing.
    ///
    /// # Errors
    /// `InvalidTransition` from any other view (an analysis is in flight, or
    /// the board must be reset first).
    pub fn start_analysis(&mut self) -> Result<AnalysisTicket, BoardError> {
        if self.view != SessionView::Upload {
            return Err(BoardError::InvalidTransition {
                from: self.view,
                to: SessionView::Analyzing,
            });
        }
        self.generation += 1;
        self.view = SessionView::Analyzing;
        self.project = None;
        self.error = None;
        Ok(AnalysisTicket {
            generation: self.generation,
        })
    }

    /// Analyzing -> Dashboard, installing `project`.
    ///
    /// # Errors
    /// `StaleAnalysis` if the ticket is outdated or no analysis is pending.
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        project: Project,
    ) -> Result<(), BoardError> {
        self.check_ticket(ticket)?;
        self.view = SessionView::Dashboard;
        self.project = Some(project);
        self.error = None;
        Ok(())
    }

    /// Analyzing -> Error, recording `message` and clearing any project.
    ///
    /// # Errors
    /// `StaleAnalysis` if the ticket is outdated or no analysis is pending.
    pub fn fail_analysis(
        &mut self,
        ticket: AnalysisTicket,
        message: impl Into<String>,
    ) -> Result<(), BoardError> {
        self.check_ticket(ticket)?;
        self.view = SessionView::Error;
        self.project = None;
        self.error = Some(message.into());
        Ok(())
    }

    /// Any view -> Upload. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.view = SessionView::Upload;
        self.project = None;
        self.error = None;
    }

    /// Move a task one column in `direction`.
    ///
    /// Unknown ids, board edges and boards without a project are no-ops.
    ///
    /// # Returns
    /// `true` if a status changed.
    pub fn move_task(&mut self, id: &TaskId, direction: MoveDirection) -> bool {
        if self.view != SessionView::Dashboard {
            return false;
        }
        self.project
            .as_mut()
            .map_or(false, |p| p.move_task(id, direction))
    }

    pub fn budget(&self) -> Option<BudgetEstimate> {
        match (self.view, &self.project) {
            (SessionView::Dashboard, Some(project)) => {
                Some(BudgetEstimate::for_project(project, self.hourly_rate))
            }
            _ => None,
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            view: self.view,
            project: self.project.clone(),
            error: self.error.clone(),
            budget: self.budget(),
        }
    }

    fn check_ticket(&self, ticket: AnalysisTicket) -> Result<(), BoardError> {
        if ticket.generation != self.generation || self.view != SessionView::Analyzing {
            return Err(BoardError::StaleAnalysis {
                ticket: ticket.generation,
                current: self.generation,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{normalize_with, IdAllocator, TaskStatus};
    use serde_json::json;

    fn project() -> Project {
        normalize_with(
            &json!({
                "objective": "Grow Q3 revenue",
                "keyResults": ["A", "B", "C"],
                "tasks": [
                    {"title": "Launch influencer campaign", "description": "", "hours": 8},
                    {"title": "Fix bug", "description": "", "hours": 3}
                ]
            }),
            &IdAllocator::with_prefix("task-0"),
        )
    }

    fn dashboard() -> (BoardState, TaskId) {
        let mut board = BoardState::default();
        let ticket = board.start_analysis().unwrap();
        board.complete_analysis(ticket, project()).unwrap();
        let id = board.project().unwrap().tasks()[1].id().clone();
        (board, id)
    }

    fn status_of(board: &BoardState, id: &TaskId) -> TaskStatus {
        board.project().unwrap().task(id).unwrap().status()
    }

    #[test]
    fn test_initial_state() {
        let board = BoardState::default();
        assert_eq!(board.view(), SessionView::Upload);
        assert!(board.project().is_none());
        assert!(board.error().is_none());
        assert!(board.budget().is_none());
    }

    #[test]
    fn test_happy_path_to_dashboard() {
        let (board, _) = dashboard();
        assert_eq!(board.view(), SessionView::Dashboard);
        assert_eq!(board.project().unwrap().objective(), "Grow Q3 revenue");
        assert_eq!(board.budget().unwrap().total_cost, 1650);
    }

    #[test]
    fn test_fail_clears_project_and_records_message() {
        let mut board = BoardState::default();
        let ticket = board.start_analysis().unwrap();
        board.fail_analysis(ticket, "boom").unwrap();
        assert_eq!(board.view(), SessionView::Error);
        assert_eq!(board.error(), Some("boom"));
        assert!(board.project().is_none());
        assert!(board.snapshot().budget.is_none());
    }

    #[test]
    fn test_start_only_from_upload() {
        let mut board = BoardState::default();
        board.start_analysis().unwrap();
        assert_eq!(
            board.start_analysis(),
            Err(BoardError::InvalidTransition {
                from: SessionView::Analyzing,
                to: SessionView::Analyzing
            })
        );

        let (mut board, _) = dashboard();
        assert!(board.start_analysis().is_err());
        board.reset();
        assert!(board.start_analysis().is_ok());
    }

    #[test]
    fn test_reset_from_every_view() {
        let mut upload = BoardState::default();
        let mut analyzing = BoardState::default();
        analyzing.start_analysis().unwrap();
        let (mut dash, _) = dashboard();
        let mut error = BoardState::default();
        let ticket = error.start_analysis().unwrap();
        error.fail_analysis(ticket, "nope").unwrap();

        for board in [&mut upload, &mut analyzing, &mut dash, &mut error] {
            board.reset();
            assert_eq!(
                board.snapshot(),
                BoardSnapshot {
                    view: SessionView::Upload,
                    project: None,
                    error: None,
                    budget: None,
                }
            );
        }
    }

    #[test]
    fn test_stale_completion_after_reset_is_rejected() {
        let mut board = BoardState::default();
        let ticket = board.start_analysis().unwrap();
        board.reset();

        let err = board.complete_analysis(ticket, project()).unwrap_err();
        assert!(matches!(err, BoardError::StaleAnalysis { .. }));
        assert_eq!(board.view(), SessionView::Upload);
        assert!(board.project().is_none());
    }

    #[test]
    fn test_old_ticket_cannot_finish_newer_analysis() {
        let mut board = BoardState::default();
        let old = board.start_analysis().unwrap();
        board.reset();
        let current = board.start_analysis().unwrap();
        assert_ne!(old, current);

        assert!(board.fail_analysis(old, "late failure").is_err());
        assert_eq!(board.view(), SessionView::Analyzing);
        assert!(board.complete_analysis(current, project()).is_ok());
    }

    #[test]
    fn test_ticket_single_use() {
        let mut board = BoardState::default();
        let ticket = board.start_analysis().unwrap();
        board.complete_analysis(ticket, project()).unwrap();
        assert!(board.fail_analysis(ticket, "again").is_err());
        assert_eq!(board.view(), SessionView::Dashboard);
    }

    #[test]
    fn test_move_task_walks_columns() {
        let (mut board, id) = dashboard();

        assert!(!board.move_task(&id, MoveDirection::Prev));
        assert_eq!(status_of(&board, &id), TaskStatus::Todo);

        assert!(board.move_task(&id, MoveDirection::Next));
        assert_eq!(status_of(&board, &id), TaskStatus::InProgress);

        assert!(board.move_task(&id, MoveDirection::Next));
        assert!(!board.move_task(&id, MoveDirection::Next));
        assert_eq!(status_of(&board, &id), TaskStatus::Done);

        assert!(board.move_task(&id, MoveDirection::Prev));
        assert_eq!(status_of(&board, &id), TaskStatus::InProgress);
    }

    #[test]
    fn test_move_task_touches_only_status() {
        let (mut board, id) = dashboard();
        let before = board.project().unwrap().clone();
        board.move_task(&id, MoveDirection::Next);

        let after = board.project().unwrap();
        assert_eq!(after.tasks().len(), before.tasks().len());
        for (a, b) in after.tasks().iter().zip(before.tasks()) {
            assert_eq!(a.id(), b.id());
            assert_eq!(a.title(), b.title());
            assert_eq!(a.hours_estimate(), b.hours_estimate());
            assert_eq!(a.priority(), b.priority());
        }
    }

    #[test]
    fn test_move_unknown_task_is_noop() {
        let (mut board, _) = dashboard();
        let before = board.snapshot();
        assert!(!board.move_task(&TaskId::from("missing"), MoveDirection::Next));
        assert_eq!(board.snapshot(), before);
    }

    #[test]
    fn test_move_without_project_is_noop() {
        let mut board = BoardState::default();
        assert!(!board.move_task(&TaskId::from("task-0-0"), MoveDirection::Next));
    }

    #[test]
    fn test_snapshot_wire_format() {
        let (board, _) = dashboard();
        let json = serde_json::to_value(board.snapshot()).unwrap();
        assert_eq!(json["view"], "dashboard");
        assert_eq!(json["project"]["keyResults"][2], "C");
        assert_eq!(json["project"]["tasks"][0]["priority"], "high");
        assert_eq!(json["budget"]["totalCost"], 1650);
        assert!(json["error"].is_null());
    }
}
