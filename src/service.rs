//! Analysis service: intake -> extraction -> normalization -> board.
//!
//! The board lock is never held across the extraction call. Results are
//! applied with the ticket taken at start, so a reset while a request is in
//! flight makes the late result a no-op.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::board::{AnalysisTicket, BoardError, BoardSnapshot, BoardState, SessionView};
use crate::extraction::Extractor;
use crate::intake::{encode_image, EncodedImage, ImageUpload, IntakeError};
use crate::task::{normalize, MoveDirection, TaskId};

/// Message shown on the error screen. Details go to the log only.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to analyze the image. Please try a clearer image or check your connection.";

pub type SharedBoard = Arc<RwLock<BoardState>>;

/// Reasons an upload is refused before any analysis starts.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("An analysis is already running or the board must be reset first ({0})")]
    Busy(#[from] BoardError),
}

/// An analysis that has left `Upload` and is waiting for its extraction.
#[derive(Debug)]
pub struct PendingAnalysis {
    pub ticket: AnalysisTicket,
    pub image: EncodedImage,
    /// Board as it was when the ticket was issued
    pub snapshot: BoardSnapshot,
}

#[derive(Clone)]
pub struct AnalysisService {
    board: SharedBoard,
    extractor: Extractor,
}

impl AnalysisService {
    pub fn new(board: SharedBoard, extractor: Extractor) -> Self {
        Self { board, extractor }
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.board.read().await.snapshot()
    }

    /// Validate the upload and move the board to `Analyzing`.
    ///
    /// The returned snapshot is taken under the same lock as the transition.
    /// Intake errors leave the board untouched.
    pub async fn begin(&self, upload: &ImageUpload) -> Result<PendingAnalysis, AnalyzeError> {
        let image = encode_image(upload)?;
        let (ticket, snapshot) = {
            let mut board = self.board.write().await;
            let ticket = board.start_analysis()?;
            (ticket, board.snapshot())
        };
        info!(
            generation = ticket.generation(),
            model = self.extractor.model(),
            mime = %image.mime_type,
            bytes = upload.bytes.len(),
            "Analysis started"
        );
        Ok(PendingAnalysis {
            ticket,
            image,
            snapshot,
        })
    }

    /// Run the extraction for a started analysis and apply the outcome.
    ///
    /// # Returns
    /// The board view after the outcome was applied (or ignored as stale).
    pub async fn finish(&self, pending: PendingAnalysis) -> SessionView {
        let PendingAnalysis { ticket, image, .. } = pending;
        let outcome = self.extractor.extract(&image).await;

        let mut board = self.board.write().await;
        let applied = match outcome {
            Ok(raw) => {
                let project = normalize(&raw);
                info!(
                    generation = ticket.generation(),
                    tasks = project.tasks().len(),
                    total_hours = project.total_hours(),
                    "Analysis complete"
                );
                board.complete_analysis(ticket, project)
            }
            Err(e) => {
                error!(generation = ticket.generation(), "Analysis failed: {}", e);
                board.fail_analysis(ticket, GENERIC_FAILURE_MESSAGE)
            }
        };

        if let Err(e) = applied {
            warn!("Discarding analysis outcome: {}", e);
        }
        board.view()
    }

    /// Analyze an upload and wait for the outcome.
    pub async fn analyze(&self, upload: &ImageUpload) -> Result<BoardSnapshot, AnalyzeError> {
        let pending = self.begin(upload).await?;
        self.finish(pending).await;
        Ok(self.snapshot().await)
    }

    /// Start an analysis in the background and return the `Analyzing` snapshot.
    pub async fn submit(&self, upload: &ImageUpload) -> Result<BoardSnapshot, AnalyzeError> {
        let pending = self.begin(upload).await?;
        let snapshot = pending.snapshot.clone();

        let service = self.clone();
        tokio::spawn(async move {
            service.finish(pending).await;
        });

        Ok(snapshot)
    }

    pub async fn move_task(&self, id: &TaskId, direction: MoveDirection) -> BoardSnapshot {
        let mut board = self.board.write().await;
        let moved = board.move_task(id, direction);
        debug!(task = %id, ?direction, moved, "Move task");
        board.snapshot()
    }

    pub async fn reset(&self) -> BoardSnapshot {
        let mut board = self.board.write().await;
        board.reset();
        info!(generation = board.generation(), "Board reset");
        board.snapshot()
    }
}
