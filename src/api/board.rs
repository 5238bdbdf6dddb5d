//! Board and upload handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};

use crate::board::BoardSnapshot;
use crate::intake::{check_within_limit, ImageUpload, IntakeError};
use crate::service::AnalyzeError;
use crate::task::TaskId;

use super::routes::AppState;
use super::types::MoveTaskRequest;

/// Multipart field names accepted for the sketch.
const UPLOAD_FIELDS: [&str; 2] = ["file", "image"];

/// GET /api/board - Current snapshot.
pub(super) async fn get_board(State(state): State<Arc<AppState>>) -> Json<BoardSnapshot> {
    Json(state.service.snapshot().await)
}

/// POST /api/analyze - Upload a sketch and start the analysis.
///
/// Responds `202 Accepted` with the `analyzing` snapshot; poll `GET /api/board`
/// for the outcome. Intake problems are reported inline and leave the board
/// untouched. The type is checked from the part headers and the body is read
/// chunk by chunk, so a non-image or oversized file is refused without
/// buffering all of it.
pub(super) async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BoardSnapshot>), (StatusCode, String)> {
    let mut upload: Option<ImageUpload> = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), format!("Failed to read upload: {}", e.body_text())))?
    {
        if !field.name().is_some_and(|n| UPLOAD_FIELDS.contains(&n)) {
            continue;
        }
        let mut received = ImageUpload {
            file_name: field.file_name().map(|s| s.to_string()),
            content_type: field.content_type().map(|s| s.to_string()),
            bytes: Vec::new(),
        };
        received.check_type().map_err(|e| analyze_error(e.into()))?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| (e.status(), format!("Failed to read file: {}", e.body_text())))?
        {
            received.bytes.extend_from_slice(&chunk);
            check_within_limit(received.bytes.len()).map_err(|e| analyze_error(e.into()))?;
        }
        upload = Some(received);
        break;
    }

    let upload = upload.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "No file uploaded. Expected field 'file' or 'image'.".to_string(),
        )
    })?;

    let snapshot = state.service.submit(&upload).await.map_err(analyze_error)?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

fn analyze_error(err: AnalyzeError) -> (StatusCode, String) {
    let status = match &err {
        AnalyzeError::Intake(IntakeError::InvalidType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        AnalyzeError::Intake(IntakeError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        AnalyzeError::Intake(IntakeError::Empty) => StatusCode::BAD_REQUEST,
        AnalyzeError::Busy(_) => StatusCode::CONFLICT,
    };
    tracing::info!("Upload rejected ({}): {}", status, err);
    (status, err.to_string())
}

/// POST /api/board/tasks/:id/move - Move a card one column.
///
/// Unknown ids and board edges are silent no-ops; the snapshot is returned either way.
pub(super) async fn move_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MoveTaskRequest>,
) -> Json<BoardSnapshot> {
    Json(state.service.move_task(&TaskId::new(id), req.direction).await)
}

/// POST /api/board/reset - Back to the upload screen.
pub(super) async fn reset(State(state): State<Arc<AppState>>) -> Json<BoardSnapshot> {
    Json(state.service.reset().await)
}
