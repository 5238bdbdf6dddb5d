//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::task::MoveDirection;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Request to move a card one column.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveTaskRequest {
    /// `next` or `prev`
    pub direction: MoveDirection,
}
