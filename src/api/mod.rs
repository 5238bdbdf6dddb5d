//! HTTP API for FlowState.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/board` - Current board snapshot (poll while `analyzing`)
//! - `POST /api/analyze` - Upload a sketch (multipart field `file` or `image`)
//! - `POST /api/board/tasks/:id/move` - Move a task to the next/previous column
//! - `POST /api/board/reset` - Discard the board and return to the upload screen

mod board;
mod routes;
pub mod types;

pub use routes::{build_router, serve, AppState};
pub use types::*;
