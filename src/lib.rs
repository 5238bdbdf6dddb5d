//! # FlowState
//!
//! Turns a photo of a whiteboard or strategy sketch into OKRs and a Kanban board.
//!
//! This library provides:
//! - Image intake (type/size validation, base64 encoding)
//! - A structured-extraction client for a multimodal model (Gemini)
//! - Normalization of the model output into a prioritized task list
//! - The session board state machine and a budget estimate
//! - An HTTP API for a browser front end
//!
//! ## Flow
//!
//! ```text
//!   upload ──► intake ──► extraction ──► normalize ──► board
//!                            │                          ▲
//!                            ▼                          │
//!                     Gemini generateContent      move / reset
//! ```
//!
//! ## Modules
//! - `intake`: upload validation and encoding
//! - `llm`: vision client trait and the Gemini implementation
//! - `extraction`: fixed prompt/schema contract and response parsing
//! - `task`: tasks, projects, and normalization
//! - `board`: session view state machine
//! - `budget`: hours and cost estimate
//! - `service`: the analysis pipeline over a shared board
//! - `api`: HTTP routes

pub mod api;
pub mod board;
pub mod budget;
pub mod config;
pub mod extraction;
pub mod intake;
pub mod llm;
pub mod service;
pub mod task;

pub use board::{BoardSnapshot, BoardState, SessionView};
pub use config::Config;
pub use service::AnalysisService;
