//! Board module - the session's view state and the project it displays.

mod state;

pub use state::{AnalysisTicket, BoardError, BoardSnapshot, BoardState, SessionView};
