//! Per-source, per-logical-id activation tracking.

pub mod source;
pub mod state;

pub use source::{SourceArena, SourceId, SourceRecord};
pub use state::{ButtonEventState, ButtonStates, FireGate, Transition};
