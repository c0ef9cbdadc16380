//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UnitPhase`: where a unit's pagination loop is (list fetch, parse, fan-out, done)
//! - `StopReason`: why a unit's loop reached `Done`

mod unit_phase;

// Re-export main types
pub use unit_phase::{StopReason, UnitPhase};
