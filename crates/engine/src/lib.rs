//! Eligibility, catch validation, scoring and ranking for a multi-stage
//! fishing tournament.
//!
//! Everything here is a pure function over plain values: callers load the
//! records, call an operation, and persist what comes back. Clocks are passed
//! in explicitly.

pub mod capture;
pub mod editions;
pub mod eligibility;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod quota;
pub mod ranking;
pub mod rulers;
pub mod score;

#[cfg(test)]
mod fixtures;

pub use error::{EngineError, ErrorKind, Result};
pub use ranking::{Participant, StageRanking};
pub use rulers::{DrawMode, RulerAssignment};
pub use score::Score;
