//! Scan session state machine and its async driver.
//!
//! [`state`] is the pure core: phases, outcomes, and transitions with no
//! I/O and no rendering concerns. [`engine`] ties the camera, the
//! classifier gateway, and the reward ledger around one session.

pub mod engine;
pub mod state;

pub use engine::ScanEngine;
pub use state::{Attempt, ScanPhase, ScanSession, StepOutcome};
