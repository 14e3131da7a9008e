//! # Bottle Scan
//!
//! The validation core of a recycling-rewards app: a camera frame is sent
//! to a vision LLM for classification, and a two-phase protocol decides
//! whether the user has earned a reward.
//!
//! ## Overview
//!
//! A scan is a short session with two photographic events:
//!
//! 1. **Identify** — is the primary subject a plastic bottle, and what
//!    kind? The first candidate label becomes the session's detected label.
//! 2. **Confirm** — does a freshly captured frame show the bottle being
//!    placed into a recycling receptacle?
//!
//! Only after both steps succeed is a recycled item handed to the reward
//! ledger. Requiring the deposit as a separate, freshly captured event is
//! the anti-fraud property of the whole workflow: a single ambiguous photo
//! is never enough to claim a reward.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bottle_scan::session::state::{ScanSession, StepOutcome};
//!
//! let mut session = ScanSession::new();
//! let attempt = session.begin_attempt().expect("fresh session accepts a scan");
//! let emitted = session.resolve(&attempt, StepOutcome::Identified {
//!     label: "Coca-Cola".to_string(),
//! });
//! assert!(emitted.is_none()); // nothing is recorded until the deposit is confirmed
//! ```
//!
//! ## Architecture
//!
//! - [`gateway`]: classification contract with the vision service
//! - [`session`]: the scan state machine and its async driver
//! - [`camera`]: frame acquisition seam
//! - [`ledger`]: reward ledger seam
//! - [`app`]: CLI and configuration management
//!
//! ## Scan Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Camera    │───▶│  Classifier │───▶│    Scan     │───▶│   Reward    │
//! │   (frame)   │    │   Gateway   │    │   Session   │    │   Ledger    │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//! ```

pub mod gateway;
pub mod session;
pub mod camera;
pub mod ledger;
pub mod app;

// Re-export commonly used types
pub use camera::{Camera, Frame, FrameStream};
pub use gateway::client::ClassifierGateway;
pub use gateway::schema::{ClassificationResult, ValidationStep};
pub use ledger::{RecycledItem, RewardLedger};
pub use session::engine::ScanEngine;
pub use session::state::{ScanPhase, ScanSession, StepOutcome};

/// Result type alias for the bottle scanner
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the bottle scanner
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Camera permission error: {0}")]
    Permission(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Classifier service error: {0}")]
    Service(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
