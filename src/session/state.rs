//! Scan session state machine.
//!
//! A session walks Identifying → Confirming → Completed. Failure is an
//! overlay, not a phase: a failed or rejected step sets `last_error` and
//! leaves the phase unchanged, so the user retries the same step or
//! resets. Splitting "what is this" from "was it actually deposited"
//! forces the deposit to be a separate, freshly captured photographic
//! event; that is the anti-fraud property of the protocol.
//!
//! Concurrency is handled with an attempt token: `begin_attempt` marks a
//! classification in flight and snapshots the session generation;
//! `resolve` applies the outcome only if the generation still matches, so
//! a result arriving after a reset can never corrupt the new session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::schema::ValidationStep;
use crate::ledger::RecycledItem;

/// User-facing message when the Identify step saw no bottle.
pub const MSG_NOT_RECOGNIZED: &str = "No recyclable bottle was recognized. Try again with the bottle in view.";
/// User-facing message when the Confirm step saw no deposit action.
pub const MSG_DEPOSIT_NOT_CONFIRMED: &str = "Deposit was not confirmed. Capture the bottle going into the bin.";
/// User-facing message when the Identify-step classification itself failed.
pub const MSG_IDENTIFY_FAILED: &str = "Could not analyze the photo. Please try again.";
/// User-facing message when the Confirm-step classification itself failed.
pub const MSG_CONFIRM_FAILED: &str = "Could not verify the deposit. Please try again.";

/// Phase of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    /// Waiting for a frame that shows a recognizable bottle
    Identifying,
    /// Bottle identified; waiting for a frame that shows the deposit
    Confirming,
    /// Deposit confirmed and the item emitted; terminal for this session
    Completed,
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanPhase::Identifying => write!(f, "identifying"),
            ScanPhase::Confirming => write!(f, "confirming"),
            ScanPhase::Completed => write!(f, "completed"),
        }
    }
}

/// Semantic outcome of one classification call, already mapped to the
/// step it was made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Identify succeeded with at least one candidate label (the first one)
    Identified { label: String },
    /// Identify ran but the frame does not show a recognizable bottle
    NotRecognized,
    /// Confirm succeeded: the deposit action is visible
    DepositConfirmed,
    /// Confirm ran but the deposit action is not visible
    DepositNotConfirmed,
    /// The classification call itself failed
    Failed { message: String },
}

/// Token for one in-flight classification.
///
/// Snapshots the step and session generation at trigger time; `resolve`
/// refuses tokens whose generation no longer matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    step: ValidationStep,
    generation: u64,
}

impl Attempt {
    /// The validation step this attempt was begun for.
    pub fn step(&self) -> ValidationStep {
        self.step
    }
}

/// Ephemeral, client-local state for one capture interaction.
///
/// Created when the user begins a scan, mutated only through
/// [`begin_attempt`](Self::begin_attempt) / [`resolve`](Self::resolve) /
/// [`reset`](Self::reset), read-only to its presenter.
#[derive(Debug, Clone)]
pub struct ScanSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    phase: ScanPhase,
    detected_label: Option<String>,
    last_error: Option<String>,
    generation: u64,
    in_flight: bool,
}

impl ScanSession {
    /// Create a fresh session in the Identifying phase.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            phase: ScanPhase::Identifying,
            detected_label: None,
            last_error: None,
            generation: 0,
            in_flight: false,
        }
    }

    /// Unique session ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When this session was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current phase.
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Label captured during the Identify transition, if any.
    pub fn detected_label(&self) -> Option<&str> {
        self.detected_label.as_deref()
    }

    /// Last error overlay message, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a classification is currently outstanding.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Begin an attempt for the current phase.
    ///
    /// Refuses while another attempt is outstanding — the caller must
    /// disable its trigger until the pending call resolves — and refuses
    /// on a completed session, which only accepts [`reset`](Self::reset).
    pub fn begin_attempt(&mut self) -> crate::Result<Attempt> {
        if self.in_flight {
            return Err(crate::Error::Session(
                "a classification is already in flight".to_string(),
            ));
        }
        let step = match self.phase {
            ScanPhase::Identifying => ValidationStep::Identify,
            ScanPhase::Confirming => ValidationStep::Confirm,
            ScanPhase::Completed => {
                return Err(crate::Error::Session(
                    "session is complete; reset to scan another item".to_string(),
                ))
            }
        };
        self.in_flight = true;
        Ok(Attempt {
            step,
            generation: self.generation,
        })
    }

    /// Apply the outcome of an attempt.
    ///
    /// A stale token (the session was reset while the call was
    /// outstanding) is discarded without mutating the session. Returns the
    /// emitted item on the Confirming → Completed transition; the item's
    /// label is the one captured at Identify, never re-derived here.
    pub fn resolve(&mut self, attempt: &Attempt, outcome: StepOutcome) -> Option<RecycledItem> {
        if attempt.generation != self.generation {
            debug!(
                session = %self.id,
                step = %attempt.step,
                "Discarding stale classification result"
            );
            return None;
        }
        self.in_flight = false;

        match (self.phase, outcome) {
            (ScanPhase::Identifying, StepOutcome::Identified { label }) => {
                info!(session = %self.id, label = %label, "Bottle identified");
                self.detected_label = Some(label);
                self.last_error = None;
                self.phase = ScanPhase::Confirming;
                None
            }
            (ScanPhase::Identifying, StepOutcome::NotRecognized) => {
                self.last_error = Some(MSG_NOT_RECOGNIZED.to_string());
                None
            }
            (ScanPhase::Identifying, StepOutcome::Failed { message }) => {
                warn!(session = %self.id, error = %message, "Identify step failed");
                self.last_error = Some(MSG_IDENTIFY_FAILED.to_string());
                None
            }
            (ScanPhase::Confirming, StepOutcome::DepositConfirmed) => {
                // Confirming is only reachable through Identified, which
                // sets the label.
                let label = self.detected_label.clone().unwrap_or_default();
                info!(session = %self.id, label = %label, "Deposit confirmed");
                self.last_error = None;
                self.phase = ScanPhase::Completed;
                Some(RecycledItem::new(label))
            }
            (ScanPhase::Confirming, StepOutcome::DepositNotConfirmed) => {
                self.last_error = Some(MSG_DEPOSIT_NOT_CONFIRMED.to_string());
                None
            }
            (ScanPhase::Confirming, StepOutcome::Failed { message }) => {
                warn!(session = %self.id, error = %message, "Confirm step failed");
                self.last_error = Some(MSG_CONFIRM_FAILED.to_string());
                None
            }
            (phase, outcome) => {
                // Outcome from a step the session is no longer in; the
                // attempt token's step cannot disagree with the phase
                // unless the caller crossed sessions.
                warn!(session = %self.id, %phase, ?outcome, "Outcome does not match phase, ignoring");
                None
            }
        }
    }

    /// Reset to a pristine Identifying session.
    ///
    /// Valid from every phase; from Completed it functions as "scan
    /// another item". Bumps the generation so an outstanding call's
    /// eventual result cannot touch the new state. Idempotent.
    pub fn reset(&mut self) {
        debug!(session = %self.id, from = %self.phase, "Resetting session");
        self.phase = ScanPhase::Identifying;
        self.detected_label = None;
        self.last_error = None;
        self.generation += 1;
        self.in_flight = false;
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}
