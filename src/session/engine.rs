//! Async driver for one scan session.
//!
//! The engine owns the session, a frame stream acquired once for the
//! engine's lifetime, and the gateway/ledger collaborators. Each user
//! trigger captures one still frame, runs one classification, and applies
//! the outcome; the emitted item, if any, is forwarded to the ledger
//! fire-and-forget.

use std::sync::Arc;
use tracing::{info, warn};

use crate::camera::{Camera, FrameStream};
use crate::gateway::client::ClassifierGateway;
use crate::gateway::schema::{ClassificationResult, ValidationStep};
use crate::ledger::{RecycledItem, RewardLedger};
use crate::session::state::{ScanSession, StepOutcome};

/// Truncate a label on a char boundary.
fn truncate_label(label: &str, max_chars: usize) -> String {
    label.chars().take(max_chars).collect()
}

/// Map a classification (or its failure) to the session event alphabet.
///
/// The first candidate label is authoritative; the rest are discardable
/// alternatives.
fn outcome_for(
    step: ValidationStep,
    result: crate::Result<ClassificationResult>,
    max_label_chars: usize,
) -> StepOutcome {
    match (step, result) {
        (ValidationStep::Identify, Ok(result)) => {
            match (result.is_target_object, result.primary_label()) {
                (true, Some(label)) => StepOutcome::Identified {
                    label: truncate_label(label, max_label_chars),
                },
                _ => StepOutcome::NotRecognized,
            }
        }
        (ValidationStep::Confirm, Ok(result)) => {
            if result.is_deposit_confirmed {
                StepOutcome::DepositConfirmed
            } else {
                StepOutcome::DepositNotConfirmed
            }
        }
        (_, Err(e)) => StepOutcome::Failed {
            message: e.to_string(),
        },
    }
}

/// Drives one scan session against real collaborators.
pub struct ScanEngine {
    session: ScanSession,
    stream: Box<dyn FrameStream>,
    gateway: Arc<dyn ClassifierGateway>,
    ledger: Arc<dyn RewardLedger>,
    max_label_chars: usize,
}

impl ScanEngine {
    /// Acquire the camera stream and start a fresh session.
    ///
    /// The stream is held until the engine is dropped, success or failure.
    pub async fn start(
        camera: &dyn Camera,
        gateway: Arc<dyn ClassifierGateway>,
        ledger: Arc<dyn RewardLedger>,
        max_label_chars: usize,
    ) -> crate::Result<Self> {
        let stream = camera.acquire_stream().await?;
        let session = ScanSession::new();
        info!(session = %session.id(), "Scan session started");
        Ok(Self {
            session,
            stream,
            gateway,
            ledger,
            max_label_chars,
        })
    }

    /// Current session state, read-only to the presenter.
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Handle one user trigger: capture, classify, transition.
    ///
    /// Returns the recorded item when this trigger completed the session.
    /// Semantic rejections (no bottle, no deposit) are not errors: the
    /// session keeps its phase with `last_error` set and `Ok(None)` is
    /// returned. Only begin-attempt violations (double trigger, completed
    /// session) and capture failures surface as `Err`, and even those
    /// leave the session retryable.
    pub async fn trigger(&mut self) -> crate::Result<Option<RecycledItem>> {
        let attempt = self.session.begin_attempt()?;
        let step = attempt.step();

        let frame = match self.stream.capture_still_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(session = %self.session.id(), step = %step, error = %e, "Frame capture failed");
                self.session.resolve(
                    &attempt,
                    StepOutcome::Failed {
                        message: e.to_string(),
                    },
                );
                return Err(e);
            }
        };

        let result = self.gateway.classify(&frame, step).await;
        let outcome = outcome_for(step, result, self.max_label_chars);
        let emitted = self.session.resolve(&attempt, outcome);

        if let Some(item) = &emitted {
            self.ledger.record_item(item.clone(), 0).await;
        }
        Ok(emitted)
    }

    /// Reset the session; from Completed this starts "scan another item".
    pub fn reset(&mut self) {
        self.session.reset();
    }
}
