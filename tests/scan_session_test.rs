//! Scan Session Integration Tests
//!
//! Exercises the full validation workflow through the public API:
//! - Two-step happy path (Identify -> Confirm -> item recorded)
//! - Semantic rejections and gateway failures as retryable overlays
//! - Reset semantics, including reset racing an outstanding call
//! - File-backed camera and ledger collaborators end to end

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bottle_scan::camera::{Camera, FileCamera, Frame, FrameStream};
use bottle_scan::gateway::schema::{CandidateType, ClassificationResult, ValidationStep};
use bottle_scan::ledger::{JsonlLedger, RecycledItem, RewardLedger};
use bottle_scan::session::engine::ScanEngine;
use bottle_scan::session::state::{ScanPhase, ScanSession, StepOutcome};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

/// Classification result recognizing a bottle with the given labels
fn bottle(labels: &[&str]) -> ClassificationResult {
    ClassificationResult {
        candidate_types: labels
            .iter()
            .map(|l| CandidateType { label: l.to_string() })
            .collect(),
        is_target_object: true,
        is_deposit_confirmed: false,
    }
}

/// Classification result that recognizes nothing
fn no_bottle() -> ClassificationResult {
    ClassificationResult {
        candidate_types: Vec::new(),
        is_target_object: false,
        is_deposit_confirmed: false,
    }
}

/// Confirm-step result with the given deposit verdict
fn deposit(confirmed: bool) -> ClassificationResult {
    ClassificationResult {
        candidate_types: Vec::new(),
        is_target_object: false,
        is_deposit_confirmed: confirmed,
    }
}

/// Gateway replaying a scripted sequence of results, recording the steps
/// it was called with
struct ScriptedGateway {
    script: Mutex<Vec<bottle_scan::Result<ClassificationResult>>>,
    steps_seen: Mutex<Vec<ValidationStep>>,
}

impl ScriptedGateway {
    fn new(script: Vec<bottle_scan::Result<ClassificationResult>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            steps_seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl bottle_scan::ClassifierGateway for ScriptedGateway {
    async fn classify(
        &self,
        frame: &Frame,
        step: ValidationStep,
    ) -> bottle_scan::Result<ClassificationResult> {
        frame.ensure_valid()?;
        self.steps_seen.lock().unwrap().push(step);
        self.script.lock().unwrap().remove(0)
    }
}

/// In-memory ledger capturing every recorded item
#[derive(Default)]
struct CapturingLedger {
    items: Mutex<Vec<RecycledItem>>,
}

#[async_trait]
impl RewardLedger for CapturingLedger {
    async fn record_item(&self, item: RecycledItem, _size: u32) {
        self.items.lock().unwrap().push(item);
    }
}

/// Camera producing an in-memory JPEG frame on every capture
struct LoopCamera;

struct LoopStream;

#[async_trait]
impl Camera for LoopCamera {
    async fn acquire_stream(&self) -> bottle_scan::Result<Box<dyn FrameStream>> {
        Ok(Box::new(LoopStream))
    }
}

#[async_trait]
impl FrameStream for LoopStream {
    async fn capture_still_frame(&mut self) -> bottle_scan::Result<Frame> {
        Ok(Frame::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg"))
    }
}

async fn engine_with(
    gateway: Arc<ScriptedGateway>,
    ledger: Arc<CapturingLedger>,
) -> ScanEngine {
    ScanEngine::start(&LoopCamera, gateway, ledger, 120)
        .await
        .expect("loop camera always acquires")
}

// ============================================================================
// End-to-End Workflow
// ============================================================================

#[tokio::test]
async fn test_two_step_scan_records_item_with_identify_label() {
    let gateway = ScriptedGateway::new(vec![
        Ok(bottle(&["Coca-Cola", "Soda Bottle"])),
        Ok(deposit(true)),
    ]);
    let ledger = Arc::new(CapturingLedger::default());
    let mut engine = engine_with(gateway.clone(), ledger.clone()).await;

    assert!(engine.trigger().await.unwrap().is_none());
    assert_eq!(engine.session().phase(), ScanPhase::Confirming);
    assert_eq!(engine.session().detected_label(), Some("Coca-Cola"));

    let item = engine.trigger().await.unwrap().expect("scan completed");
    assert_eq!(item.label, "Coca-Cola");
    assert_eq!(engine.session().phase(), ScanPhase::Completed);

    // Exactly one item, labeled from the Identify step, never re-derived
    let items = ledger.items.lock().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "Coca-Cola");

    // The gateway saw exactly one request per step, in protocol order
    let steps = gateway.steps_seen.lock().unwrap();
    assert_eq!(*steps, vec![ValidationStep::Identify, ValidationStep::Confirm]);
}

#[tokio::test]
async fn test_first_candidate_label_is_authoritative() {
    let gateway = ScriptedGateway::new(vec![Ok(bottle(&["Water Bottle", "Sprite", "7up"]))]);
    let ledger = Arc::new(CapturingLedger::default());
    let mut engine = engine_with(gateway, ledger).await;

    engine.trigger().await.unwrap();
    assert_eq!(engine.session().detected_label(), Some("Water Bottle"));
}

#[tokio::test]
async fn test_rejection_then_retry_then_completion() {
    let gateway = ScriptedGateway::new(vec![
        Ok(no_bottle()),                 // first identify attempt rejected
        Ok(bottle(&["Water Bottle"])),   // retry succeeds
        Ok(deposit(false)),              // first confirm attempt rejected
        Ok(deposit(true)),               // retry succeeds
    ]);
    let ledger = Arc::new(CapturingLedger::default());
    let mut engine = engine_with(gateway, ledger.clone()).await;

    engine.trigger().await.unwrap();
    assert_eq!(engine.session().phase(), ScanPhase::Identifying);
    assert!(engine.session().last_error().is_some());
    assert!(engine.session().detected_label().is_none());

    engine.trigger().await.unwrap();
    assert_eq!(engine.session().phase(), ScanPhase::Confirming);
    assert!(engine.session().last_error().is_none());

    engine.trigger().await.unwrap();
    assert_eq!(engine.session().phase(), ScanPhase::Confirming);
    assert!(engine.session().last_error().is_some());
    // Label survives a failed confirmation for the retry
    assert_eq!(engine.session().detected_label(), Some("Water Bottle"));

    let item = engine.trigger().await.unwrap().expect("retry completed the scan");
    assert_eq!(item.label, "Water Bottle");
    assert_eq!(ledger.items.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_gateway_failure_never_records_an_item() {
    let gateway = ScriptedGateway::new(vec![
        Err(bottle_scan::Error::Service("timed out".to_string())),
    ]);
    let ledger = Arc::new(CapturingLedger::default());
    let mut engine = engine_with(gateway, ledger.clone()).await;

    engine.trigger().await.unwrap();
    assert_eq!(engine.session().phase(), ScanPhase::Identifying);
    assert!(engine.session().last_error().is_some());
    assert!(ledger.items.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_after_completion_scans_another_item() {
    let gateway = ScriptedGateway::new(vec![
        Ok(bottle(&["Coca-Cola"])),
        Ok(deposit(true)),
        Ok(bottle(&["Fanta"])),
        Ok(deposit(true)),
    ]);
    let ledger = Arc::new(CapturingLedger::default());
    let mut engine = engine_with(gateway, ledger.clone()).await;

    engine.trigger().await.unwrap();
    engine.trigger().await.unwrap();
    assert_eq!(engine.session().phase(), ScanPhase::Completed);

    engine.reset();
    assert_eq!(engine.session().phase(), ScanPhase::Identifying);
    assert!(engine.session().detected_label().is_none());

    engine.trigger().await.unwrap();
    engine.trigger().await.unwrap();

    let items = ledger.items.lock().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].label, "Coca-Cola");
    assert_eq!(items[1].label, "Fanta");
}

// ============================================================================
// Generation Guard
// ============================================================================

#[tokio::test]
async fn test_reset_during_outstanding_call_discards_late_result() {
    // Modeled at the session level, where the outstanding call is an
    // explicit attempt token.
    let mut session = ScanSession::new();
    let attempt = session.begin_attempt().unwrap();

    session.reset();

    let emitted = session.resolve(
        &attempt,
        StepOutcome::Identified { label: "Coca-Cola".to_string() },
    );
    assert!(emitted.is_none());
    assert_eq!(session.phase(), ScanPhase::Identifying);
    assert!(session.detected_label().is_none());
    assert!(session.last_error().is_none());

    // The new session is fully usable
    let attempt = session.begin_attempt().unwrap();
    session.resolve(&attempt, StepOutcome::Identified { label: "Pepsi".to_string() });
    assert_eq!(session.detected_label(), Some("Pepsi"));
}

#[tokio::test]
async fn test_stale_deposit_confirmation_credits_nothing() {
    let mut session = ScanSession::new();
    let attempt = session.begin_attempt().unwrap();
    session.resolve(&attempt, StepOutcome::Identified { label: "Sprite".to_string() });

    let confirm = session.begin_attempt().unwrap();
    session.reset();

    assert!(session.resolve(&confirm, StepOutcome::DepositConfirmed).is_none());
    assert_eq!(session.phase(), ScanPhase::Identifying);
}

// ============================================================================
// File-Backed Collaborators
// ============================================================================

#[tokio::test]
async fn test_scan_over_image_files_with_jsonl_ledger() {
    let dir = TempDir::new().unwrap();
    let identify_img = dir.path().join("bottle.jpg");
    let confirm_img = dir.path().join("deposit.jpg");
    std::fs::write(&identify_img, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
    std::fs::write(&confirm_img, [0xFF, 0xD8, 0xFF, 0xE1]).unwrap();

    let camera = FileCamera::new(vec![identify_img, confirm_img]);
    let gateway = ScriptedGateway::new(vec![
        Ok(bottle(&["Water Bottle"])),
        Ok(deposit(true)),
    ]);
    let ledger_path = dir.path().join("items.jsonl");
    let ledger = Arc::new(JsonlLedger::new(&ledger_path));

    let mut engine = ScanEngine::start(&camera, gateway, ledger.clone(), 120)
        .await
        .unwrap();
    engine.trigger().await.unwrap();
    let item = engine.trigger().await.unwrap().expect("scan completed");
    assert_eq!(item.label, "Water Bottle");

    // The item landed in the ledger file
    let recorded = ledger.load().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].label, "Water Bottle");
}

#[tokio::test]
async fn test_missing_image_file_blocks_session_start() {
    let camera = FileCamera::new(vec![std::path::PathBuf::from("/nonexistent/bottle.jpg")]);
    let gateway = ScriptedGateway::new(vec![]);
    let ledger = Arc::new(CapturingLedger::default());

    let result = ScanEngine::start(&camera, gateway, ledger, 120).await;
    assert!(matches!(result, Err(bottle_scan::Error::Permission(_))));
}
