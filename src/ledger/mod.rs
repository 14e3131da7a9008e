//! Reward ledger seam.
//!
//! Completing a scan emits one [`RecycledItem`] to the ledger
//! collaborator. The handoff is fire-and-forget from the session's
//! perspective: ledger durability is owned elsewhere, and a ledger failure
//! never fails the session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A validated recycling event, ready for reward crediting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycledItem {
    /// Label captured during the Identify step
    pub label: String,
    /// When the deposit was confirmed
    pub recorded_at: DateTime<Utc>,
}

impl RecycledItem {
    /// Create an item recorded at the current time.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// The account/ledger collaborator that credits rewards.
#[async_trait]
pub trait RewardLedger: Send + Sync {
    /// Record one recycled item. `size` is a placeholder the upstream
    /// ledger interface requires; it is currently unused and always 0.
    async fn record_item(&self, item: RecycledItem, size: u32);
}

/// File-backed ledger appending one JSON line per item.
///
/// This is the CLI's stand-in for the real account service; the line
/// format is the serialized [`RecycledItem`].
pub struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    /// Create a ledger writing to the given file, creating parent
    /// directories on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, item: &RecycledItem) -> crate::Result<()> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(item)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read back all recorded items, skipping unparsable lines.
    pub fn load(&self) -> crate::Result<Vec<RecycledItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }
}

#[async_trait]
impl RewardLedger for JsonlLedger {
    async fn record_item(&self, item: RecycledItem, _size: u32) {
        match self.append(&item) {
            Ok(()) => info!(label = %item.label, "Recorded recycled item"),
            Err(e) => warn!(label = %item.label, error = %e, "Failed to record recycled item"),
        }
    }
}
