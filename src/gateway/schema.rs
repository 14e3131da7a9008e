//! Wire types for classification requests and results.
//!
//! The service replies with free text containing a JSON object; parsing is
//! strict (unknown fields are rejected) and followed by a per-step
//! normalization pass that zeroes out the fields the step must not assert.
//! The prompts instruct the model to leave those fields false, but prompt
//! compliance is not trusted.

use serde::{Deserialize, Serialize};

/// Which of the two validation phases a classification request pertains to.
///
/// Exactly two steps exist; nothing else ever reaches the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStep {
    /// Determine whether the primary subject is a plastic bottle and
    /// produce a best-effort brand/type label.
    Identify,
    /// Determine only whether the image shows an item being placed into a
    /// bin or container.
    Confirm,
}

impl std::fmt::Display for ValidationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStep::Identify => write!(f, "identify"),
            ValidationStep::Confirm => write!(f, "confirm"),
        }
    }
}

/// A proposed brand/type label returned during the Identify step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CandidateType {
    /// Human-readable label, e.g. "Coca-Cola" or "Water Bottle"
    pub label: String,
}

/// Validated classification result.
///
/// Both booleans are always populated. `candidate_types` carries labels in
/// priority order; the first entry is authoritative, the rest are
/// discardable alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassificationResult {
    /// Candidate labels, most likely first. Empty unless the target object
    /// was recognized during Identify.
    #[serde(default)]
    pub candidate_types: Vec<CandidateType>,
    /// Whether the primary subject is a plastic bottle (Identify only)
    pub is_target_object: bool,
    /// Whether the deposit action is visible (Confirm only)
    pub is_deposit_confirmed: bool,
}

impl ClassificationResult {
    /// Parse a result from the raw JSON text the service produced.
    ///
    /// Any deviation from the expected shape is a parse failure.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        serde_json::from_str::<Self>(text)
            .map_err(|e| crate::Error::Service(format!("malformed classification result: {e}")))
    }

    /// Zero out the fields the given step must not assert.
    ///
    /// Identify never asserts a deposit; Confirm never asserts bottle type.
    /// The service is prompted to respect this, but the override makes the
    /// invariant hold locally regardless of what the model returned.
    pub fn normalized(mut self, step: ValidationStep) -> Self {
        match step {
            ValidationStep::Identify => {
                self.is_deposit_confirmed = false;
            }
            ValidationStep::Confirm => {
                self.is_target_object = false;
                self.candidate_types.clear();
            }
        }
        self
    }

    /// First candidate label, if any.
    pub fn primary_label(&self) -> Option<&str> {
        self.candidate_types.first().map(|c| c.label.as_str())
    }
}

/// Extract the JSON object embedded in a free-text model reply.
///
/// Vision models often wrap the JSON in prose or a markdown code fence;
/// the object is taken as the span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
