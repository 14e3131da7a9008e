//! Prompt templates for the two validation steps.
//!
//! These are external-service configuration, not logic: the templates pin
//! down the contract the schema relies on (Identify never asserts a
//! deposit, Confirm ignores bottle type) and are versioned so that a
//! behavior change in the wording is visible in logs and recorded output.

/// Version tag for the current prompt wording.
pub const PROMPT_VERSION: &str = "2025-08-01";

/// Instruction for the Identify step.
///
/// The model must decide whether the primary subject is a plastic bottle,
/// propose labels most-likely-first, and leave `isDepositConfirmed` false
/// no matter what else is visible in the frame.
const IDENTIFY_PROMPT: &str = "\
You are validating a photo for a recycling-rewards app. Determine whether \
the primary subject of the image is a plastic beverage bottle. If it is, \
list candidate type labels in order of likelihood: use the brand name \
(e.g. \"Coca-Cola\") when a recognizable brand mark is visible, otherwise \
a generic label such as \"Water Bottle\". Ignore any bin or container in \
the frame; deposit state is out of scope for this step, so \
isDepositConfirmed must always be false. Respond with only a JSON object \
of this exact shape and no other fields: \
{\"candidateTypes\": [{\"label\": \"...\"}], \"isTargetObject\": true|false, \
\"isDepositConfirmed\": false}. \
Omit candidateTypes or leave it empty when isTargetObject is false.";

/// Instruction for the Confirm step.
///
/// The model must decide only whether the image shows the action of
/// placing an item into a bin or container; bottle type is irrelevant.
const CONFIRM_PROMPT: &str = "\
You are validating a photo for a recycling-rewards app. Determine only \
whether the image shows the action of placing an item into a recycling \
bin or container. The type of bottle is irrelevant and must not influence \
your answer, so isTargetObject must always be false and candidateTypes \
must be omitted. Respond with only a JSON object of this exact shape and \
no other fields: \
{\"isTargetObject\": false, \"isDepositConfirmed\": true|false}.";

/// The prompt set consumed by the gateway for one service conversation.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// Version tag recorded alongside requests in debug logs
    pub version: &'static str,
    /// Identify-step instruction
    pub identify: &'static str,
    /// Confirm-step instruction
    pub confirm: &'static str,
}

impl PromptSet {
    /// The built-in prompt wording.
    pub fn builtin() -> Self {
        Self {
            version: PROMPT_VERSION,
            identify: IDENTIFY_PROMPT,
            confirm: CONFIRM_PROMPT,
        }
    }

    /// Instruction text for the given step.
    pub fn for_step(&self, step: crate::gateway::schema::ValidationStep) -> &'static str {
        match step {
            crate::gateway::schema::ValidationStep::Identify => self.identify,
            crate::gateway::schema::ValidationStep::Confirm => self.confirm,
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::schema::ValidationStep;

    #[test]
    fn test_identify_prompt_pins_deposit_false() {
        let prompts = PromptSet::builtin();
        assert!(prompts.identify.contains("isDepositConfirmed must always be false"));
        assert!(prompts.identify.contains("plastic beverage bottle"));
        assert!(prompts.identify.contains("Water Bottle"));
    }

    #[test]
    fn test_confirm_prompt_pins_target_false() {
        let prompts = PromptSet::builtin();
        assert!(prompts.confirm.contains("isTargetObject must always be false"));
        assert!(prompts.confirm.contains("placing an item into a recycling"));
        assert!(!prompts.confirm.contains("candidateTypes\": [{"));
    }

    #[test]
    fn test_for_step_selects_matching_template() {
        let prompts = PromptSet::builtin();
        assert_eq!(prompts.for_step(ValidationStep::Identify), prompts.identify);
        assert_eq!(prompts.for_step(ValidationStep::Confirm), prompts.confirm);
        assert_eq!(prompts.version, PROMPT_VERSION);
    }
}
