//! Classification contract with the external vision service.
//!
//! The gateway translates an (image, step) pair into exactly one request
//! to the vision LLM and returns a shape-validated result. It is stateless
//! across calls and never retries internally; a failed call is surfaced to
//! the session, where the user re-triggers the same phase.

pub mod client;
pub mod prompts;
pub mod schema;

pub use client::{AnthropicVision, ClassifierGateway};
pub use schema::{CandidateType, ClassificationResult, ValidationStep};
