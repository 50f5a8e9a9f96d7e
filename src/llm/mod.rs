//! Language-model orchestration: prompt building, the completion client,
//! and response extraction.

pub mod client;
pub mod extract;
pub mod prompt;

pub use client::{LlmClient, LlmConfig, LlmError};
pub use extract::{extract_candidates, Candidate};
pub use prompt::build_prompt;
