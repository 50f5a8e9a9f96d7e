//! Model-response extraction
//!
//! Parses the completion text into candidate edit plans. A `clarify` reply
//! or unparseable content yields no candidates; a `candidates` array is
//! returned element by element, with schema failures kept as typed errors
//! so callers can log what the model actually sent instead of silently
//! dropping it.

use serde_json::Value;
use tracing::{info, warn};

use crate::plan::{EditPlan, PlanError};

/// One entry of the model's candidate list.
#[derive(Debug)]
pub enum Candidate {
    Plan(EditPlan),
    Invalid(PlanError),
}

/// Extract candidates from the raw completion text.
///
/// Any number of candidates is tolerated; callers index with `.get()` and
/// use only the slots they need.
pub fn extract_candidates(raw: &str) -> Vec<Candidate> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "model response was not valid JSON");
            return Vec::new();
        }
    };

    if let Some(question) = value.get("clarify").and_then(|c| c.as_str()) {
        info!(question, "model asked to clarify instead of editing");
        return Vec::new();
    }

    let candidates = match value.get("candidates").and_then(|c| c.as_array()) {
        Some(list) => list,
        None => {
            warn!("model response had neither candidates nor clarify");
            return Vec::new();
        }
    };

    candidates
        .iter()
        .map(|entry| match EditPlan::from_value(entry) {
            Ok(plan) => Candidate::Plan(plan),
            Err(e) => {
                warn!(error = %e, "rejecting malformed candidate");
                Candidate::Invalid(e)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_candidates() {
        let raw = r#"{"candidates":[
            {"action":"transpose","params":{"semitones":2}},
            {"action":"transpose","params":{"semitones":2}}
        ]}"#;
        let candidates = extract_candidates(raw);
        assert_eq!(candidates.len(), 2);
        assert!(matches!(&candidates[0], Candidate::Plan(p) if p.action == "transpose"));
    }

    #[test]
    fn test_single_candidate_is_fine() {
        let raw = r#"{"candidates":[{"action":"change_tempo","params":{"ratio":1.5}}]}"#;
        assert_eq!(extract_candidates(raw).len(), 1);
    }

    #[test]
    fn test_three_candidates_all_returned() {
        let raw = r#"{"candidates":[
            {"action":"transpose"},
            {"action":"transpose"},
            {"action":"transpose"}
        ]}"#;
        assert_eq!(extract_candidates(raw).len(), 3);
    }

    #[test]
    fn test_clarify_yields_empty() {
        assert!(extract_candidates(r#"{"clarify":"which measures?"}"#).is_empty());
    }

    #[test]
    fn test_non_json_yields_empty() {
        assert!(extract_candidates("Sure! Here is the plan:").is_empty());
    }

    #[test]
    fn test_empty_string_yields_empty() {
        assert!(extract_candidates("").is_empty());
    }

    #[test]
    fn test_missing_keys_yields_empty() {
        assert!(extract_candidates(r#"{"plans":[]}"#).is_empty());
    }

    #[test]
    fn test_malformed_candidate_kept_as_invalid() {
        let raw = r#"{"candidates":[
            {"action":"transpose","params":{}},
            "not a plan"
        ]}"#;
        let candidates = extract_candidates(raw);
        assert_eq!(candidates.len(), 2);
        assert!(matches!(&candidates[1], Candidate::Invalid(_)));
    }
}
