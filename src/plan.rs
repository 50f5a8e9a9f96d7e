//! Edit plans and plan application
//!
//! An edit plan is the structured object the model returns: one main
//! action, its parameters, and an ordered list of secondary actions.
//! Application threads the score through each action in turn. Unknown
//! action names are handled per the configured policy: `Skip` logs and
//! moves on (but a plan that applies nothing still fails), `Reject` fails
//! the plan outright.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::actions::{ActionError, ActionKind, Params};
use crate::score::Score;

/// What to do when the model names an action outside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownActionPolicy {
    /// Log a warning and skip the offending action.
    #[default]
    Skip,
    /// Fail the whole plan.
    Reject,
}

impl UnknownActionPolicy {
    pub fn from_name(name: &str) -> Option<UnknownActionPolicy> {
        match name.trim().to_ascii_lowercase().as_str() {
            "skip" => Some(UnknownActionPolicy::Skip),
            "reject" => Some(UnknownActionPolicy::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PlanError {
    #[error("malformed plan: {0}")]
    Malformed(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("no recognized action in plan")]
    NothingApplied,

    #[error(transparent)]
    Action(#[from] ActionError),
}

/// One action plus parameters, as used for secondary actions.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanStep {
    pub action: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// A full edit plan: main action, parameters, ordered secondary actions.
///
/// Extra fields the model likes to add (`id`, `target`, `musicxml_preview`,
/// `error`) are tolerated and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct EditPlan {
    pub action: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub secondary_actions: Vec<PlanStep>,
}

impl EditPlan {
    /// Deserialize a plan from a JSON value, rejecting non-objects and
    /// objects without an `action` field.
    pub fn from_value(value: &Value) -> Result<EditPlan, PlanError> {
        if !value.is_object() {
            return Err(PlanError::Malformed(format!(
                "candidate is not an object: {}",
                value
            )));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| PlanError::Malformed(e.to_string()))
    }

    /// The main step followed by the secondary steps, in application order.
    fn steps(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        std::iter::once((self.action.as_str(), &self.params)).chain(
            self.secondary_actions
                .iter()
                .map(|s| (s.action.as_str(), &s.params)),
        )
    }
}

/// Apply a plan to a score, threading the working score through the main
/// action and then each secondary action in order.
///
/// Returns an error if any applied action fails, or if no step named a
/// recognized action at all (an unchanged score is not a useful edit).
pub fn apply_plan(
    plan: &EditPlan,
    score: Score,
    policy: UnknownActionPolicy,
) -> Result<Score, PlanError> {
    let mut working = score;
    let mut applied = 0usize;

    for (name, params) in plan.steps() {
        match ActionKind::from_name(name) {
            Some(kind) => {
                working = kind.apply(working, &Params::new(params))?;
                applied += 1;
            }
            None => match policy {
                UnknownActionPolicy::Reject => {
                    return Err(PlanError::UnknownAction(name.to_string()));
                }
                UnknownActionPolicy::Skip => {
                    warn!(action = name, "skipping unrecognized action");
                }
            },
        }
    }

    if applied == 0 {
        return Err(PlanError::NothingApplied);
    }
    Ok(working)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parse::parse_score;
    use serde_json::json;

    const C_MAJOR_MEASURE: &str = r#"<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name>Music</part-name></score-part></part-list>
  <part id="P1"><measure number="1">
    <attributes><divisions>4</divisions><key><fifths>0</fifths></key></attributes>
    <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration><type>quarter</type></note>
  </measure></part>
</score-partwise>"#;

    fn plan(value: Value) -> EditPlan {
        EditPlan::from_value(&value).unwrap()
    }

    #[test]
    fn test_plan_deserialization_tolerates_extras() {
        let p = plan(json!({
            "id": "v1",
            "target": {"measures": [1], "voices": ["melody"]},
            "action": "transpose",
            "params": {"semitones": 2},
            "musicxml_preview": null,
            "error": null
        }));
        assert_eq!(p.action, "transpose");
        assert!(p.secondary_actions.is_empty());
    }

    #[test]
    fn test_plan_without_action_is_malformed() {
        let result = EditPlan::from_value(&json!({"params": {}}));
        assert!(matches!(result, Err(PlanError::Malformed(_))));
    }

    #[test]
    fn test_non_object_candidate_is_malformed() {
        let result = EditPlan::from_value(&json!("transpose"));
        assert!(matches!(result, Err(PlanError::Malformed(_))));
    }

    #[test]
    fn test_apply_main_and_secondary_in_order() {
        let score = parse_score(C_MAJOR_MEASURE).unwrap();
        let p = plan(json!({
            "action": "transpose",
            "params": {"semitones": 2},
            "secondary_actions": [
                {"action": "repeat_segment", "params": {"times": 2}}
            ]
        }));
        let mut result = apply_plan(&p, score, UnknownActionPolicy::Skip).unwrap();
        // Transposed first, then doubled.
        assert_eq!(result.parts[0].measures.len(), 2);
        assert_eq!(result.notes_mut().count(), 2);
    }

    #[test]
    fn test_unknown_main_action_skip_policy_still_applies_secondaries() {
        let score = parse_score(C_MAJOR_MEASURE).unwrap();
        let p = plan(json!({
            "action": "add_swing",
            "params": {},
            "secondary_actions": [
                {"action": "transpose", "params": {"semitones": 1}}
            ]
        }));
        let result = apply_plan(&p, score, UnknownActionPolicy::Skip);
        assert!(result.is_ok());
    }

    #[test]
    fn test_all_unknown_actions_yield_nothing_applied() {
        let score = parse_score(C_MAJOR_MEASURE).unwrap();
        let p = plan(json!({"action": "add_swing", "params": {}}));
        let result = apply_plan(&p, score, UnknownActionPolicy::Skip);
        assert!(matches!(result, Err(PlanError::NothingApplied)));
    }

    #[test]
    fn test_reject_policy_fails_fast() {
        let score = parse_score(C_MAJOR_MEASURE).unwrap();
        let p = plan(json!({
            "action": "add_swing",
            "params": {},
            "secondary_actions": [
                {"action": "transpose", "params": {"semitones": 1}}
            ]
        }));
        let result = apply_plan(&p, score, UnknownActionPolicy::Reject);
        assert!(matches!(result, Err(PlanError::UnknownAction(_))));
    }

    #[test]
    fn test_action_error_propagates() {
        let score = parse_score(C_MAJOR_MEASURE).unwrap();
        let p = plan(json!({"action": "repeat_segment", "params": {"times": 0}}));
        let result = apply_plan(&p, score, UnknownActionPolicy::Skip);
        assert!(matches!(result, Err(PlanError::Action(_))));
    }

    #[test]
    fn test_policy_from_name() {
        assert_eq!(UnknownActionPolicy::from_name("skip"), Some(UnknownActionPolicy::Skip));
        assert_eq!(UnknownActionPolicy::from_name("REJECT"), Some(UnknownActionPolicy::Reject));
        assert_eq!(UnknownActionPolicy::from_name("maybe"), None);
    }
}
