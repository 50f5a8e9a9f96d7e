//! Edit actions
//!
//! The nine named score transformations the model is allowed to request,
//! behind one dispatch point. Every action has the same contract: it
//! consumes the working score and returns the (possibly rebuilt) score, so
//! callers never need to know which actions restructure and which tweak in
//! place.

mod expression_ops;
mod pitch_ops;
mod time_ops;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::score::Score;

#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("invalid parameter for {action}: {message}")]
    InvalidParameter { action: &'static str, message: String },
}

/// The fixed action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Transpose,
    ChangeTempo,
    AdjustRhythm,
    ModifyDynamics,
    AddArticulation,
    ChangeMode,
    AddChordTone,
    RepeatSegment,
    AddSeventhChords,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::Transpose,
        ActionKind::ChangeTempo,
        ActionKind::AdjustRhythm,
        ActionKind::ModifyDynamics,
        ActionKind::AddArticulation,
        ActionKind::ChangeMode,
        ActionKind::AddChordTone,
        ActionKind::RepeatSegment,
        ActionKind::AddSeventhChords,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Transpose => "transpose",
            ActionKind::ChangeTempo => "change_tempo",
            ActionKind::AdjustRhythm => "adjust_rhythm",
            ActionKind::ModifyDynamics => "modify_dynamics",
            ActionKind::AddArticulation => "add_articulation",
            ActionKind::ChangeMode => "change_mode",
            ActionKind::AddChordTone => "add_chord_tone",
            ActionKind::RepeatSegment => "repeat_segment",
            ActionKind::AddSeventhChords => "add_seventh_chords",
        }
    }

    /// Look up an action by name. Whitespace is stripped first, so
    /// `"change tempo"` resolves like `"change_tempo"` does.
    pub fn from_name(name: &str) -> Option<ActionKind> {
        let normalized: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
    }

    /// Apply this action to a score.
    pub fn apply(self, score: Score, params: &Params) -> Result<Score, ActionError> {
        match self {
            ActionKind::Transpose => pitch_ops::transpose(score, params),
            ActionKind::ChangeTempo => time_ops::change_tempo(score, params),
            ActionKind::AdjustRhythm => time_ops::adjust_rhythm(score, params),
            ActionKind::ModifyDynamics => expression_ops::modify_dynamics(score, params),
            ActionKind::AddArticulation => expression_ops::add_articulation(score, params),
            ActionKind::ChangeMode => pitch_ops::change_mode(score, params),
            ActionKind::AddChordTone => pitch_ops::add_chord_tone(score, params),
            ActionKind::RepeatSegment => time_ops::repeat_segment(score, params),
            ActionKind::AddSeventhChords => pitch_ops::add_seventh_chords(score, params),
        }
    }
}

/// Action parameters as sent by the model.
///
/// The model is inconsistent about JSON types — shifts arrive as `-2`,
/// `"-2"`, or `"+1"` — so the accessors coerce numbers and numeric strings
/// alike. A present-but-unparseable value is an error; an absent key falls
/// back to the action's default.
pub struct Params<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Params<'a> {
        Params { map }
    }

    fn first_present(&self, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
        for key in keys {
            if let Some((k, v)) = self.map.get_key_value(*key) {
                return Some((k.as_str(), v));
            }
        }
        None
    }

    pub fn i64_or(
        &self,
        action: &'static str,
        keys: &[&str],
        default: i64,
    ) -> Result<i64, ActionError> {
        match self.first_present(keys) {
            None => Ok(default),
            Some((key, value)) => coerce_i64(value).ok_or_else(|| ActionError::InvalidParameter {
                action,
                message: format!("{} must be an integer, got {}", key, value),
            }),
        }
    }

    pub fn f64_or(
        &self,
        action: &'static str,
        keys: &[&str],
        default: f64,
    ) -> Result<f64, ActionError> {
        match self.first_present(keys) {
            None => Ok(default),
            Some((key, value)) => coerce_f64(value).ok_or_else(|| ActionError::InvalidParameter {
                action,
                message: format!("{} must be a number, got {}", key, value),
            }),
        }
    }

    pub fn str_or<'b>(&self, keys: &[&str], default: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.first_present(keys)
            .and_then(|(_, v)| v.as_str())
            .unwrap_or(default)
    }

    /// First string inside an array-valued parameter, if any.
    pub fn first_in_array(&self, key: &str) -> Option<&'a str> {
        self.map
            .get(key)
            .and_then(|v| v.as_array())
            .and_then(|items| items.iter().find_map(|item| item.as_str()))
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.strip_prefix('+').unwrap_or(s).parse().ok()
        }
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            s.strip_prefix('+').unwrap_or(s).parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params_from(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_all_nine_names_resolve() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_name_with_spaces_resolves() {
        assert_eq!(
            ActionKind::from_name("change tempo"),
            Some(ActionKind::ChangeTempo)
        );
    }

    #[test]
    fn test_unknown_name_is_none() {
        assert_eq!(ActionKind::from_name("reverse_melody"), None);
    }

    #[test]
    fn test_numeric_string_coercion() {
        let map = params_from(json!({"dynamics_shift": "+1", "ratio": "0.85"}));
        let params = Params::new(&map);
        assert_eq!(params.i64_or("t", &["dynamics_shift"], 0).unwrap(), 1);
        assert!((params.f64_or("t", &["ratio"], 1.0).unwrap() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_absent_key_uses_default() {
        let map = params_from(json!({}));
        let params = Params::new(&map);
        assert_eq!(params.i64_or("t", &["semitones"], 2).unwrap(), 2);
    }

    #[test]
    fn test_garbage_value_is_an_error() {
        let map = params_from(json!({"semitones": "up a bit"}));
        let params = Params::new(&map);
        assert!(params.i64_or("t", &["semitones"], 2).is_err());
    }

    #[test]
    fn test_alias_keys() {
        let map = params_from(json!({"rhythm_scale": 0.8}));
        let params = Params::new(&map);
        let value = params.f64_or("t", &["scale", "rhythm_scale"], 1.0).unwrap();
        assert!((value - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_first_in_array() {
        let map = params_from(json!({"articulations": ["staccato", "accent"]}));
        let params = Params::new(&map);
        assert_eq!(params.first_in_array("articulations"), Some("staccato"));
    }
}
