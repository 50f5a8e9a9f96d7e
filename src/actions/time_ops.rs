//! Time-level actions: tempo, rhythm scaling, segment repetition.

use super::{ActionError, Params};
use crate::score::{Direction, MeasureEvent, Part, Score};

const DEFAULT_TEMPO: u32 = 120;

/// Rescale the tempo by a ratio of the current one.
///
/// All existing metronome marks are removed and a single new mark is
/// written at measure 1 of each part. The base tempo is the first existing
/// mark, or 120 when the score has none.
pub fn change_tempo(mut score: Score, params: &Params) -> Result<Score, ActionError> {
    let ratio = params.f64_or("change_tempo", &["ratio", "tempo_ratio"], 1.0)?;
    if ratio <= 0.0 || !ratio.is_finite() {
        return Err(ActionError::InvalidParameter {
            action: "change_tempo",
            message: format!("ratio must be positive, got {}", ratio),
        });
    }

    let base = score.first_tempo().unwrap_or(DEFAULT_TEMPO);
    let new_bpm = (base as f64 * ratio).round().max(1.0) as u32;

    for part in &mut score.parts {
        for measure in &mut part.measures {
            measure.events.retain(|event| {
                !matches!(event, MeasureEvent::Direction(Direction::Metronome(_)))
            });
        }
        if let Some(first) = part.measures.first_mut() {
            first
                .events
                .insert(0, MeasureEvent::Direction(Direction::Metronome(new_bpm)));
        }
    }

    Ok(score)
}

/// Multiply every note and rest duration by a scale factor.
pub fn adjust_rhythm(mut score: Score, params: &Params) -> Result<Score, ActionError> {
    let scale = params.f64_or("adjust_rhythm", &["scale", "rhythm_scale"], 1.0)?;
    if scale <= 0.0 || !scale.is_finite() {
        return Err(ActionError::InvalidParameter {
            action: "adjust_rhythm",
            message: format!("scale must be positive, got {}", scale),
        });
    }

    for part in &mut score.parts {
        for measure in &mut part.measures {
            for event in &mut measure.events {
                match event {
                    MeasureEvent::Note(note) => {
                        note.duration = scale_duration(note.duration, scale);
                    }
                    MeasureEvent::Rest(rest) => {
                        rest.duration = scale_duration(rest.duration, scale);
                    }
                    MeasureEvent::Direction(_) => {}
                }
            }
        }
    }

    Ok(score)
}

fn scale_duration(duration: u32, scale: f64) -> u32 {
    ((duration as f64 * scale).round() as u32).max(1)
}

/// Build a new score whose parts contain the original measure sequence
/// repeated `times` times, renumbered from 1.
pub fn repeat_segment(score: Score, params: &Params) -> Result<Score, ActionError> {
    let times = params.i64_or("repeat_segment", &["times"], 2)?;
    if times < 1 {
        return Err(ActionError::InvalidParameter {
            action: "repeat_segment",
            message: format!("times must be at least 1, got {}", times),
        });
    }

    let parts = score
        .parts
        .iter()
        .map(|part| {
            let mut measures = Vec::with_capacity(part.measures.len() * times as usize);
            for _ in 0..times {
                measures.extend(part.measures.iter().cloned());
            }
            for (index, measure) in measures.iter_mut().enumerate() {
                measure.number = index as u32 + 1;
            }
            Part {
                id: part.id.clone(),
                name: part.name.clone(),
                measures,
            }
        })
        .collect();

    Ok(Score {
        movement_title: score.movement_title,
        parts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Attributes, Measure, Note, Pitch, Rest, Step};
    use serde_json::{json, Map, Value};

    fn params_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn score_with_tempo(bpm: Option<u32>, measure_count: u32) -> Score {
        let mut measures: Vec<Measure> = (1..=measure_count)
            .map(|number| Measure {
                number,
                attributes: if number == 1 {
                    Some(Attributes {
                        divisions: Some(4),
                        ..Attributes::default()
                    })
                } else {
                    None
                },
                events: vec![
                    MeasureEvent::Note(Note {
                        pitches: vec![Pitch::new(Step::C, 0, 4)],
                        duration: 4,
                        articulations: Vec::new(),
                    }),
                    MeasureEvent::Rest(Rest { duration: 4 }),
                ],
            })
            .collect();
        if let Some(bpm) = bpm {
            measures[0]
                .events
                .insert(0, MeasureEvent::Direction(Direction::Metronome(bpm)));
        }
        Score {
            movement_title: None,
            parts: vec![Part {
                id: "P1".to_string(),
                name: String::new(),
                measures,
            }],
        }
    }

    #[test]
    fn test_change_tempo_scales_base() {
        let map = params_map(json!({"ratio": 1.25}));
        let score = change_tempo(score_with_tempo(Some(100), 1), &Params::new(&map)).unwrap();
        assert_eq!(score.first_tempo(), Some(125));
        // The old mark is gone; only the new one remains.
        let marks = score.parts[0].measures[0]
            .events
            .iter()
            .filter(|e| matches!(e, MeasureEvent::Direction(Direction::Metronome(_))))
            .count();
        assert_eq!(marks, 1);
    }

    #[test]
    fn test_change_tempo_ratio_one_is_identity() {
        let map = params_map(json!({"ratio": 1.0}));
        let score = change_tempo(score_with_tempo(Some(96), 1), &Params::new(&map)).unwrap();
        assert_eq!(score.first_tempo(), Some(96));
    }

    #[test]
    fn test_change_tempo_base_defaults_to_120() {
        let map = params_map(json!({"ratio": 0.5}));
        let score = change_tempo(score_with_tempo(None, 1), &Params::new(&map)).unwrap();
        assert_eq!(score.first_tempo(), Some(60));
    }

    #[test]
    fn test_change_tempo_rejects_nonpositive_ratio() {
        let map = params_map(json!({"ratio": 0.0}));
        assert!(change_tempo(score_with_tempo(None, 1), &Params::new(&map)).is_err());
    }

    #[test]
    fn test_adjust_rhythm_scales_notes_and_rests() {
        let map = params_map(json!({"scale": 0.5}));
        let score = adjust_rhythm(score_with_tempo(None, 1), &Params::new(&map)).unwrap();
        match (&score.parts[0].measures[0].events[0], &score.parts[0].measures[0].events[1]) {
            (MeasureEvent::Note(note), MeasureEvent::Rest(rest)) => {
                assert_eq!(note.duration, 2);
                assert_eq!(rest.duration, 2);
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_adjust_rhythm_never_drops_to_zero() {
        let map = params_map(json!({"rhythm_scale": 0.1}));
        let score = adjust_rhythm(score_with_tempo(None, 1), &Params::new(&map)).unwrap();
        match &score.parts[0].measures[0].events[0] {
            MeasureEvent::Note(note) => assert_eq!(note.duration, 1),
            other => panic!("expected note, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_segment_triples_measures() {
        let map = params_map(json!({"times": 3}));
        let score = repeat_segment(score_with_tempo(None, 4), &Params::new(&map)).unwrap();
        assert_eq!(score.parts.len(), 1);
        assert_eq!(score.parts[0].measures.len(), 12);
        let numbers: Vec<u32> = score.parts[0].measures.iter().map(|m| m.number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<u32>>());
    }

    #[test]
    fn test_repeat_segment_rejects_zero_times() {
        let map = params_map(json!({"times": 0}));
        assert!(repeat_segment(score_with_tempo(None, 2), &Params::new(&map)).is_err());
    }
}
