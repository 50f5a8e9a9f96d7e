//! Expression-level actions: dynamics and articulations.

use tracing::warn;

use super::{ActionError, Params};
use crate::score::{Articulation, Direction, MeasureEvent, Score};

/// The dynamic ladder the shift operates on, quietest first.
const DYNAMIC_LEVELS: [&str; 6] = ["pp", "p", "mp", "mf", "f", "ff"];

/// Shift each measure's dynamic marking up or down the six-level ladder,
/// clamping at `pp` and `ff`. Measures without a marking start from `mf`;
/// markings outside the ladder reset to `mf`.
pub fn modify_dynamics(mut score: Score, params: &Params) -> Result<Score, ActionError> {
    let shift = params.i64_or("modify_dynamics", &["dynamics_shift"], 0)?;

    for part in &mut score.parts {
        for measure in &mut part.measures {
            let base = measure.events.iter().find_map(|event| match event {
                MeasureEvent::Direction(Direction::Dynamic(mark)) => Some(mark.clone()),
                _ => None,
            });

            let base = base.as_deref().unwrap_or("mf");
            let new_mark = match DYNAMIC_LEVELS.iter().position(|level| *level == base) {
                Some(index) => {
                    let shifted =
                        (index as i64 + shift).clamp(0, DYNAMIC_LEVELS.len() as i64 - 1);
                    DYNAMIC_LEVELS[shifted as usize]
                }
                // A marking we don't rank (sfz, fp, ...) resets to mf.
                None => "mf",
            };

            measure.events.retain(|event| {
                !matches!(event, MeasureEvent::Direction(Direction::Dynamic(_)))
            });
            measure.events.insert(
                0,
                MeasureEvent::Direction(Direction::Dynamic(new_mark.to_string())),
            );
        }
    }

    Ok(score)
}

/// Append a staccato or accent marking to every pitched note. Unrecognized
/// styles leave the score untouched.
pub fn add_articulation(mut score: Score, params: &Params) -> Result<Score, ActionError> {
    let style = match params.first_in_array("articulations") {
        Some(first) => first,
        None => params.str_or(&["style"], "staccato"),
    };

    let articulation = match style {
        "staccato" => Articulation::Staccato,
        "accent" => Articulation::Accent,
        other => {
            warn!(style = other, "unsupported articulation style, leaving score unchanged");
            return Ok(score);
        }
    };

    for note in score.notes_mut() {
        note.articulations.push(articulation);
    }
    Ok(score)
}
