//! Pitch-level actions: transposition, mode changes, chord building.

use once_cell::sync::Lazy;

use super::{ActionError, Params};
use crate::score::analysis::{fifths_to_tonic, tonic_to_fifths};
use crate::score::{Attributes, Interval, KeySignature, Mode, Score};

/// Shift every pitch by a signed semitone count.
pub fn transpose(mut score: Score, params: &Params) -> Result<Score, ActionError> {
    let semitones = params.i64_or("transpose", &["semitones"], 2)? as i32;
    for note in score.notes_mut() {
        for pitch in &mut note.pitches {
            *pitch = pitch.transposed(semitones);
        }
    }
    Ok(score)
}

/// Move the piece between major and minor.
///
/// The target tonic comes from the `to` parameter (`"minor"` or `"D minor"`
/// forms); when only a mode is given the tonic stays the score's notated
/// one. Switching major<->minor shifts the pitches a minor third (-3 toward
/// minor, +3 toward major) and rewrites the key signature at measure 1 of
/// each part.
pub fn change_mode(mut score: Score, params: &Params) -> Result<Score, ActionError> {
    let from_mode = Mode::from_name(params.str_or(&["from"], "major")).unwrap_or(Mode::Major);
    let to_raw = params.str_or(&["to"], "major").trim().to_ascii_lowercase();

    let (tonic, to_mode) = match to_raw.split_once(' ') {
        Some((tonic, mode)) => (
            tonic.to_string(),
            Mode::from_name(mode).unwrap_or(Mode::Major),
        ),
        None => {
            let mode = Mode::from_name(&to_raw).unwrap_or(Mode::Major);
            let tonic = score
                .first_key()
                .and_then(|k| fifths_to_tonic(k.fifths, k.mode.unwrap_or(Mode::Major)))
                .unwrap_or("C")
                .to_string();
            (tonic, mode)
        }
    };

    let semitone_shift = match (from_mode, to_mode) {
        (Mode::Major, Mode::Minor) => -3,
        (Mode::Minor, Mode::Major) => 3,
        _ => 0,
    };

    if semitone_shift != 0 {
        for note in score.notes_mut() {
            for pitch in &mut note.pitches {
                *pitch = pitch.transposed(semitone_shift);
            }
        }
    }

    let fifths = tonic_to_fifths(&tonic, to_mode).unwrap_or(0);
    let key = KeySignature {
        fifths,
        mode: Some(to_mode),
    };
    for part in &mut score.parts {
        if let Some(first) = part.measures.first_mut() {
            let attrs = first.attributes.get_or_insert_with(Attributes::default);
            attrs.key = Some(key);
        }
    }

    Ok(score)
}

/// Thicken each note into a dyad with a second pitch at the named interval
/// above the existing root.
pub fn add_chord_tone(mut score: Score, params: &Params) -> Result<Score, ActionError> {
    let name = params.str_or(&["interval"], "M3");
    let interval = Interval::parse(name).map_err(|e| ActionError::InvalidParameter {
        action: "add_chord_tone",
        message: e.to_string(),
    })?;
    for note in score.notes_mut() {
        if let Some(root) = note.pitches.first().copied() {
            note.pitches.push(root.transposed_by(&interval));
        }
    }
    Ok(score)
}

/// Interval stacks for the supported seventh-chord qualities.
static SEVENTH_TEMPLATES: Lazy<Vec<(&'static str, [Interval; 4])>> = Lazy::new(|| {
    let stack = |names: [&str; 4]| {
        names.map(|n| Interval::parse(n).expect("seventh-chord interval"))
    };
    vec![
        ("major seventh", stack(["P1", "M3", "P5", "M7"])),
        ("minor seventh", stack(["P1", "m3", "P5", "m7"])),
        ("dominant seventh", stack(["P1", "M3", "P5", "m7"])),
        ("half-diminished seventh", stack(["P1", "m3", "d5", "m7"])),
        ("diminished seventh", stack(["P1", "m3", "d5", "d7"])),
    ]
});

/// Replace each note with the four-note seventh chord built on its root.
/// Unknown qualities fall back to the major-seventh stack.
pub fn add_seventh_chords(mut score: Score, params: &Params) -> Result<Score, ActionError> {
    let requested = params
        .str_or(&["chord_type"], "major seventh")
        .trim()
        .to_ascii_lowercase();
    let intervals = SEVENTH_TEMPLATES
        .iter()
        .find(|(name, _)| *name == requested)
        .map(|(_, stack)| stack)
        .unwrap_or(&SEVENTH_TEMPLATES[0].1);

    for note in score.notes_mut() {
        if let Some(root) = note.pitches.first().copied() {
            note.pitches = intervals
                .iter()
                .map(|iv| root.transposed_by(iv))
                .collect();
        }
    }
    Ok(score)
}
