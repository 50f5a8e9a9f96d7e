//! Score metadata summary
//!
//! Computes the key / time-signature / tempo line that goes into the model
//! prompt, from the notated attributes of the parsed score. Scores with no
//! key signature report C major.

use serde::Serialize;

use super::model::{KeySignature, Mode, Score};

/// Prompt-facing summary of a score fragment.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalInfo {
    pub key: String,
    pub time_signature: String,
    pub tempo: Option<u32>,
}

impl GlobalInfo {
    pub fn from_score(score: &Score) -> GlobalInfo {
        let key = score
            .first_key()
            .map(key_name)
            .unwrap_or_else(|| "C major".to_string());
        let time_signature = score
            .first_time()
            .map(|t| format!("{}/{}", t.beats, t.beat_type))
            .unwrap_or_else(|| "4/4".to_string());
        GlobalInfo {
            key,
            time_signature,
            tempo: score.first_tempo(),
        }
    }

    /// The `key=..., time_signature=..., tempo=...` line used in prompts.
    pub fn prompt_line(&self) -> String {
        let tempo = match self.tempo {
            Some(bpm) => bpm.to_string(),
            None => "None".to_string(),
        };
        format!(
            "key={}, time_signature={}, tempo={}",
            self.key, self.time_signature, tempo
        )
    }
}

const MAJOR_TONICS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];
const MINOR_TONICS: [&str; 15] = [
    "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#", "G#", "D#", "A#",
];

/// Tonic name for a circle-of-fifths position, e.g. (1, Major) -> "G".
pub fn fifths_to_tonic(fifths: i8, mode: Mode) -> Option<&'static str> {
    let index = (fifths as i32 + 7) as usize;
    let table = match mode {
        Mode::Major => &MAJOR_TONICS,
        Mode::Minor => &MINOR_TONICS,
    };
    table.get(index).copied()
}

/// Circle-of-fifths position for a tonic name, e.g. ("d", Minor) -> -1.
pub fn tonic_to_fifths(tonic: &str, mode: Mode) -> Option<i8> {
    let tonic = normalize_tonic(tonic)?;
    let table = match mode {
        Mode::Major => &MAJOR_TONICS,
        Mode::Minor => &MINOR_TONICS,
    };
    table
        .iter()
        .position(|t| t.eq_ignore_ascii_case(&tonic))
        .map(|i| i as i8 - 7)
}

/// Human-readable key name, e.g. "C major" or "A minor".
pub fn key_name(key: KeySignature) -> String {
    let mode = key.mode.unwrap_or(Mode::Major);
    match fifths_to_tonic(key.fifths, mode) {
        Some(tonic) => format!("{} {}", tonic, mode.name()),
        None => format!("{} sharps/flats", key.fifths),
    }
}

/// Canonicalize a tonic spelling: "bb" -> "Bb", "f#" -> "F#".
fn normalize_tonic(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !('A'..='G').contains(&letter) {
        return None;
    }
    let accidental = match chars.as_str() {
        "" => "",
        "b" | "B" | "♭" => "b",
        "#" | "♯" | "s" => "#",
        _ => return None,
    };
    Some(format!("{}{}", letter, accidental))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parse::parse_score;

    #[test]
    fn test_fifths_round_trip() {
        for fifths in -7i8..=7 {
            for mode in [Mode::Major, Mode::Minor] {
                let tonic = fifths_to_tonic(fifths, mode).unwrap();
                assert_eq!(tonic_to_fifths(tonic, mode), Some(fifths));
            }
        }
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(KeySignature { fifths: 0, mode: Some(Mode::Major) }), "C major");
        assert_eq!(key_name(KeySignature { fifths: 0, mode: Some(Mode::Minor) }), "A minor");
        assert_eq!(key_name(KeySignature { fifths: -1, mode: Some(Mode::Minor) }), "D minor");
        assert_eq!(key_name(KeySignature { fifths: 2, mode: None }), "D major");
    }

    #[test]
    fn test_tonic_normalization() {
        assert_eq!(tonic_to_fifths("bb", Mode::Major), Some(-2));
        assert_eq!(tonic_to_fifths("f#", Mode::Minor), Some(3));
        assert_eq!(tonic_to_fifths("H", Mode::Major), None);
    }

    #[test]
    fn test_global_info_defaults() {
        let xml = r#"<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name/></score-part></part-list>
  <part id="P1"><measure number="1">
    <note><rest/><duration>4</duration></note>
  </measure></part>
</score-partwise>"#;
        let score = parse_score(xml).unwrap();
        let info = GlobalInfo::from_score(&score);
        assert_eq!(info.key, "C major");
        assert_eq!(info.time_signature, "4/4");
        assert_eq!(info.tempo, None);
        assert_eq!(info.prompt_line(), "key=C major, time_signature=4/4, tempo=None");
    }
}
