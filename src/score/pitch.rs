//! Pitch and interval model
//!
//! Pitches are stored the way MusicXML spells them: a diatonic step, a
//! chromatic alteration, and an octave. Transposition re-spells through the
//! MIDI number so that chromatic shifts stay readable (sharps going up,
//! flats coming down), while named intervals preserve the generic degree.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Diatonic step letter (C through B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    /// Semitone offset of the natural step above C.
    pub fn semitones(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    /// Zero-based diatonic index (C=0 .. B=6).
    pub fn index(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 1,
            Step::E => 2,
            Step::F => 3,
            Step::G => 4,
            Step::A => 5,
            Step::B => 6,
        }
    }

    /// Step for a diatonic index, wrapping every 7.
    pub fn from_index(index: i32) -> Step {
        match index.rem_euclid(7) {
            0 => Step::C,
            1 => Step::D,
            2 => Step::E,
            3 => Step::F,
            4 => Step::G,
            5 => Step::A,
            _ => Step::B,
        }
    }

    /// MusicXML step name.
    pub fn name(self) -> &'static str {
        match self {
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
            Step::A => "A",
            Step::B => "B",
        }
    }

    pub fn from_name(name: &str) -> Option<Step> {
        match name.trim() {
            "C" | "c" => Some(Step::C),
            "D" | "d" => Some(Step::D),
            "E" | "e" => Some(Step::E),
            "F" | "f" => Some(Step::F),
            "G" | "g" => Some(Step::G),
            "A" | "a" => Some(Step::A),
            "B" | "b" => Some(Step::B),
            _ => None,
        }
    }
}

/// A spelled pitch: step + alter + octave, as in a MusicXML `<pitch>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    /// Chromatic alteration in semitones (-2 double flat .. +2 double sharp).
    pub alter: i8,
    /// MusicXML octave (4 contains middle C).
    pub octave: i8,
}

impl Pitch {
    pub fn new(step: Step, alter: i8, octave: i8) -> Pitch {
        Pitch { step, alter, octave }
    }

    /// MIDI note number (middle C = 60).
    pub fn midi(&self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.step.semitones() + self.alter as i32
    }

    /// Spell a MIDI number. Black keys become sharps unless `prefer_flats`.
    pub fn from_midi(midi: i32, prefer_flats: bool) -> Pitch {
        let octave = midi.div_euclid(12) - 1;
        let pc = midi.rem_euclid(12);
        let (step, alter) = if prefer_flats {
            match pc {
                0 => (Step::C, 0),
                1 => (Step::D, -1),
                2 => (Step::D, 0),
                3 => (Step::E, -1),
                4 => (Step::E, 0),
                5 => (Step::F, 0),
                6 => (Step::G, -1),
                7 => (Step::G, 0),
                8 => (Step::A, -1),
                9 => (Step::A, 0),
                10 => (Step::B, -1),
                _ => (Step::B, 0),
            }
        } else {
            match pc {
                0 => (Step::C, 0),
                1 => (Step::C, 1),
                2 => (Step::D, 0),
                3 => (Step::D, 1),
                4 => (Step::E, 0),
                5 => (Step::F, 0),
                6 => (Step::F, 1),
                7 => (Step::G, 0),
                8 => (Step::G, 1),
                9 => (Step::A, 0),
                10 => (Step::A, 1),
                _ => (Step::B, 0),
            }
        };
        Pitch { step, alter, octave: octave as i8 }
    }

    /// Chromatic transposition with direction-aware re-spelling.
    pub fn transposed(&self, semitones: i32) -> Pitch {
        if semitones == 0 {
            return *self;
        }
        Pitch::from_midi(self.midi() + semitones, semitones < 0)
    }

    /// Transpose upward by a named interval, preserving the generic degree.
    ///
    /// Spellings outside double-sharp/double-flat fall back to chromatic
    /// spelling rather than producing unreadable alterations.
    pub fn transposed_by(&self, interval: &Interval) -> Pitch {
        let target_midi = self.midi() + interval.semitones;
        let diatonic = self.step.index() + interval.degree as i32 - 1;
        let step = Step::from_index(diatonic);
        let octave = self.octave as i32 + diatonic.div_euclid(7);
        let natural_midi = (octave + 1) * 12 + step.semitones();
        let alter = target_midi - natural_midi;
        if (-2..=2).contains(&alter) {
            Pitch { step, alter: alter as i8, octave: octave as i8 }
        } else {
            Pitch::from_midi(target_midi, alter < 0)
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum IntervalError {
    #[error("invalid interval name: {0}")]
    InvalidName(String),
}

/// A named interval such as `M3`, `m7`, `P5`, `d5`, `A4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Generic degree, 1-based (1 = unison, 8 = octave).
    pub degree: u8,
    /// Chromatic size in semitones.
    pub semitones: i32,
}

impl Interval {
    /// Parse an interval name: quality letter (`P`, `M`, `m`, `A`, `d`)
    /// followed by a degree number.
    pub fn parse(name: &str) -> Result<Interval, IntervalError> {
        let name = name.trim();
        let mut chars = name.chars();
        let quality = chars
            .next()
            .ok_or_else(|| IntervalError::InvalidName(name.to_string()))?;
        let degree: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| IntervalError::InvalidName(name.to_string()))?;
        if degree == 0 || degree > 15 {
            return Err(IntervalError::InvalidName(name.to_string()));
        }

        // Size of the major/perfect interval for each degree.
        let simple = (degree - 1) % 7;
        let octaves = (degree as i32 - 1) / 7;
        let base = match simple {
            0 => 0,
            1 => 2,
            2 => 4,
            3 => 5,
            4 => 7,
            5 => 9,
            _ => 11,
        };
        let perfect_class = matches!(simple, 0 | 3 | 4);

        let adjust = match (quality, perfect_class) {
            ('P', true) => 0,
            ('A', _) => 1,
            ('d', true) => -1,
            ('d', false) => -2,
            ('M', false) => 0,
            ('m', false) => -1,
            _ => return Err(IntervalError::InvalidName(name.to_string())),
        };

        Ok(Interval {
            degree,
            semitones: base + adjust + octaves * 12,
        })
    }
}
