//! Score data model
//!
//! A partwise score: parts own measures, measures own an ordered event
//! stream (directions interleaved with notes and rests). Only the elements
//! the edit actions touch are modeled; everything else is dropped at parse
//! time.

use serde::{Deserialize, Serialize};

use super::pitch::Pitch;

/// Key mode as written in a MusicXML `<mode>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        match name.trim().to_ascii_lowercase().as_str() {
            "major" => Some(Mode::Major),
            "minor" => Some(Mode::Minor),
            _ => None,
        }
    }
}

/// Key signature: circle-of-fifths position plus optional mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    pub fifths: i8,
    pub mode: Option<Mode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clef {
    pub sign: String,
    pub line: Option<u8>,
}

/// Measure-level attributes. Absent fields carry forward from earlier
/// measures, as in MusicXML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub divisions: Option<u32>,
    pub key: Option<KeySignature>,
    pub time: Option<TimeSignature>,
    pub clef: Option<Clef>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        self.divisions.is_none()
            && self.key.is_none()
            && self.time.is_none()
            && self.clef.is_none()
    }

    /// Overlay `other` on top of self, keeping self's fields where `other`
    /// is silent.
    pub fn merged_with(&self, other: &Attributes) -> Attributes {
        Attributes {
            divisions: other.divisions.or(self.divisions),
            key: other.key.or(self.key),
            time: other.time.or(self.time),
            clef: other.clef.clone().or_else(|| self.clef.clone()),
        }
    }
}

/// Articulation markings the editor can add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Articulation {
    Staccato,
    Accent,
}

impl Articulation {
    /// MusicXML element name inside `<articulations>`.
    pub fn xml_name(self) -> &'static str {
        match self {
            Articulation::Staccato => "staccato",
            Articulation::Accent => "accent",
        }
    }

    pub fn from_xml_name(name: &str) -> Option<Articulation> {
        match name {
            "staccato" => Some(Articulation::Staccato),
            "accent" => Some(Articulation::Accent),
            _ => None,
        }
    }
}

/// A pitched note or chord. `pitches.len() > 1` means a chord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub pitches: Vec<Pitch>,
    /// Duration in divisions.
    pub duration: u32,
    pub articulations: Vec<Articulation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rest {
    pub duration: u32,
}

/// A direction marking attached to a point in the measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Dynamic marking name (`pp` .. `ff`, or whatever the source wrote).
    Dynamic(String),
    /// Metronome mark in quarter-note beats per minute.
    Metronome(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureEvent {
    Note(Note),
    Rest(Rest),
    Direction(Direction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub number: u32,
    pub attributes: Option<Attributes>,
    pub events: Vec<MeasureEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub measures: Vec<Measure>,
}

impl Part {
    /// Attributes in effect at the start of measure index `idx`, merged
    /// from every earlier measure's attribute changes.
    pub fn effective_attributes_at(&self, idx: usize) -> Attributes {
        let mut acc = Attributes::default();
        for measure in self.measures.iter().take(idx) {
            if let Some(attrs) = &measure.attributes {
                acc = acc.merged_with(attrs);
            }
        }
        acc
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub movement_title: Option<String>,
    pub parts: Vec<Part>,
}

impl Score {
    /// Measure count of the longest part.
    pub fn measure_count(&self) -> usize {
        self.parts.iter().map(|p| p.measures.len()).max().unwrap_or(0)
    }

    /// Iterate mutably over every note in every part.
    pub fn notes_mut(&mut self) -> impl Iterator<Item = &mut Note> {
        self.parts
            .iter_mut()
            .flat_map(|p| p.measures.iter_mut())
            .flat_map(|m| m.events.iter_mut())
            .filter_map(|e| match e {
                MeasureEvent::Note(n) => Some(n),
                _ => None,
            })
    }

    /// First metronome mark in document order, if any.
    pub fn first_tempo(&self) -> Option<u32> {
        self.parts
            .iter()
            .flat_map(|p| p.measures.iter())
            .flat_map(|m| m.events.iter())
            .find_map(|e| match e {
                MeasureEvent::Direction(Direction::Metronome(bpm)) => Some(*bpm),
                _ => None,
            })
    }

    /// First notated key signature in document order, if any.
    pub fn first_key(&self) -> Option<KeySignature> {
        self.parts
            .iter()
            .flat_map(|p| p.measures.iter())
            .find_map(|m| m.attributes.as_ref().and_then(|a| a.key))
    }

    /// First notated time signature in document order, if any.
    pub fn first_time(&self) -> Option<TimeSignature> {
        self.parts
            .iter()
            .flat_map(|p| p.measures.iter())
            .find_map(|m| m.attributes.as_ref().and_then(|a| a.time))
    }

    /// Extract measures `start..=end` (1-based, clamped) into a new score.
    ///
    /// The first measure of the slice receives the attributes in effect at
    /// that point so the fragment stands alone (divisions, key, clef carry
    /// in even when the slice starts mid-score).
    pub fn slice_measures(&self, start: u32, end: u32) -> Score {
        let start = start.max(1);
        let parts = self
            .parts
            .iter()
            .map(|part| {
                let last = part.measures.len() as u32;
                let end = end.min(last);
                let mut measures: Vec<Measure> = Vec::new();
                if start <= end && last > 0 {
                    let start_idx = (start - 1) as usize;
                    let inherited = part.effective_attributes_at(start_idx);
                    for (offset, measure) in
                        part.measures[start_idx..end as usize].iter().enumerate()
                    {
                        let mut m = measure.clone();
                        m.number = offset as u32 + 1;
                        if offset == 0 {
                            let own = m.attributes.take().unwrap_or_default();
                            let merged = inherited.merged_with(&own);
                            if !merged.is_empty() {
                                m.attributes = Some(merged);
                            }
                        }
                        measures.push(m);
                    }
                }
                Part {
                    id: part.id.clone(),
                    name: part.name.clone(),
                    measures,
                }
            })
            .collect();
        Score {
            movement_title: self.movement_title.clone(),
            parts,
        }
    }
}
