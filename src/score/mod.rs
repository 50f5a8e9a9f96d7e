//! Score representation and MusicXML I/O
//!
//! The model covers exactly what the edit actions touch: parts, measures,
//! notes/chords/rests, dynamics and metronome directions, and key/time
//! attributes. Parsing and serialization are in-memory string operations.

pub mod analysis;
pub mod model;
pub mod parse;
pub mod pitch;
pub mod preprocess;
pub mod write;

pub use analysis::GlobalInfo;
pub use model::{
    Articulation, Attributes, Clef, Direction, KeySignature, Measure, MeasureEvent, Mode, Note,
    Part, Rest, Score, TimeSignature,
};
pub use parse::{parse_score, ScoreParseError};
pub use pitch::{Interval, Pitch, Step};
pub use preprocess::fix_steps;
pub use write::write_score;
