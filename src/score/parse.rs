//! MusicXML parser
//!
//! Converts a partwise MusicXML document into the score model using
//! roxmltree. Elements the edit pipeline does not act on (lyrics, beams,
//! slurs, `backup`/`forward` voice plumbing) are skipped, not rejected.

use std::collections::HashMap;

use roxmltree::{Document as XmlDocument, Node};
use thiserror::Error;

use super::model::{
    Articulation, Attributes, Clef, Direction, KeySignature, Measure, MeasureEvent, Mode, Note,
    Part, Rest, Score, TimeSignature,
};
use super::pitch::{Pitch, Step};

pub type ParseResult<T> = Result<T, ScoreParseError>;

/// Errors raised while turning MusicXML text into a [`Score`].
#[derive(Debug, Clone, Error)]
pub enum ScoreParseError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("invalid value '{value}' for element '{element}': {reason}")]
    InvalidValue {
        element: String,
        value: String,
        reason: String,
    },

    #[error("unsupported MusicXML format: {0}")]
    UnsupportedFormat(String),
}

/// Parse a MusicXML string into a [`Score`].
pub fn parse_score(xml: &str) -> ParseResult<Score> {
    let doc = XmlDocument::parse(xml).map_err(|e| ScoreParseError::Xml(e.to_string()))?;
    let root = doc.root_element();

    match root.tag_name().name() {
        "score-partwise" => parse_score_partwise(&root),
        "score-timewise" => Err(ScoreParseError::UnsupportedFormat(
            "score-timewise (use score-partwise instead)".to_string(),
        )),
        other => Err(ScoreParseError::InvalidValue {
            element: "root".to_string(),
            value: other.to_string(),
            reason: "expected <score-partwise>".to_string(),
        }),
    }
}

fn parse_score_partwise(root: &Node) -> ParseResult<Score> {
    let movement_title = root
        .children()
        .find(|n| n.tag_name().name() == "movement-title")
        .and_then(|n| n.text())
        .map(|t| t.to_string());

    let part_names = root
        .children()
        .find(|n| n.tag_name().name() == "part-list")
        .map(|pl| parse_part_list(&pl))
        .unwrap_or_default();

    let mut parts = Vec::new();
    for (index, part_node) in root
        .children()
        .filter(|n| n.tag_name().name() == "part")
        .enumerate()
    {
        let id = part_node
            .attribute("id")
            .ok_or_else(|| ScoreParseError::MissingElement("part id attribute".to_string()))?
            .to_string();
        let name = part_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Part {}", index + 1));
        parts.push(parse_part(&part_node, id, name)?);
    }

    if parts.is_empty() {
        return Err(ScoreParseError::MissingElement("part".to_string()));
    }

    Ok(Score { movement_title, parts })
}

fn parse_part_list(part_list: &Node) -> HashMap<String, String> {
    let mut names = HashMap::new();
    for score_part in part_list
        .children()
        .filter(|n| n.tag_name().name() == "score-part")
    {
        if let Some(id) = score_part.attribute("id") {
            let name = score_part
                .children()
                .find(|n| n.tag_name().name() == "part-name")
                .and_then(|n| n.text())
                .unwrap_or("");
            names.insert(id.to_string(), name.to_string());
        }
    }
    names
}

fn parse_part(part_node: &Node, id: String, name: String) -> ParseResult<Part> {
    let mut measures = Vec::new();
    for (index, measure_node) in part_node
        .children()
        .filter(|n| n.tag_name().name() == "measure")
        .enumerate()
    {
        let number = measure_node
            .attribute("number")
            .and_then(|n| n.parse().ok())
            .unwrap_or(index as u32 + 1);
        measures.push(parse_measure(&measure_node, number)?);
    }
    Ok(Part { id, name, measures })
}

fn parse_measure(measure_node: &Node, number: u32) -> ParseResult<Measure> {
    let mut attributes: Option<Attributes> = None;
    let mut events = Vec::new();

    for child in measure_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "attributes" => {
                let parsed = parse_attributes(&child)?;
                attributes = Some(match attributes.take() {
                    Some(existing) => existing.merged_with(&parsed),
                    None => parsed,
                });
            }
            "note" => parse_note(&child, &mut events)?,
            "direction" => {
                if let Some(direction) = parse_direction(&child) {
                    events.push(MeasureEvent::Direction(direction));
                }
            }
            "sound" => {
                // Standalone <sound tempo="..."> counts as a tempo mark.
                if let Some(bpm) = child
                    .attribute("tempo")
                    .and_then(|t| t.parse::<f64>().ok())
                {
                    events.push(MeasureEvent::Direction(Direction::Metronome(
                        bpm.round() as u32,
                    )));
                }
            }
            // backup/forward, barlines, print, harmony: not modeled
            _ => {}
        }
    }

    Ok(Measure { number, attributes, events })
}

fn parse_attributes(attr_node: &Node) -> ParseResult<Attributes> {
    let mut attrs = Attributes::default();

    for child in attr_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "divisions" => {
                let text = child.text().unwrap_or("");
                attrs.divisions = Some(text.trim().parse().map_err(|_| {
                    ScoreParseError::InvalidValue {
                        element: "divisions".to_string(),
                        value: text.to_string(),
                        reason: "expected positive integer".to_string(),
                    }
                })?);
            }
            "key" => {
                let fifths = child
                    .children()
                    .find(|n| n.tag_name().name() == "fifths")
                    .and_then(|n| n.text())
                    .and_then(|t| t.trim().parse::<i8>().ok());
                if let Some(fifths) = fifths {
                    let mode = child
                        .children()
                        .find(|n| n.tag_name().name() == "mode")
                        .and_then(|n| n.text())
                        .and_then(Mode::from_name);
                    attrs.key = Some(KeySignature { fifths, mode });
                }
            }
            "time" => {
                let beats = child
                    .children()
                    .find(|n| n.tag_name().name() == "beats")
                    .and_then(|n| n.text())
                    .and_then(|t| t.trim().parse::<u8>().ok());
                let beat_type = child
                    .children()
                    .find(|n| n.tag_name().name() == "beat-type")
                    .and_then(|n| n.text())
                    .and_then(|t| t.trim().parse::<u8>().ok());
                if let (Some(beats), Some(beat_type)) = (beats, beat_type) {
                    attrs.time = Some(TimeSignature { beats, beat_type });
                }
            }
            "clef" => {
                let sign = child
                    .children()
                    .find(|n| n.tag_name().name() == "sign")
                    .and_then(|n| n.text())
                    .unwrap_or("G")
                    .to_string();
                let line = child
                    .children()
                    .find(|n| n.tag_name().name() == "line")
                    .and_then(|n| n.text())
                    .and_then(|t| t.trim().parse().ok());
                attrs.clef = Some(Clef { sign, line });
            }
            _ => {}
        }
    }

    Ok(attrs)
}

/// Parse one `<note>` into the event stream. Chord members (`<chord/>`)
/// fold their pitch into the preceding note event.
fn parse_note(note_node: &Node, events: &mut Vec<MeasureEvent>) -> ParseResult<()> {
    // Grace notes carry no duration and no rhythm of their own; skip them.
    if note_node.children().any(|n| n.tag_name().name() == "grace") {
        return Ok(());
    }

    let duration = note_node
        .children()
        .find(|n| n.tag_name().name() == "duration")
        .and_then(|n| n.text())
        .and_then(|t| t.trim().parse::<u32>().ok())
        .ok_or_else(|| ScoreParseError::MissingElement("duration".to_string()))?;

    if note_node.children().any(|n| n.tag_name().name() == "rest") {
        events.push(MeasureEvent::Rest(Rest { duration }));
        return Ok(());
    }

    let pitch_node = note_node
        .children()
        .find(|n| n.tag_name().name() == "pitch")
        .ok_or_else(|| ScoreParseError::MissingElement("pitch".to_string()))?;
    let pitch = parse_pitch(&pitch_node)?;

    let is_chord_member = note_node.children().any(|n| n.tag_name().name() == "chord");
    if is_chord_member {
        if let Some(MeasureEvent::Note(prev)) = events.last_mut() {
            prev.pitches.push(pitch);
            return Ok(());
        }
        // A chord tag with no preceding note: treat as a plain note.
    }

    let articulations = parse_articulations(note_node);
    events.push(MeasureEvent::Note(Note {
        pitches: vec![pitch],
        duration,
        articulations,
    }));
    Ok(())
}

fn parse_pitch(pitch_node: &Node) -> ParseResult<Pitch> {
    let step_text = pitch_node
        .children()
        .find(|n| n.tag_name().name() == "step")
        .and_then(|n| n.text())
        .ok_or_else(|| ScoreParseError::MissingElement("step".to_string()))?;
    let step = Step::from_name(step_text).ok_or_else(|| ScoreParseError::InvalidValue {
        element: "step".to_string(),
        value: step_text.to_string(),
        reason: "expected C through B".to_string(),
    })?;

    let alter = pitch_node
        .children()
        .find(|n| n.tag_name().name() == "alter")
        .and_then(|n| n.text())
        .and_then(|t| t.trim().parse::<f32>().ok())
        .map(|a| a.round() as i8)
        .unwrap_or(0);

    let octave = pitch_node
        .children()
        .find(|n| n.tag_name().name() == "octave")
        .and_then(|n| n.text())
        .and_then(|t| t.trim().parse::<i8>().ok())
        .ok_or_else(|| ScoreParseError::MissingElement("octave".to_string()))?;

    Ok(Pitch { step, alter, octave })
}

fn parse_articulations(note_node: &Node) -> Vec<Articulation> {
    let mut out = Vec::new();
    let notations = match note_node
        .children()
        .find(|n| n.tag_name().name() == "notations")
    {
        Some(node) => node,
        None => return out,
    };
    let articulations = match notations
        .children()
        .find(|n| n.tag_name().name() == "articulations")
    {
        Some(node) => node,
        None => return out,
    };
    for child in articulations.children().filter(|n| n.is_element()) {
        if let Some(art) = Articulation::from_xml_name(child.tag_name().name()) {
            out.push(art);
        }
    }
    out
}

fn parse_direction(direction_node: &Node) -> Option<Direction> {
    for direction_type in direction_node
        .children()
        .filter(|n| n.tag_name().name() == "direction-type")
    {
        for child in direction_type.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "dynamics" => {
                    if let Some(mark) = child.children().find(|n| n.is_element()) {
                        return Some(Direction::Dynamic(mark.tag_name().name().to_string()));
                    }
                }
                "metronome" => {
                    if let Some(bpm) = child
                        .children()
                        .find(|n| n.tag_name().name() == "per-minute")
                        .and_then(|n| n.text())
                        .and_then(|t| t.trim().parse::<f64>().ok())
                    {
                        return Some(Direction::Metronome(bpm.round() as u32));
                    }
                }
                _ => {}
            }
        }
    }

    // Fall back to <sound tempo="..."> nested in the direction.
    direction_node
        .children()
        .find(|n| n.tag_name().name() == "sound")
        .and_then(|n| n.attribute("tempo"))
        .and_then(|t| t.parse::<f64>().ok())
        .map(|bpm| Direction::Metronome(bpm.round() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_NOTE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>4</divisions>
        <key><fifths>0</fifths><mode>major</mode></key>
        <time><beats>4</beats><beat-type>4</beat-type></time>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>
      <direction placement="below">
        <direction-type><dynamics><mf/></dynamics></direction-type>
      </direction>
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>4</duration>
        <type>quarter</type>
      </note>
      <note><rest/><duration>4</duration></note>
    </measure>
  </part>
</score-partwise>"#;

    #[test]
    fn test_parse_minimal_score() {
        let score = parse_score(ONE_NOTE).unwrap();
        assert_eq!(score.parts.len(), 1);
        assert_eq!(score.parts[0].name, "Piano");
        let measure = &score.parts[0].measures[0];
        let attrs = measure.attributes.as_ref().unwrap();
        assert_eq!(attrs.divisions, Some(4));
        assert_eq!(attrs.key.unwrap().fifths, 0);
        assert_eq!(attrs.time.unwrap().beats, 4);
        assert_eq!(measure.events.len(), 3);
        assert!(matches!(
            &measure.events[0],
            MeasureEvent::Direction(Direction::Dynamic(d)) if d == "mf"
        ));
    }

    #[test]
    fn test_parse_chord_groups_pitches() {
        let xml = r#"<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name/></score-part></part-list>
  <part id="P1"><measure number="1">
    <attributes><divisions>1</divisions></attributes>
    <note><pitch><step>C</step><octave>4</octave></pitch><duration>1</duration></note>
    <note><chord/><pitch><step>E</step><octave>4</octave></pitch><duration>1</duration></note>
    <note><chord/><pitch><step>G</step><octave>4</octave></pitch><duration>1</duration></note>
  </measure></part>
</score-partwise>"#;
        let score = parse_score(xml).unwrap();
        let events = &score.parts[0].measures[0].events;
        assert_eq!(events.len(), 1);
        match &events[0] {
            MeasureEvent::Note(note) => assert_eq!(note.pitches.len(), 3),
            other => panic!("expected chord note, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_alter_and_articulation() {
        let xml = r#"<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name/></score-part></part-list>
  <part id="P1"><measure number="1">
    <attributes><divisions>1</divisions></attributes>
    <note>
      <pitch><step>B</step><alter>-1</alter><octave>3</octave></pitch>
      <duration>1</duration>
      <notations><articulations><staccato/></articulations></notations>
    </note>
  </measure></part>
</score-partwise>"#;
        let score = parse_score(xml).unwrap();
        match &score.parts[0].measures[0].events[0] {
            MeasureEvent::Note(note) => {
                assert_eq!(note.pitches[0].alter, -1);
                assert_eq!(note.articulations, vec![Articulation::Staccato]);
            }
            other => panic!("expected note, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_metronome_direction() {
        let xml = r#"<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name/></score-part></part-list>
  <part id="P1"><measure number="1">
    <direction placement="above">
      <direction-type>
        <metronome><beat-unit>quarter</beat-unit><per-minute>96</per-minute></metronome>
      </direction-type>
      <sound tempo="96"/>
    </direction>
    <note><rest/><duration>4</duration></note>
  </measure></part>
</score-partwise>"#;
        let score = parse_score(xml).unwrap();
        assert_eq!(score.first_tempo(), Some(96));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse_score("<score-partwise><part").is_err());
    }

    #[test]
    fn test_timewise_is_rejected() {
        let err = parse_score("<score-timewise/>").unwrap_err();
        assert!(matches!(err, ScoreParseError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_score_without_parts_is_an_error() {
        assert!(parse_score("<score-partwise><part-list/></score-partwise>").is_err());
    }
}
