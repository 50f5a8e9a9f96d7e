//! MusicXML writer
//!
//! Emits a `<score-partwise version="3.1">` document from the score model
//! by appending to a string buffer. Note types are recomputed from duration
//! and the divisions in effect, so scaled rhythms stay presentable.

use super::model::{Direction, Measure, MeasureEvent, Note, Part, Rest, Score};
use super::pitch::Pitch;

const DEFAULT_DIVISIONS: u32 = 4;

/// Serialize a score to MusicXML text.
pub fn write_score(score: &Score) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<!DOCTYPE score-partwise PUBLIC \"-//Recordare//DTD MusicXML 3.1 Partwise//EN\" \"http://www.musicxml.org/dtds/partwise.dtd\">\n");
    xml.push_str("<score-partwise version=\"3.1\">\n");

    if let Some(title) = &score.movement_title {
        if !title.is_empty() {
            xml.push_str("  <movement-title>");
            xml.push_str(&xml_escape(title));
            xml.push_str("</movement-title>\n");
        }
    }

    xml.push_str("  <part-list>\n");
    for part in &score.parts {
        xml.push_str(&format!("    <score-part id=\"{}\">\n", xml_escape(&part.id)));
        xml.push_str(&format!(
            "      <part-name>{}</part-name>\n",
            xml_escape(&part.name)
        ));
        xml.push_str("    </score-part>\n");
    }
    xml.push_str("  </part-list>\n");

    for part in &score.parts {
        write_part(&mut xml, part);
    }

    xml.push_str("</score-partwise>\n");
    xml
}

fn write_part(xml: &mut String, part: &Part) {
    xml.push_str(&format!("  <part id=\"{}\">\n", xml_escape(&part.id)));
    let mut divisions = DEFAULT_DIVISIONS;
    let mut first = true;
    for measure in &part.measures {
        if let Some(div) = measure.attributes.as_ref().and_then(|a| a.divisions) {
            divisions = div;
        }
        write_measure(xml, measure, divisions, first);
        first = false;
    }
    xml.push_str("  </part>\n");
}

fn write_measure(xml: &mut String, measure: &Measure, divisions: u32, force_divisions: bool) {
    xml.push_str(&format!("    <measure number=\"{}\">\n", measure.number));

    let mut attrs = measure.attributes.clone().unwrap_or_default();
    if force_divisions && attrs.divisions.is_none() {
        // The first measure must establish divisions for durations to mean
        // anything downstream.
        attrs.divisions = Some(divisions);
    }
    if !attrs.is_empty() {
        xml.push_str("      <attributes>\n");
        if let Some(div) = attrs.divisions {
            xml.push_str(&format!("        <divisions>{}</divisions>\n", div));
        }
        if let Some(key) = attrs.key {
            xml.push_str("        <key>\n");
            xml.push_str(&format!("          <fifths>{}</fifths>\n", key.fifths));
            if let Some(mode) = key.mode {
                xml.push_str(&format!("          <mode>{}</mode>\n", mode.name()));
            }
            xml.push_str("        </key>\n");
        }
        if let Some(time) = attrs.time {
            xml.push_str("        <time>\n");
            xml.push_str(&format!("          <beats>{}</beats>\n", time.beats));
            xml.push_str(&format!(
                "          <beat-type>{}</beat-type>\n",
                time.beat_type
            ));
            xml.push_str("        </time>\n");
        }
        if let Some(clef) = &attrs.clef {
            xml.push_str("        <clef>\n");
            xml.push_str(&format!("          <sign>{}</sign>\n", xml_escape(&clef.sign)));
            if let Some(line) = clef.line {
                xml.push_str(&format!("          <line>{}</line>\n", line));
            }
            xml.push_str("        </clef>\n");
        }
        xml.push_str("      </attributes>\n");
    }

    for event in &measure.events {
        match event {
            MeasureEvent::Direction(direction) => write_direction(xml, direction),
            MeasureEvent::Note(note) => write_note(xml, note, divisions),
            MeasureEvent::Rest(rest) => write_rest(xml, rest, divisions),
        }
    }

    xml.push_str("    </measure>\n");
}

fn write_direction(xml: &mut String, direction: &Direction) {
    match direction {
        Direction::Dynamic(mark) => {
            xml.push_str("      <direction placement=\"below\">\n");
            xml.push_str("        <direction-type>\n");
            xml.push_str(&format!("          <dynamics><{}/></dynamics>\n", xml_escape(mark)));
            xml.push_str("        </direction-type>\n");
            xml.push_str("      </direction>\n");
        }
        Direction::Metronome(bpm) => {
            xml.push_str("      <direction placement=\"above\">\n");
            xml.push_str("        <direction-type>\n");
            xml.push_str("          <metronome>\n");
            xml.push_str("            <beat-unit>quarter</beat-unit>\n");
            xml.push_str(&format!("            <per-minute>{}</per-minute>\n", bpm));
            xml.push_str("          </metronome>\n");
            xml.push_str("        </direction-type>\n");
            xml.push_str(&format!("        <sound tempo=\"{}\"/>\n", bpm));
            xml.push_str("      </direction>\n");
        }
    }
}

fn write_note(xml: &mut String, note: &Note, divisions: u32) {
    let (note_type, dots) = duration_to_note_type(note.duration as f64 / divisions as f64);
    for (index, pitch) in note.pitches.iter().enumerate() {
        xml.push_str("      <note>\n");
        if index > 0 {
            xml.push_str("        <chord/>\n");
        }
        write_pitch(xml, pitch);
        xml.push_str(&format!("        <duration>{}</duration>\n", note.duration));
        xml.push_str(&format!("        <type>{}</type>\n", note_type));
        for _ in 0..dots {
            xml.push_str("        <dot/>\n");
        }
        if !note.articulations.is_empty() {
            xml.push_str("        <notations>\n");
            xml.push_str("          <articulations>\n");
            for articulation in &note.articulations {
                xml.push_str(&format!("            <{}/>\n", articulation.xml_name()));
            }
            xml.push_str("          </articulations>\n");
            xml.push_str("        </notations>\n");
        }
        xml.push_str("      </note>\n");
    }
}

fn write_rest(xml: &mut String, rest: &Rest, divisions: u32) {
    let (note_type, dots) = duration_to_note_type(rest.duration as f64 / divisions as f64);
    xml.push_str("      <note>\n");
    xml.push_str("        <rest/>\n");
    xml.push_str(&format!("        <duration>{}</duration>\n", rest.duration));
    xml.push_str(&format!("        <type>{}</type>\n", note_type));
    for _ in 0..dots {
        xml.push_str("        <dot/>\n");
    }
    xml.push_str("      </note>\n");
}

fn write_pitch(xml: &mut String, pitch: &Pitch) {
    xml.push_str("        <pitch>\n");
    xml.push_str(&format!("          <step>{}</step>\n", pitch.step.name()));
    if pitch.alter != 0 {
        xml.push_str(&format!("          <alter>{}</alter>\n", pitch.alter));
    }
    xml.push_str(&format!("          <octave>{}</octave>\n", pitch.octave));
    xml.push_str("        </pitch>\n");
}

/// Convert a duration in quarter notes to a MusicXML note type and dot count.
fn duration_to_note_type(duration: f64) -> (&'static str, usize) {
    const EPSILON: f64 = 0.001;

    let table: [(f64, &'static str, usize); 13] = [
        (8.0, "breve", 0),
        (6.0, "whole", 1),
        (4.0, "whole", 0),
        (3.0, "half", 1),
        (2.0, "half", 0),
        (1.5, "quarter", 1),
        (1.0, "quarter", 0),
        (0.75, "eighth", 1),
        (0.5, "eighth", 0),
        (0.375, "16th", 1),
        (0.25, "16th", 0),
        (0.1875, "32nd", 1),
        (0.125, "32nd", 0),
    ];
    for (value, note_type, dots) in table {
        if (duration - value).abs() < EPSILON {
            return (note_type, dots);
        }
    }

    // Arbitrary durations: pick the nearest plain type below.
    if duration >= 4.0 {
        ("whole", 0)
    } else if duration >= 2.0 {
        ("half", 0)
    } else if duration >= 1.0 {
        ("quarter", 0)
    } else if duration >= 0.5 {
        ("eighth", 0)
    } else if duration >= 0.25 {
        ("16th", 0)
    } else {
        ("32nd", 0)
    }
}

/// Escape special XML characters.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
