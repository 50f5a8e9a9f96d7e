//! Input normalization
//!
//! Frontends sometimes ship shorthand accidentals inside `<step>` —
//! `<step>Eb</step>` or `<step>F#</step>` — which is not valid MusicXML.
//! Rewrite them into separate step/alter elements before parsing.

use once_cell::sync::Lazy;
use regex::Regex;

static FLAT_STEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<step>([A-G])b</step>").expect("flat step pattern"));
static SHARP_STEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<step>([A-G])#</step>").expect("sharp step pattern"));

/// Rewrite shorthand flat/sharp step spellings into step + alter elements.
pub fn fix_steps(xml: &str) -> String {
    let xml = FLAT_STEP.replace_all(xml, "<step>$1</step><alter>-1</alter>");
    SHARP_STEP
        .replace_all(&xml, "<step>$1</step><alter>1</alter>")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_shorthand() {
        assert_eq!(
            fix_steps("<step>Bb</step>"),
            "<step>B</step><alter>-1</alter>"
        );
    }

    #[test]
    fn test_sharp_shorthand() {
        assert_eq!(
            fix_steps("<step>F#</step>"),
            "<step>F</step><alter>1</alter>"
        );
    }

    #[test]
    fn test_plain_steps_untouched() {
        let xml = "<step>C</step><alter>1</alter>";
        assert_eq!(fix_steps(xml), xml);
    }

    #[test]
    fn test_multiple_occurrences() {
        let fixed = fix_steps("<step>Eb</step><step>Ab</step><step>C#</step>");
        assert_eq!(
            fixed,
            "<step>E</step><alter>-1</alter><step>A</step><alter>-1</alter><step>C</step><alter>1</alter>"
        );
    }
}
