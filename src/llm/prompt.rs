//! Prompt assembly
//!
//! Builds the single text prompt sent to the completion endpoint: fixed
//! instructions, the candidate schema, the allowed action names, a block of
//! few-shot examples, then the caller's instruction, the score metadata,
//! and the MusicXML fragment.

use crate::actions::ActionKind;
use crate::score::GlobalInfo;

const FEW_SHOT_EXAMPLES: &str = r#"# FEW-SHOT EXAMPLES (do NOT repeat these in the final response)
# Example 1: Deterministic transpose
Instruction: "Transpose measures 5-8 up 2 semitones"
Global info: key=C major, time_signature=4/4, tempo=100
Expected JSON:
{
  "candidates": [
    {"id": "v1", "action": "transpose", "params": {"semitones": 2}},
    {"id": "v2", "action": "transpose", "params": {"semitones": 3}}
  ]
}

# Example 2: Creative "joyful" mapping
Instruction: "Make measures 1-4 more joyful"
Global info: key=C major, time_signature=4/4, tempo=100
Expected JSON:
{
  "candidates": [
    {
      "id": "v1",
      "action": "change_tempo",
      "params": {"ratio": 1.12},
      "secondary_actions": [
        {"action": "adjust_rhythm", "params": {"scale": 0.85}},
        {"action": "add_articulation", "params": {"style": "staccato"}}
      ]
    },
    {
      "id": "v2",
      "action": "adjust_rhythm",
      "params": {"scale": 0.8},
      "secondary_actions": [
        {"action": "modify_dynamics", "params": {"dynamics_shift": 1}}
      ]
    }
  ]
}

# Example 3: Compound request (faster + richer harmony)
Instruction: "Make the whole song 25% faster and add seventh chords for a modern sound"
Global info: key=A minor, time_signature=4/4, tempo=90
Expected JSON:
{
  "candidates": [
    {
      "id": "v1",
      "action": "change_tempo",
      "params": {"ratio": 1.25},
      "secondary_actions": [
        {"action": "add_seventh_chords", "params": {"chord_type": "minor seventh"}}
      ]
    },
    {
      "id": "v2",
      "action": "change_tempo",
      "params": {"ratio": 1.25},
      "secondary_actions": [
        {"action": "add_chord_tone", "params": {"interval": "M3"}},
        {"action": "adjust_rhythm", "params": {"scale": 0.9}}
      ]
    }
  ]
}

# Example 4: Calmer and in minor
Instruction: "Change this piece to a minor key, slow it down by 30%, and reduce the dynamics"
Global info: key=G major, time_signature=4/4, tempo=100
Expected JSON:
{
  "candidates": [
    {
      "id": "v1",
      "action": "change_mode",
      "params": {"from": "major", "to": "minor"},
      "secondary_actions": [
        {"action": "change_tempo", "params": {"ratio": 0.7}},
        {"action": "modify_dynamics", "params": {"dynamics_shift": -2}}
      ]
    },
    {
      "id": "v2",
      "action": "change_tempo",
      "params": {"ratio": 0.7},
      "secondary_actions": [
        {"action": "modify_dynamics", "params": {"dynamics_shift": -1}},
        {"action": "adjust_rhythm", "params": {"scale": 1.1}}
      ]
    }
  ]
}

# Example 5: Octave shift
Instruction: "play one octave lower"
Global info: key=C major, time_signature=4/4, tempo=100
Expected JSON:
{
  "candidates": [
    {"id": "v1", "action": "transpose", "params": {"semitones": -12}},
    {"id": "v2", "action": "transpose", "params": {"semitones": -5}}
  ]
}

# Example 6: Ambiguous request -> clarify
Instruction: "Make it heavier"
Global info: key=G minor, time_signature=4/4, tempo=80
Expected JSON:
{"clarify": "Do you mean heavier in texture (add chords) or heavier in rhythm (accent downbeats)?"}
# END FEW-SHOT
"#;

/// Build the full prompt for one edit request.
pub fn build_prompt(instruction: &str, global_info: &GlobalInfo, snippet_xml: &str) -> String {
    let action_names: Vec<&str> = ActionKind::ALL.iter().map(|k| k.name()).collect();
    let action_list = action_names.join(", ");

    let mut prompt = String::new();
    prompt.push_str(
        "You are an expert MusicXML editor and arranger. You will receive three inputs \
         concatenated below:\n\
         1) a single-line Instruction describing the user's intent,\n\
         2) Global info in the form key=..., time_signature=..., tempo=...,\n\
         3) a MusicXML fragment (a valid <score-partwise> document).\n\n",
    );
    prompt.push_str(
        "REQUIREMENTS (follow EXACTLY):\n\
         - OUTPUT MUST BE EXACTLY ONE JSON OBJECT and NOTHING ELSE (no explanations, no markdown).\n\
         - The top-level JSON must contain either:\n\
           a) a \"candidates\" key whose value is an array of exactly TWO candidate objects, or\n\
           b) a single {\"clarify\": \"<one short clarifying question>\"} object if the \
         instruction is ambiguous.\n\
         - Each candidate object must include at minimum: \"action\" and \"params\".\n\
         - Optional \"secondary_actions\" is an ordered array of {\"action\", \"params\"} objects \
         applied after the main action.\n",
    );
    prompt.push_str(&format!(
        "- Every \"action\" value, including those inside \"secondary_actions\", MUST be one of \
         the following nine strings ONLY: {}.\n\
         - Do not invent or output any other action names. If no action fits, choose the closest \
         valid one.\n\n",
        action_list
    ));
    prompt.push_str(
        "CANDIDATE SCHEMA:\n\
         {\n\
           \"id\": \"<string>\",\n\
           \"action\": \"<one of the nine actions>\",\n\
           \"params\": { ... action-specific parameters ... },\n\
           \"secondary_actions\": [ {\"action\": \"...\", \"params\": {...}}, ... ]\n\
         }\n\n",
    );
    prompt.push_str("Below are few-shot examples to follow (do not output them):\n");
    prompt.push_str(FEW_SHOT_EXAMPLES);
    prompt.push_str(
        "\nNow produce the response for the following inputs. Apply every modification the \
         Instruction asks for; partial coverage is not allowed.\n",
    );
    prompt.push_str("\nInstruction: ");
    prompt.push_str(instruction.trim());
    prompt.push_str("\nGlobal info: ");
    prompt.push_str(&global_info.prompt_line());
    prompt.push_str("\nMusicXML snippet:\n");
    prompt.push_str(snippet_xml.trim());
    prompt.push_str(&format!(
        "\n\nReminder: every \"action\" value must be strictly one of: {}. \
         Output exactly two candidates unless you are asking to clarify.\n\
         # END OF INPUT - OUTPUT JSON ONLY\n",
        action_list
    ));
    prompt
}
