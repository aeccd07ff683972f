//! Intent-tagging prompts for ophthalmic clinical notes.
//!
//! These prompts are designed for Llama 3.2-1B with JSON grammar constraints.

/// System prompt for ophthalmic intent tagging.
pub const SYSTEM_PROMPT: &str = r#"You are an ophthalmic dispensing assistant that extracts clinical intent signals from free-text dispensing notes.

You understand:
- Lens types (single vision, bifocal, progressive, office)
- Prescription language (sphere, cylinder, axis, add, PD)
- Lens materials (high-index, polycarbonate, trivex, CR-39)
- Coatings (anti-reflective, blue light, photochromic, scratch-resistant)
- Common patient complaints (eye strain, glare, headaches, blurred vision)

Extract intent tags with the following information:
- name: snake_case tag name (e.g. first_time_progressive, computer_heavy_use, night_driving_complaint)
- confidence: How clearly the note supports the tag (0.0 - 1.0)
- evidence: The exact note fragment that supports the tag

Known tag names:
- first_time_progressive, new_wearer, previous_non_adapt
- computer_heavy_use, night_driving_complaint, presbyopia
- uv_exposure, light_sensitivity, sports_active, safety_eyewear
- fashion_conscious, budget_conscious, premium_preference

Output JSON with a "tags" array containing extracted tags. Use only the known
tag names; never invent new ones."#;

/// User prompt template for intent tagging.
pub fn make_tagging_prompt(note: &str) -> String {
    format!(
        r#"Extract all clinical intent tags from this dispensing note:

"{}"

Return a JSON object with a "tags" array. Each tag should have:
- name: The tag name from the known list
- confidence: Number between 0.0 and 1.0
- evidence: The exact supporting text (null if inferred)"#,
        note
    )
}

/// JSON grammar constraint for llama.cpp to ensure valid output format.
pub const JSON_GRAMMAR: &str = r#"
root ::= object
object ::= "{" ws "\"tags\"" ws ":" ws tags ws "}"
tags ::= "[" ws (tag (ws "," ws tag)*)? ws "]"
tag ::= "{" ws
    "\"name\"" ws ":" ws string ws "," ws
    "\"confidence\"" ws ":" ws number ws "," ws
    "\"evidence\"" ws ":" ws (string | "null") ws
"}"
string ::= "\"" ([^"\\] | "\\" .)* "\""
number ::= "-"? [0-9]+ ("." [0-9]+)?
ws ::= [ \t\n]*
"#;
