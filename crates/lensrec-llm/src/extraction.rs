//! Intent tag extraction from LLM output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("LLM inference error: {0}")]
    Inference(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Raw tagging output from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingOutput {
    pub tags: Vec<RawIntentTag>,
}

/// A raw intent tag extracted by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIntentTag {
    pub name: String,
    pub confidence: f64,
    pub evidence: Option<String>,
}

/// Parse LLM output JSON into structured tags.
pub fn parse_tagging_output(json: &str) -> ExtractionResult<TaggingOutput> {
    // Try to find JSON in the response (in case the LLM adds extra text)
    let json_start = json
        .find('{')
        .ok_or_else(|| ExtractionError::InvalidFormat("No JSON object found in response".into()))?;
    let json_end = json
        .rfind('}')
        .ok_or_else(|| ExtractionError::InvalidFormat("No closing brace found in response".into()))?;

    let json_slice = &json[json_start..=json_end];
    let output: TaggingOutput = serde_json::from_str(json_slice)?;

    Ok(output)
}

/// Clean raw tags for downstream use: lowercase names, clamp confidences to
/// [0, 1], and keep the highest-confidence entry per name.
pub fn normalize_tags(output: &TaggingOutput) -> Vec<RawIntentTag> {
    let mut cleaned: Vec<RawIntentTag> = Vec::new();

    for tag in &output.tags {
        let name = tag.name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        let confidence = tag.confidence.clamp(0.0, 1.0);

        match cleaned.iter_mut().find(|t| t.name == name) {
            Some(existing) => {
                if confidence > existing.confidence {
                    existing.confidence = confidence;
                    existing.evidence = tag.evidence.clone();
                }
            }
            None => cleaned.push(RawIntentTag {
                name,
                confidence,
                evidence: tag.evidence.clone(),
            }),
        }
    }

    cleaned
}
