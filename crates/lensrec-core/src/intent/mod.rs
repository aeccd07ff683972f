//! Intent extractor: free-text clinical notes to weighted clinical signals.
//!
//! The extractor is total over its input: malformed or empty text yields an
//! empty tag list and a floor confidence of 0.5, never an error.

mod lexicon;

pub use lexicon::*;

use crate::models::{
    ClinicalFlag, ClinicalNote, Complaint, IntentExtraction, IntentTag, LensCharacteristics,
    TagKind,
};

/// Tags at or above this confidence appear in the summary's key-signal list.
const SUMMARY_SIGNAL_THRESHOLD: f64 = 0.85;

/// Confidence reported when no tag at all was detected.
const NO_SIGNAL_CONFIDENCE: f64 = 0.5;

/// Rule-based extractor over the static lexicon.
pub struct IntentExtractor {
    lexicon: IntentLexicon,
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentExtractor {
    /// Create an extractor with the default lexicon.
    pub fn new() -> Self {
        Self {
            lexicon: IntentLexicon::new(),
        }
    }

    /// Extract clinical intent from a note.
    pub fn extract(&self, note: &ClinicalNote) -> IntentExtraction {
        let text = note.text.to_lowercase();
        let occupation = note
            .occupation
            .as_deref()
            .map(|o| o.to_lowercase())
            .unwrap_or_default();

        let mut tags = self.scan_tags(&text);

        // Demographic fallback: presbyopia onset without an explicit mention.
        if let Some(age) = note.patient_age {
            if age >= PRESBYOPIA_AGE && !tags.iter().any(|t| t.kind == TagKind::Presbyopia) {
                tags.push(IntentTag {
                    kind: TagKind::Presbyopia,
                    confidence: AGE_PRESBYOPIA_CONFIDENCE,
                });
            }
        }

        // Occupation inference only fills gaps the note text left.
        if !occupation.is_empty() {
            if self.lexicon.is_computer_occupation(&occupation)
                && !tags.iter().any(|t| t.kind == TagKind::ComputerHeavyUse)
            {
                tags.push(IntentTag {
                    kind: TagKind::ComputerHeavyUse,
                    confidence: OCCUPATION_SCREEN_CONFIDENCE,
                });
            }
            if self.lexicon.is_outdoor_occupation(&occupation)
                && !tags.iter().any(|t| t.kind == TagKind::UvExposure)
            {
                tags.push(IntentTag {
                    kind: TagKind::UvExposure,
                    confidence: OCCUPATION_UV_CONFIDENCE,
                });
            }
        }

        let scan_text = if occupation.is_empty() {
            text.clone()
        } else {
            format!("{} {}", text, occupation)
        };
        let lifestyle = self.classify_lifestyle(&scan_text);
        let complaints = self.scan_complaints(&text);
        let clinical_flags = self.scan_flags(&text);
        let characteristics = derive_characteristics(&tags, &complaints, &clinical_flags);
        let overall_confidence = overall_confidence(&tags, clinical_flags.len());
        let summary = build_summary(&lifestyle, &complaints, &clinical_flags, &tags);

        IntentExtraction {
            id: uuid::Uuid::new_v4().to_string(),
            tags,
            lifestyle,
            complaints,
            clinical_flags,
            characteristics,
            summary,
            overall_confidence,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Scan note text against the tag table; one tag per kind at most.
    fn scan_tags(&self, text: &str) -> Vec<IntentTag> {
        self.lexicon
            .tag_patterns()
            .iter()
            .filter(|pattern| pattern.needles.iter().any(|needle| text.contains(needle)))
            .map(|pattern| IntentTag {
                kind: pattern.kind,
                confidence: pattern.confidence,
            })
            .collect()
    }

    /// First matching lifestyle category wins.
    fn classify_lifestyle(&self, text: &str) -> String {
        self.lexicon
            .lifestyles()
            .iter()
            .find(|rule| rule.needles.iter().any(|needle| text.contains(needle)))
            .map(|rule| rule.label.to_string())
            .unwrap_or_else(|| DEFAULT_LIFESTYLE.to_string())
    }

    fn scan_complaints(&self, text: &str) -> Vec<Complaint> {
        self.lexicon
            .complaints()
            .iter()
            .filter(|(_, needles)| needles.iter().any(|needle| text.contains(needle)))
            .map(|(complaint, _)| *complaint)
            .collect()
    }

    fn scan_flags(&self, text: &str) -> Vec<ClinicalFlag> {
        self.lexicon
            .flags()
            .iter()
            .filter(|(_, needles)| needles.iter().any(|needle| text.contains(needle)))
            .map(|(flag, _)| *flag)
            .collect()
    }
}

/// Derive recommended characteristics from the detected signal sets.
fn derive_characteristics(
    tags: &[IntentTag],
    complaints: &[Complaint],
    flags: &[ClinicalFlag],
) -> LensCharacteristics {
    let has = |kind: TagKind| tags.iter().any(|t| t.kind == kind);
    let complains = |c: Complaint| complaints.contains(&c);
    let flagged = |f: ClinicalFlag| flags.contains(&f);

    let mut chars = LensCharacteristics::default();

    if has(TagKind::FirstTimeProgressive) || has(TagKind::NewWearer) || has(TagKind::PreviousNonAdapt)
    {
        chars.soft_design = true;
    }
    if has(TagKind::FirstTimeProgressive) || has(TagKind::NewWearer) || has(TagKind::PremiumPreference)
    {
        chars.premium = true;
    }
    if has(TagKind::ComputerHeavyUse) {
        chars.blue_light = true;
        chars.anti_reflective = true;
    }
    if has(TagKind::NightDrivingComplaint) || complains(Complaint::Glare) {
        chars.anti_glare = true;
        chars.anti_reflective = true;
    }
    if has(TagKind::LightSensitivity) || flagged(ClinicalFlag::Cataracts) {
        chars.anti_glare = true;
    }
    if has(TagKind::UvExposure) {
        chars.uv_protection = true;
        chars.photochromic = true;
    }
    if has(TagKind::LightSensitivity) {
        chars.photochromic = true;
    }
    if has(TagKind::SportsActive) || has(TagKind::SafetyEyewear) {
        chars.impact_resistant = true;
    }
    if complains(Complaint::EyeStrain) {
        chars.anti_fatigue = true;
    }

    chars
}

/// Mean tag confidence plus a small flag bonus, clamped to 1.0.
fn overall_confidence(tags: &[IntentTag], flag_count: usize) -> f64 {
    if tags.is_empty() {
        return NO_SIGNAL_CONFIDENCE;
    }
    let mean = tags.iter().map(|t| t.confidence).sum::<f64>() / tags.len() as f64;
    let bonus = (0.05 * flag_count as f64).min(0.15);
    (mean + bonus).min(1.0)
}

/// Deterministic extraction summary; byte-identical for identical input.
fn build_summary(
    lifestyle: &str,
    complaints: &[Complaint],
    flags: &[ClinicalFlag],
    tags: &[IntentTag],
) -> String {
    let complaint_list = if complaints.is_empty() {
        "none".to_string()
    } else {
        complaints
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let flag_list = if flags.is_empty() {
        "none".to_string()
    } else {
        flags.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
    };
    let signals: Vec<&str> = tags
        .iter()
        .filter(|t| t.confidence >= SUMMARY_SIGNAL_THRESHOLD)
        .map(|t| t.kind.as_str())
        .collect();
    let signal_list = if signals.is_empty() {
        "none".to_string()
    } else {
        signals.join(", ")
    };

    format!(
        "{}. Complaints: {}. Clinical flags: {}. Key signals: {}.",
        lifestyle, complaint_list, flag_list, signal_list
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn extract(text: &str) -> IntentExtraction {
        IntentExtractor::new().extract(&ClinicalNote::new(text))
    }

    #[test]
    fn test_new_progressive_wearer_scenario() {
        let mut note = ClinicalNote::new(
            "first-time progressive wearer, works on computer 8+ hrs/day, reports eye strain, complains of glare driving at night",
        );
        note.patient_age = Some(48);
        let result = IntentExtractor::new().extract(&note);

        let confidence_of = |kind: TagKind| {
            result
                .tags
                .iter()
                .find(|t| t.kind == kind)
                .map(|t| t.confidence)
        };
        assert_eq!(confidence_of(TagKind::FirstTimeProgressive), Some(0.95));
        assert_eq!(confidence_of(TagKind::ComputerHeavyUse), Some(0.90));
        assert_eq!(confidence_of(TagKind::NightDrivingComplaint), Some(0.90));
        // Age 48 with no explicit mention infers presbyopia at the fallback level.
        assert_eq!(confidence_of(TagKind::Presbyopia), Some(0.70));

        assert!(result.characteristics.soft_design);
        assert!(result.characteristics.blue_light);
        assert!(result.characteristics.anti_glare);
        assert!(result.characteristics.anti_reflective);
        assert!(result.characteristics.premium);

        assert_eq!(result.lifestyle, "Office / digital lifestyle");
        assert!(result.complaints.contains(&Complaint::EyeStrain));
        assert!(result.complaints.contains(&Complaint::Glare));
    }

    #[test]
    fn test_empty_note_yields_floor_confidence() {
        let result = extract("");
        assert!(result.tags.is_empty());
        assert_eq!(result.overall_confidence, 0.5);
        assert_eq!(result.lifestyle, DEFAULT_LIFESTYLE);
    }

    #[test]
    fn test_tag_recorded_once_despite_multiple_needles() {
        let result = extract("uses a computer and a laptop and stares at a monitor");
        let count = result
            .tags
            .iter()
            .filter(|t| t.kind == TagKind::ComputerHeavyUse)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_age_fallback_not_applied_when_text_detects_presbyopia() {
        let mut note = ClinicalNote::new("patient reports presbyopia symptoms");
        note.patient_age = Some(55);
        let result = IntentExtractor::new().extract(&note);
        let presbyopia: Vec<_> = result
            .tags
            .iter()
            .filter(|t| t.kind == TagKind::Presbyopia)
            .collect();
        assert_eq!(presbyopia.len(), 1);
        assert_eq!(presbyopia[0].confidence, 0.85);
    }

    #[test]
    fn test_occupation_inference_fills_gap_only() {
        let mut note = ClinicalNote::new("no relevant complaints");
        note.occupation = Some("Software Developer".into());
        let result = IntentExtractor::new().extract(&note);
        let tag = result
            .tags
            .iter()
            .find(|t| t.kind == TagKind::ComputerHeavyUse)
            .unwrap();
        assert_eq!(tag.confidence, OCCUPATION_SCREEN_CONFIDENCE);

        // A note that already mentions screens keeps the stronger text confidence.
        let mut note = ClinicalNote::new("heavy computer use reported");
        note.occupation = Some("Software Developer".into());
        let result = IntentExtractor::new().extract(&note);
        let tag = result
            .tags
            .iter()
            .find(|t| t.kind == TagKind::ComputerHeavyUse)
            .unwrap();
        assert_eq!(tag.confidence, 0.90);
    }

    #[test]
    fn test_outdoor_occupation_infers_uv_need() {
        let mut note = ClinicalNote::new("routine exam");
        note.occupation = Some("construction worker".into());
        let result = IntentExtractor::new().extract(&note);
        let tag = result.tags.iter().find(|t| t.kind == TagKind::UvExposure).unwrap();
        assert_eq!(tag.confidence, OCCUPATION_UV_CONFIDENCE);
        assert!(result.characteristics.uv_protection);
    }

    #[test]
    fn test_flag_bonus_capped() {
        // Three flags give the full 0.15 bonus ceiling.
        let result = extract(
            "diabetic patient with early cataract and glaucoma history, heavy computer use",
        );
        assert_eq!(result.clinical_flags.len(), 3);
        let expected = (0.90 + 0.15_f64).min(1.0);
        assert!((result.overall_confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn test_summary_deterministic() {
        let text = "first-time progressive wearer, computer work, eye strain";
        let a = extract(text);
        let b = extract(text);
        assert_eq!(a.summary, b.summary);
        assert!(a.summary.contains("Key signals: first_time_progressive, computer_heavy_use."));
    }

    #[test]
    fn test_lifestyle_priority_order() {
        // "computer" and "driving" both present: the office category is scanned first.
        let result = extract("computer work during the day, driving in the evening");
        assert_eq!(result.lifestyle, "Office / digital lifestyle");
    }

    proptest! {
        #[test]
        fn prop_confidence_bounded(text in ".{0,400}") {
            let result = extract(&text);
            prop_assert!(result.overall_confidence >= 0.0);
            prop_assert!(result.overall_confidence <= 1.0);
            for tag in &result.tags {
                prop_assert!(tag.confidence >= 0.0 && tag.confidence <= 1.0);
            }
        }

        #[test]
        fn prop_no_duplicate_tags(text in ".{0,400}") {
            let result = extract(&text);
            let mut seen = std::collections::HashSet::new();
            for tag in &result.tags {
                prop_assert!(seen.insert(tag.kind), "duplicate tag {:?}", tag.kind);
            }
        }
    }
}
