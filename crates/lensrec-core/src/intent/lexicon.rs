//! Static keyword tables for intent extraction.
//!
//! All tables are immutable data built once per extractor; the scan order of
//! every table is fixed so extraction output is reproducible.

use crate::models::{ClinicalFlag, Complaint, TagKind};

/// One detectable tag: needles scanned in order, first hit wins.
pub struct TagPattern {
    pub kind: TagKind,
    /// Base confidence assigned when a needle matches
    pub confidence: f64,
    /// Case-insensitive substrings that signal this tag
    pub needles: &'static [&'static str],
}

/// A lifestyle category with its trigger keywords.
pub struct LifestyleRule {
    pub label: &'static str,
    pub needles: &'static [&'static str],
}

/// The lexicon backing the intent extractor.
pub struct IntentLexicon {
    tag_patterns: Vec<TagPattern>,
    lifestyles: Vec<LifestyleRule>,
    complaints: Vec<(Complaint, &'static [&'static str])>,
    flags: Vec<(ClinicalFlag, &'static [&'static str])>,
    computer_occupations: Vec<&'static str>,
    outdoor_occupations: Vec<&'static str>,
}

/// Confidence for a screen-use tag inferred from occupation alone.
pub const OCCUPATION_SCREEN_CONFIDENCE: f64 = 0.75;

/// Confidence for a UV-protection tag inferred from occupation alone.
pub const OCCUPATION_UV_CONFIDENCE: f64 = 0.80;

/// Confidence for presbyopia inferred from age alone.
pub const AGE_PRESBYOPIA_CONFIDENCE: f64 = 0.70;

/// Age at which presbyopia is inferred when the note is silent.
pub const PRESBYOPIA_AGE: u32 = 40;

/// Lifestyle label used when no category matches.
pub const DEFAULT_LIFESTYLE: &str = "General lifestyle";

impl Default for IntentLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentLexicon {
    /// Build the default lexicon.
    pub fn new() -> Self {
        Self {
            tag_patterns: Self::default_tag_patterns(),
            lifestyles: Self::default_lifestyles(),
            complaints: Self::default_complaints(),
            flags: Self::default_flags(),
            computer_occupations: vec![
                "developer",
                "programmer",
                "software",
                "accountant",
                "analyst",
                "designer",
                "architect",
                "writer",
                "editor",
                "office",
                "clerk",
                "engineer",
            ],
            outdoor_occupations: vec![
                "construction",
                "farmer",
                "farm",
                "landscap",
                "fisherman",
                "builder",
                "roofer",
                "welder",
                "lineman",
                "surveyor",
                "outdoor",
            ],
        }
    }

    pub fn tag_patterns(&self) -> &[TagPattern] {
        &self.tag_patterns
    }

    pub fn lifestyles(&self) -> &[LifestyleRule] {
        &self.lifestyles
    }

    pub fn complaints(&self) -> &[(Complaint, &'static [&'static str])] {
        &self.complaints
    }

    pub fn flags(&self) -> &[(ClinicalFlag, &'static [&'static str])] {
        &self.flags
    }

    /// True when an occupation string reads as screen-heavy work.
    pub fn is_computer_occupation(&self, occupation_lower: &str) -> bool {
        self.computer_occupations
            .iter()
            .any(|needle| occupation_lower.contains(needle))
    }

    /// True when an occupation string reads as outdoor or industrial work.
    pub fn is_outdoor_occupation(&self, occupation_lower: &str) -> bool {
        self.outdoor_occupations
            .iter()
            .any(|needle| occupation_lower.contains(needle))
    }

    fn default_tag_patterns() -> Vec<TagPattern> {
        vec![
            TagPattern {
                kind: TagKind::FirstTimeProgressive,
                confidence: 0.95,
                needles: &[
                    "first-time progressive",
                    "first time progressive",
                    "new to progressive",
                    "never worn progressive",
                    "first progressive",
                ],
            },
            TagPattern {
                kind: TagKind::NewWearer,
                confidence: 0.85,
                needles: &[
                    "first pair of glasses",
                    "new wearer",
                    "never worn glasses",
                    "first prescription",
                ],
            },
            TagPattern {
                kind: TagKind::PreviousNonAdapt,
                confidence: 0.90,
                needles: &[
                    "could not adapt",
                    "couldn't adapt",
                    "failed to adapt",
                    "returned progressives",
                    "gave up on progressives",
                    "non-adapt history",
                ],
            },
            TagPattern {
                kind: TagKind::ComputerHeavyUse,
                confidence: 0.90,
                needles: &[
                    "computer",
                    "screen time",
                    "screens all day",
                    "monitor",
                    "digital device",
                    "laptop",
                ],
            },
            TagPattern {
                kind: TagKind::NightDrivingComplaint,
                confidence: 0.90,
                needles: &[
                    "driving at night",
                    "night driving",
                    "glare when driving",
                    "headlight glare",
                    "halos at night",
                ],
            },
            TagPattern {
                kind: TagKind::Presbyopia,
                confidence: 0.85,
                needles: &[
                    "presbyopia",
                    "trouble reading",
                    "difficulty reading",
                    "arms too short",
                    "reading glasses",
                    "small print",
                ],
            },
            TagPattern {
                kind: TagKind::UvExposure,
                confidence: 0.80,
                needles: &[
                    "outdoors",
                    "outdoor",
                    "sun exposure",
                    "sunlight",
                    "uv exposure",
                    "fishing",
                    "gardening",
                ],
            },
            TagPattern {
                kind: TagKind::LightSensitivity,
                confidence: 0.80,
                needles: &[
                    "light sensitive",
                    "light sensitivity",
                    "photophobia",
                    "bothered by bright light",
                ],
            },
            TagPattern {
                kind: TagKind::SportsActive,
                confidence: 0.80,
                needles: &["sports", "athletic", "running", "cycling", "tennis", "basketball"],
            },
            TagPattern {
                kind: TagKind::SafetyEyewear,
                confidence: 0.85,
                needles: &[
                    "safety glasses",
                    "safety rated",
                    "workshop",
                    "machining",
                    "impact protection",
                ],
            },
            TagPattern {
                kind: TagKind::FashionConscious,
                confidence: 0.70,
                needles: &["stylish", "fashionable", "thin lenses", "appearance matters"],
            },
            TagPattern {
                kind: TagKind::BudgetConscious,
                confidence: 0.75,
                needles: &["budget", "affordable", "inexpensive", "lowest cost", "cost conscious"],
            },
            TagPattern {
                kind: TagKind::PremiumPreference,
                confidence: 0.75,
                needles: &["premium", "best available", "top of the line", "no compromise"],
            },
        ]
    }

    fn default_lifestyles() -> Vec<LifestyleRule> {
        // Priority order: first matching category wins.
        vec![
            LifestyleRule {
                label: "Office / digital lifestyle",
                needles: &["computer", "office", "desk", "screen", "laptop", "monitor"],
            },
            LifestyleRule {
                label: "Outdoor / active lifestyle",
                needles: &["outdoor", "outdoors", "sports", "hiking", "running", "cycling", "active"],
            },
            LifestyleRule {
                label: "Driving-focused lifestyle",
                needles: &["driving", "driver", "commute", "truck"],
            },
            LifestyleRule {
                label: "Reading-focused lifestyle",
                needles: &["reading", "books", "study", "sewing", "crafts"],
            },
        ]
    }

    fn default_complaints() -> Vec<(Complaint, &'static [&'static str])> {
        vec![
            (Complaint::EyeStrain, &["eye strain", "eyestrain", "tired eyes", "eye fatigue"]),
            (Complaint::Headaches, &["headache"]),
            (Complaint::Glare, &["glare"]),
            (
                Complaint::BlurredNearVision,
                &["blurry up close", "blurry near", "blurred near", "can't focus up close"],
            ),
            (
                Complaint::BlurredDistanceVision,
                &["blurry far", "blurry at distance", "blurred distance"],
            ),
            (Complaint::Dizziness, &["dizzy", "dizziness", "vertigo"]),
            (Complaint::DryEyes, &["dry eyes", "dry eye"]),
        ]
    }

    fn default_flags() -> Vec<(ClinicalFlag, &'static [&'static str])> {
        vec![
            (ClinicalFlag::Diabetes, &["diabetes", "diabetic"]),
            (ClinicalFlag::Cataracts, &["cataract"]),
            (ClinicalFlag::Glaucoma, &["glaucoma"]),
            (ClinicalFlag::MacularDegeneration, &["macular degeneration", "macular"]),
            (ClinicalFlag::Amblyopia, &["amblyopia", "lazy eye"]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_patterns_have_valid_confidence() {
        let lexicon = IntentLexicon::new();
        for pattern in lexicon.tag_patterns() {
            assert!(pattern.confidence > 0.0 && pattern.confidence <= 1.0);
            assert!(!pattern.needles.is_empty());
        }
    }

    #[test]
    fn test_tag_patterns_unique_kinds() {
        let lexicon = IntentLexicon::new();
        let mut seen = std::collections::HashSet::new();
        for pattern in lexicon.tag_patterns() {
            assert!(seen.insert(pattern.kind), "duplicate pattern for {:?}", pattern.kind);
        }
    }

    #[test]
    fn test_occupation_classification() {
        let lexicon = IntentLexicon::new();
        assert!(lexicon.is_computer_occupation("software developer"));
        assert!(lexicon.is_computer_occupation("staff accountant"));
        assert!(!lexicon.is_computer_occupation("florist"));
        assert!(lexicon.is_outdoor_occupation("construction foreman"));
        assert!(lexicon.is_outdoor_occupation("landscaper"));
        assert!(!lexicon.is_outdoor_occupation("librarian"));
    }
}
