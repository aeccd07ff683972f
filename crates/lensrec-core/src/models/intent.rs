//! Clinical intent models produced by the note extractor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A free-text clinical note with optional demographics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClinicalNote {
    /// Raw note text as entered by the dispenser
    pub text: String,
    /// Patient age in years, when recorded
    pub patient_age: Option<u32>,
    /// Patient occupation, when recorded
    pub occupation: Option<String>,
}

impl ClinicalNote {
    /// Create a note from raw text alone.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            patient_age: None,
            occupation: None,
        }
    }
}

/// The closed set of clinical signals the extractor can detect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    FirstTimeProgressive,
    NewWearer,
    PreviousNonAdapt,
    ComputerHeavyUse,
    NightDrivingComplaint,
    Presbyopia,
    UvExposure,
    LightSensitivity,
    SportsActive,
    SafetyEyewear,
    FashionConscious,
    BudgetConscious,
    PremiumPreference,
}

impl TagKind {
    /// Stable wire name, shared with corpus clinical-context keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::FirstTimeProgressive => "first_time_progressive",
            TagKind::NewWearer => "new_wearer",
            TagKind::PreviousNonAdapt => "previous_non_adapt",
            TagKind::ComputerHeavyUse => "computer_heavy_use",
            TagKind::NightDrivingComplaint => "night_driving_complaint",
            TagKind::Presbyopia => "presbyopia",
            TagKind::UvExposure => "uv_exposure",
            TagKind::LightSensitivity => "light_sensitivity",
            TagKind::SportsActive => "sports_active",
            TagKind::SafetyEyewear => "safety_eyewear",
            TagKind::FashionConscious => "fashion_conscious",
            TagKind::BudgetConscious => "budget_conscious",
            TagKind::PremiumPreference => "premium_preference",
        }
    }
}

/// A detected clinical signal with its confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentTag {
    pub kind: TagKind,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f64,
}

/// Patient complaints detectable from note text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Complaint {
    EyeStrain,
    Headaches,
    Glare,
    BlurredNearVision,
    BlurredDistanceVision,
    Dizziness,
    DryEyes,
}

impl Complaint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complaint::EyeStrain => "eye strain",
            Complaint::Headaches => "headaches",
            Complaint::Glare => "glare",
            Complaint::BlurredNearVision => "blurred near vision",
            Complaint::BlurredDistanceVision => "blurred distance vision",
            Complaint::Dizziness => "dizziness",
            Complaint::DryEyes => "dry eyes",
        }
    }
}

/// Clinical conditions flagged for the dispenser's attention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalFlag {
    Diabetes,
    Cataracts,
    Glaucoma,
    MacularDegeneration,
    Amblyopia,
}

impl ClinicalFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalFlag::Diabetes => "diabetes",
            ClinicalFlag::Cataracts => "cataracts",
            ClinicalFlag::Glaucoma => "glaucoma",
            ClinicalFlag::MacularDegeneration => "macular degeneration",
            ClinicalFlag::Amblyopia => "amblyopia",
        }
    }
}

/// Lens characteristics recommended from the extracted signals.
///
/// Field names double as catalog feature-map keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LensCharacteristics {
    pub soft_design: bool,
    pub premium: bool,
    pub blue_light: bool,
    pub anti_reflective: bool,
    pub anti_glare: bool,
    pub photochromic: bool,
    pub uv_protection: bool,
    pub impact_resistant: bool,
    pub anti_fatigue: bool,
}

impl LensCharacteristics {
    /// All characteristics as (feature key, recommended) pairs, in a fixed order.
    pub fn as_pairs(&self) -> [(&'static str, bool); 9] {
        [
            ("soft_design", self.soft_design),
            ("premium", self.premium),
            ("blue_light", self.blue_light),
            ("anti_reflective", self.anti_reflective),
            ("anti_glare", self.anti_glare),
            ("photochromic", self.photochromic),
            ("uv_protection", self.uv_protection),
            ("impact_resistant", self.impact_resistant),
            ("anti_fatigue", self.anti_fatigue),
        ]
    }

    /// Keys of the recommended (true) characteristics.
    pub fn recommended(&self) -> Vec<&'static str> {
        self.as_pairs()
            .into_iter()
            .filter(|(_, on)| *on)
            .map(|(key, _)| key)
            .collect()
    }

    /// Fraction of recommended characteristics a product feature map satisfies.
    ///
    /// Returns 0.0 when nothing is recommended, so it never inflates a score.
    pub fn satisfied_fraction(&self, features: &BTreeMap<String, bool>) -> f64 {
        let recommended = self.recommended();
        if recommended.is_empty() {
            return 0.0;
        }
        let satisfied = recommended
            .iter()
            .filter(|key| features.get(**key).copied().unwrap_or(false))
            .count();
        satisfied as f64 / recommended.len() as f64
    }
}

/// Output of the intent extractor; persisted once per order as an audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentExtraction {
    /// Unique record id
    pub id: String,
    /// Detected clinical signals, at most one per tag kind
    pub tags: Vec<IntentTag>,
    /// Lifestyle classification label
    pub lifestyle: String,
    /// Detected patient complaints
    pub complaints: Vec<Complaint>,
    /// Detected clinical flags
    pub clinical_flags: Vec<ClinicalFlag>,
    /// Recommended lens characteristics derived from the signals
    pub characteristics: LensCharacteristics,
    /// Deterministic one-paragraph summary of the extraction
    pub summary: String,
    /// Overall extraction confidence (0.0 - 1.0)
    pub overall_confidence: f64,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl IntentExtraction {
    /// True when a tag of the given kind was detected.
    pub fn has_tag(&self, kind: TagKind) -> bool {
        self.tags.iter().any(|t| t.kind == kind)
    }

    /// Tag wire names, for matching against corpus clinical-context keys.
    pub fn tag_names(&self) -> Vec<&'static str> {
        self.tags.iter().map(|t| t.kind.as_str()).collect()
    }
}
