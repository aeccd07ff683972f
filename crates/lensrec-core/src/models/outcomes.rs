//! Historical-outcomes corpus models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A (lens type, material, coating) triple, optionally qualified by wrap angle.
///
/// Fields hold canonical terms (see [`crate::normalize`]); `key()` is the
/// corpus lookup key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LensConfiguration {
    pub lens_type: String,
    pub material: String,
    pub coating: String,
    /// Average wrap angle recorded for this configuration, degrees
    pub wrap_angle: Option<f64>,
}

impl LensConfiguration {
    /// Create a configuration from its three terms.
    pub fn new(
        lens_type: impl Into<String>,
        material: impl Into<String>,
        coating: impl Into<String>,
    ) -> Self {
        Self {
            lens_type: lens_type.into(),
            material: material.into(),
            coating: coating.into(),
            wrap_angle: None,
        }
    }

    /// Corpus key: `type|material|coating`.
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.lens_type, self.material, self.coating)
    }

    /// Human-readable descriptor for justification text.
    pub fn describe(&self) -> String {
        format!("{} {} with {}", self.lens_type, self.material, self.coating)
    }
}

/// A recorded dispensing outcome for one order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LensOutcome {
    /// Patient adapted and kept the lenses
    Success,
    /// Patient failed to adapt
    NonAdapt,
    /// Lenses were remade
    Remake,
}

impl LensOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LensOutcome::Success => "success",
            LensOutcome::NonAdapt => "non_adapt",
            LensOutcome::Remake => "remake",
        }
    }
}

/// A named pattern stored with a configuration's corpus row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternInsight {
    /// Whether the pattern currently applies to new orders
    pub applicable: bool,
    /// Non-adapt rate observed within this pattern
    pub nonadapt_rate: f64,
}

/// One corpus row: aggregate outcomes for a configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    pub configuration: LensConfiguration,
    /// Total recorded orders for this configuration
    pub total_orders: u64,
    pub success_count: u64,
    pub nonadapt_count: u64,
    pub remake_count: u64,
    /// success_count / total_orders
    pub success_rate: f64,
    /// nonadapt_count / total_orders
    pub nonadapt_rate: f64,
    /// remake_count / total_orders
    pub remake_rate: f64,
    /// Clinical-context keys this configuration was dispensed under
    pub clinical_context: Vec<String>,
    /// Context keys this configuration historically serves well
    pub good_for: Vec<String>,
    /// Context keys this configuration historically serves poorly
    pub worst_for: Vec<String>,
    /// Named pattern insights embedded in the row
    pub pattern_insights: BTreeMap<String, PatternInsight>,
}

impl OutcomeRecord {
    /// A fresh row seeded with a single outcome.
    pub fn first_seen(configuration: LensConfiguration, outcome: LensOutcome) -> Self {
        let (s, n, r) = match outcome {
            LensOutcome::Success => (1, 0, 0),
            LensOutcome::NonAdapt => (0, 1, 0),
            LensOutcome::Remake => (0, 0, 1),
        };
        Self {
            configuration,
            total_orders: 1,
            success_count: s,
            nonadapt_count: n,
            remake_count: r,
            success_rate: s as f64,
            nonadapt_rate: n as f64,
            remake_rate: r as f64,
            clinical_context: Vec::new(),
            good_for: Vec::new(),
            worst_for: Vec::new(),
            pattern_insights: BTreeMap::new(),
        }
    }
}

/// The pattern matcher's verdict on one configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigurationScore {
    pub configuration: LensConfiguration,
    pub success_rate: f64,
    pub nonadapt_rate: f64,
    pub remake_rate: f64,
    /// Orders backing the rates
    pub sample_count: u64,
    /// Derived clinical score (rule-weighted, unbounded)
    pub clinical_score: f64,
    /// Context keys carried from the corpus row, used for fusion re-ranking
    pub clinical_context: Vec<String>,
}

/// A named risk contributor with optional mitigation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactor {
    pub factor: String,
    /// Estimated non-adapt risk increase (0.0 - 1.0)
    pub risk_increase: f64,
    pub mitigation: Option<String>,
}

/// A clinical pattern surfaced from the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalPattern {
    pub name: String,
    pub nonadapt_rate: f64,
    /// Key of the configuration the pattern came from
    pub configuration_key: String,
}

/// Full output of the outcome pattern matcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeAnalysis {
    /// Eligible configurations, best first, at most ten
    pub ranked_configurations: Vec<ConfigurationScore>,
    /// Applicable patterns, worst non-adapt rate first, at most five
    pub clinical_patterns: Vec<ClinicalPattern>,
    /// Prescription-derived risk factors
    pub risk_factors: Vec<RiskFactor>,
    /// Deterministic analysis summary
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_key() {
        let cfg = LensConfiguration::new("progressive", "high-index", "anti-reflective");
        assert_eq!(cfg.key(), "progressive|high-index|anti-reflective");
        assert_eq!(cfg.describe(), "progressive high-index with anti-reflective");
    }

    #[test]
    fn test_first_seen_record() {
        let cfg = LensConfiguration::new("bifocal", "cr-39", "none");
        let rec = OutcomeRecord::first_seen(cfg, LensOutcome::NonAdapt);
        assert_eq!(rec.total_orders, 1);
        assert_eq!(rec.nonadapt_count, 1);
        assert_eq!(rec.success_count, 0);
        assert_eq!(rec.nonadapt_rate, 1.0);
        assert_eq!(rec.success_rate, 0.0);
    }
}
