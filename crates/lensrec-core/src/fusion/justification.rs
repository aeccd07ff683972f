//! Deterministic justification text assembly.
//!
//! Fixed per-tier templates parameterized by observed rates and matched tag
//! names. No generative text: identical inputs produce identical bytes.

use crate::models::{ConfigurationScore, IntentTag, TagJustification, TagKind, Tier};

/// Clinical justification for a tier's configuration.
pub fn clinical_justification(tier: Tier, score: &ConfigurationScore) -> String {
    let descriptor = score.configuration.describe();
    let success_pct = score.success_rate * 100.0;
    match tier {
        Tier::Best => format!(
            "Top-ranked configuration: {} with a {:.0}% historical success rate across {} fitted orders.",
            descriptor, success_pct, score.sample_count
        ),
        Tier::Better => format!(
            "Strong alternative: {} with a {:.0}% historical success rate; balances performance and value.",
            descriptor, success_pct
        ),
        Tier::Good => format!(
            "Dependable value option: {} with a {:.0}% historical success rate in comparable fittings.",
            descriptor, success_pct
        ),
    }
}

/// Lifestyle justification for a tier.
pub fn lifestyle_justification(tier: Tier, lifestyle: &str) -> String {
    match tier {
        Tier::Best => format!(
            "Matched to the patient's {} with the strongest available design.",
            lowercase_first(lifestyle)
        ),
        Tier::Better => format!(
            "Fits the patient's {} while keeping the price moderate.",
            lowercase_first(lifestyle)
        ),
        Tier::Good => format!(
            "Covers the essentials of the patient's {}.",
            lowercase_first(lifestyle)
        ),
    }
}

/// One justification line per detected tag, in detection order.
pub fn tag_justifications(tags: &[IntentTag]) -> Vec<TagJustification> {
    tags.iter()
        .map(|tag| TagJustification {
            tag: tag.kind.as_str().to_string(),
            justification: tag_line(tag.kind).to_string(),
        })
        .collect()
}

fn tag_line(kind: TagKind) -> &'static str {
    match kind {
        TagKind::FirstTimeProgressive => {
            "A soft progressive design eases first-time adaptation."
        }
        TagKind::NewWearer => "A forgiving design suits a first pair of glasses.",
        TagKind::PreviousNonAdapt => {
            "A softer corridor reduces the chance of repeat non-adaptation."
        }
        TagKind::ComputerHeavyUse => "Blue-light filtering reduces screen fatigue.",
        TagKind::NightDrivingComplaint => {
            "Anti-glare treatment improves night-driving comfort."
        }
        TagKind::Presbyopia => "The add power supports comfortable near work.",
        TagKind::UvExposure => "UV treatment protects the eyes during outdoor exposure.",
        TagKind::LightSensitivity => "Light-adaptive tinting eases light sensitivity.",
        TagKind::SportsActive => "Impact-resistant material stands up to active use.",
        TagKind::SafetyEyewear => "Impact-rated material meets safety eyewear needs.",
        TagKind::FashionConscious => "Thinner lens options keep the frame profile slim.",
        TagKind::BudgetConscious => "Value-tier options keep the total cost down.",
        TagKind::PremiumPreference => "Premium materials and coatings maximize clarity.",
    }
}

fn lowercase_first(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LensConfiguration;

    fn score() -> ConfigurationScore {
        ConfigurationScore {
            configuration: LensConfiguration::new("progressive", "high-index", "anti-reflective"),
            success_rate: 0.9005,
            nonadapt_rate: 0.0607,
            remake_rate: 0.0388,
            sample_count: 412,
            clinical_score: 48.2,
            clinical_context: vec![],
        }
    }

    #[test]
    fn test_tier_templates_differ() {
        let s = score();
        let best = clinical_justification(Tier::Best, &s);
        let better = clinical_justification(Tier::Better, &s);
        let good = clinical_justification(Tier::Good, &s);
        assert_ne!(best, better);
        assert_ne!(better, good);
        assert!(best.contains("90% historical success rate across 412 fitted orders"));
    }

    #[test]
    fn test_deterministic() {
        let s = score();
        assert_eq!(
            clinical_justification(Tier::Best, &s),
            clinical_justification(Tier::Best, &s)
        );
        assert_eq!(
            lifestyle_justification(Tier::Good, "Office / digital lifestyle"),
            lifestyle_justification(Tier::Good, "Office / digital lifestyle")
        );
    }

    #[test]
    fn test_lifestyle_lowercased_inline() {
        let text = lifestyle_justification(Tier::Best, "Office / digital lifestyle");
        assert!(text.contains("office / digital lifestyle"));
    }

    #[test]
    fn test_every_tag_has_a_line() {
        let tags: Vec<IntentTag> = [
            TagKind::FirstTimeProgressive,
            TagKind::NewWearer,
            TagKind::PreviousNonAdapt,
            TagKind::ComputerHeavyUse,
            TagKind::NightDrivingComplaint,
            TagKind::Presbyopia,
            TagKind::UvExposure,
            TagKind::LightSensitivity,
            TagKind::SportsActive,
            TagKind::SafetyEyewear,
            TagKind::FashionConscious,
            TagKind::BudgetConscious,
            TagKind::PremiumPreference,
        ]
        .into_iter()
        .map(|kind| IntentTag { kind, confidence: 0.9 })
        .collect();

        let lines = tag_justifications(&tags);
        assert_eq!(lines.len(), tags.len());
        assert!(lines.iter().all(|l| !l.justification.is_empty()));
    }
}
