//! Final recommendation models persisted per order.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::catalog::Tier;

/// One (tag, justification) pair attached to a tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagJustification {
    /// Tag wire name
    pub tag: String,
    pub justification: String,
}

/// One Good/Better/Best entry in the final output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationTier {
    pub tier: Tier,
    /// Lens descriptor, e.g. "progressive high-index"
    pub lens_descriptor: String,
    /// Coating descriptor, e.g. "anti-reflective"
    pub coating_descriptor: String,
    /// Product feature keys that are enabled
    pub features: Vec<String>,
    /// Selected product
    pub sku: String,
    pub product_name: String,
    pub retail_price: f64,
    /// Catalog match score (0.0 - 1.0)
    pub match_score: f64,
    pub clinical_justification: String,
    pub lifestyle_justification: String,
    pub tag_justifications: Vec<TagJustification>,
}

/// Acceptance status of a persisted recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Pending,
    Accepted,
    Rejected,
    Customized,
}

impl RecommendationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Pending => "pending",
            RecommendationStatus::Accepted => "accepted",
            RecommendationStatus::Rejected => "rejected",
            RecommendationStatus::Customized => "customized",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RecommendationStatus::Pending),
            "accepted" => Some(RecommendationStatus::Accepted),
            "rejected" => Some(RecommendationStatus::Rejected),
            "customized" => Some(RecommendationStatus::Customized),
            _ => None,
        }
    }
}

/// Analysis metadata carried with a fusion result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusionMetadata {
    /// Intent extraction confidence (0.0 - 1.0)
    pub nlp_confidence: f64,
    /// Catalog matches evaluated across all tiers
    pub match_count: usize,
    /// Names of clinical patterns surfaced by the outcome matcher
    pub matched_patterns: Vec<String>,
}

/// The full fused response for one order; persisted keyed by order id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusionResult {
    /// Unique recommendation id
    pub id: String,
    pub order_id: String,
    pub tenant_id: String,
    /// At most three tiers with unique labels; never padded
    pub tiers: Vec<RecommendationTier>,
    /// Aggregate confidence (0.0 - 1.0)
    pub aggregate_confidence: f64,
    pub metadata: FusionMetadata,
    /// Acceptance state; the only part mutable after creation
    pub status: RecommendationStatus,
    pub chosen_tier: Option<Tier>,
    pub customization_note: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last status-update timestamp (RFC 3339)
    pub updated_at: String,
}

impl FusionResult {
    /// Canonical JSON used for the provenance hash.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// SHA-256 provenance hash over the canonical JSON, hex-encoded.
    ///
    /// Computed at creation time and stored with the record; status updates
    /// never recompute it.
    pub fn content_hash(&self) -> Result<String, serde_json::Error> {
        let json = self.to_canonical_json()?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// The tier entry carrying a given label, if present.
    pub fn tier(&self, tier: Tier) -> Option<&RecommendationTier> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result() -> FusionResult {
        FusionResult {
            id: "rec-1".into(),
            order_id: "order-1".into(),
            tenant_id: "tenant-1".into(),
            tiers: vec![RecommendationTier {
                tier: Tier::Best,
                lens_descriptor: "progressive high-index".into(),
                coating_descriptor: "anti-reflective".into(),
                features: vec!["blue_light".into()],
                sku: "SKU1".into(),
                product_name: "Premium Progressive".into(),
                retail_price: 429.0,
                match_score: 0.92,
                clinical_justification: "test".into(),
                lifestyle_justification: "test".into(),
                tag_justifications: vec![],
            }],
            aggregate_confidence: 0.88,
            metadata: FusionMetadata {
                nlp_confidence: 0.91,
                match_count: 7,
                matched_patterns: vec!["first_progressive_adaptation".into()],
            },
            status: RecommendationStatus::Pending,
            chosen_tier: None,
            customization_note: None,
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_content_hash_deterministic() {
        let result = make_result();
        let h1 = result.content_hash().unwrap();
        let h2 = result.content_hash().unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let a = make_result();
        let mut b = make_result();
        b.aggregate_confidence = 0.5;
        assert_ne!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }

    #[test]
    fn test_tier_lookup() {
        let result = make_result();
        assert!(result.tier(Tier::Best).is_some());
        assert!(result.tier(Tier::Good).is_none());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            RecommendationStatus::Pending,
            RecommendationStatus::Accepted,
            RecommendationStatus::Rejected,
            RecommendationStatus::Customized,
        ] {
            assert_eq!(RecommendationStatus::from_str(status.as_str()), Some(status));
        }
    }
}
