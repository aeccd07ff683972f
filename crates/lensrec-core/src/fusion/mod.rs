//! Fusion orchestrator: sequences intent extraction, outcome analysis and
//! catalog matching into one ranked, justified, persisted recommendation.

mod justification;

pub use justification::*;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::CatalogMatcher;
use crate::db::DbError;
use crate::intent::IntentExtractor;
use crate::models::{
    ClinicalNote, ConfigurationScore, FrameData, FusionMetadata, FusionResult, InputError,
    IntentExtraction, Prescription, RecommendationStatus, RecommendationTier, Tier,
};
use crate::outcomes::OutcomePatternMatcher;
use crate::store::{CatalogSource, OutcomeCorpus, RecordStore};

/// Boost per clinical-context key shared between a configuration and the tag set.
const TAG_CONTEXT_BOOST: f64 = 0.1;

/// Tier labels by configuration rank: rank 0 is BEST.
const TIER_BY_RANK: [Tier; 3] = [Tier::Best, Tier::Better, Tier::Good];

/// Failures inside one fusion request.
///
/// Insufficient data is never represented here: an empty ranking or an empty
/// tier set flows through as a smaller result.
#[derive(Error, Debug)]
pub enum FusionError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("invalid input: {0}")]
    InvalidRequest(String),

    #[error("collaborator failure: {0}")]
    Collaborator(#[from] DbError),
}

/// Orchestrator over the three sources and the persistence collaborator.
pub struct FusionOrchestrator<'a, S, C, O>
where
    S: RecordStore,
    C: CatalogSource,
    O: OutcomeCorpus,
{
    records: &'a S,
    catalogs: &'a C,
    corpus: &'a O,
    extractor: IntentExtractor,
    matcher: CatalogMatcher,
}

impl<'a, S, C, O> FusionOrchestrator<'a, S, C, O>
where
    S: RecordStore,
    C: CatalogSource,
    O: OutcomeCorpus,
{
    /// Create an orchestrator over the injected collaborators.
    pub fn new(records: &'a S, catalogs: &'a C, corpus: &'a O) -> Self {
        Self {
            records,
            catalogs,
            corpus,
            extractor: IntentExtractor::new(),
            matcher: CatalogMatcher::new(),
        }
    }

    /// Run the full fusion pipeline for one order and persist the result.
    ///
    /// Any failure aborts the whole call; partial results are never persisted
    /// or returned.
    pub fn analyze_order(
        &self,
        order_id: &str,
        tenant_id: &str,
        prescription: &Prescription,
        note: &ClinicalNote,
        frame: Option<&FrameData>,
    ) -> Result<FusionResult, FusionError> {
        if order_id.trim().is_empty() {
            return Err(FusionError::InvalidRequest("order id must not be empty".into()));
        }
        if tenant_id.trim().is_empty() {
            return Err(FusionError::InvalidRequest("tenant id must not be empty".into()));
        }
        // Reject malformed numerics before any scoring begins.
        prescription.parsed()?;

        info!(order_id, tenant_id, "starting order analysis");

        let intent = self.extractor.extract(note);
        debug!(
            tags = intent.tags.len(),
            confidence = intent.overall_confidence,
            "intent extracted"
        );

        let wrap = frame
            .and_then(|f| f.wrap_angle)
            .or(prescription.frame_wrap_angle);
        let analysis = OutcomePatternMatcher::new(self.corpus).analyze(prescription, wrap)?;
        debug!(
            configurations = analysis.ranked_configurations.len(),
            patterns = analysis.clinical_patterns.len(),
            "outcome patterns analyzed"
        );

        let mut ranked = analysis.ranked_configurations.clone();
        rerank_with_tags(&mut ranked, &intent);

        let catalog = self.catalogs.tenant_catalog(tenant_id)?;

        let mut tiers = Vec::new();
        let mut match_count = 0usize;
        for (rank, tier) in TIER_BY_RANK.into_iter().enumerate() {
            let Some(configuration) = ranked.get(rank) else {
                warn!(tier = tier.as_str(), "tier skipped: not enough ranked configurations");
                continue;
            };
            let matches = self.matcher.match_catalog(
                &catalog,
                &configuration.configuration,
                &intent.characteristics,
            );
            match_count += matches.len();
            match build_tier(tier, configuration, &matches, &intent) {
                Some(entry) => tiers.push(entry),
                None => warn!(tier = tier.as_str(), "tier skipped: no catalog match"),
            }
        }

        let top_success = ranked.first().map(|c| c.success_rate).unwrap_or(0.0);
        let aggregate_confidence =
            ((intent.overall_confidence + top_success) / 2.0).clamp(0.0, 1.0);

        let now = chrono::Utc::now().to_rfc3339();
        let result = FusionResult {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            tenant_id: tenant_id.to_string(),
            tiers,
            aggregate_confidence,
            metadata: FusionMetadata {
                nlp_confidence: intent.overall_confidence,
                match_count,
                matched_patterns: analysis
                    .clinical_patterns
                    .iter()
                    .map(|p| p.name.clone())
                    .collect(),
            },
            status: RecommendationStatus::Pending,
            chosen_tier: None,
            customization_note: None,
            created_at: now.clone(),
            updated_at: now,
        };

        self.persist(&intent, &result)?;
        info!(
            order_id,
            tiers = result.tiers.len(),
            confidence = result.aggregate_confidence,
            "order analysis complete"
        );
        Ok(result)
    }

    /// Persist the intent record and the fusion record; both must land.
    fn persist(&self, intent: &IntentExtraction, result: &FusionResult) -> Result<(), FusionError> {
        self.records.create_intent_record(intent)?;
        self.records.create_fusion_record(result)?;
        Ok(())
    }

    /// Partial update of a persisted recommendation's acceptance state.
    pub fn update_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
        chosen_tier: Option<Tier>,
        customization_note: Option<&str>,
    ) -> Result<bool, FusionError> {
        Ok(self
            .records
            .update_status(recommendation_id, status, chosen_tier, customization_note)?)
    }
}

/// Boost matcher scores by tag/context overlap, then re-sort.
///
/// A boost on top of the matcher's own score, never a replacement.
fn rerank_with_tags(ranked: &mut [ConfigurationScore], intent: &IntentExtraction) {
    let tag_names = intent.tag_names();
    for configuration in ranked.iter_mut() {
        let matched = configuration
            .clinical_context
            .iter()
            .filter(|key| tag_names.iter().any(|name| *name == key.as_str()))
            .count();
        configuration.clinical_score += TAG_CONTEXT_BOOST * matched as f64;
    }
    ranked.sort_by(|a, b| {
        b.clinical_score
            .partial_cmp(&a.clinical_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.configuration.key().cmp(&b.configuration.key()))
    });
}

/// Assemble one recommendation tier from the best available catalog match.
///
/// Prefers a product already labeled with the tier, falls back to the top
/// match overall, and yields nothing when the catalog produced no match.
fn build_tier(
    tier: Tier,
    configuration: &ConfigurationScore,
    matches: &[crate::models::PricedMatch],
    intent: &IntentExtraction,
) -> Option<RecommendationTier> {
    let pick = matches
        .iter()
        .find(|m| m.tier == tier)
        .or_else(|| matches.first())?;

    Some(RecommendationTier {
        tier,
        lens_descriptor: format!(
            "{} {}",
            configuration.configuration.lens_type, configuration.configuration.material
        ),
        coating_descriptor: configuration.configuration.coating.clone(),
        features: pick
            .product
            .enabled_features()
            .into_iter()
            .map(str::to_string)
            .collect(),
        sku: pick.product.sku.clone(),
        product_name: pick.product.name.clone(),
        retail_price: pick.product.retail_price,
        match_score: pick.score,
        clinical_justification: clinical_justification(tier, configuration),
        lifestyle_justification: lifestyle_justification(tier, &intent.lifestyle),
        tag_justifications: tag_justifications(&intent.tags),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LensConfiguration;

    fn config_score(key_type: &str, context: &[&str], score: f64) -> ConfigurationScore {
        ConfigurationScore {
            configuration: LensConfiguration::new(key_type, "cr-39", "none"),
            success_rate: 0.9,
            nonadapt_rate: 0.05,
            remake_rate: 0.05,
            sample_count: 100,
            clinical_score: score,
            clinical_context: context.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_rerank_boost_reorders_close_scores() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract(&ClinicalNote::new("heavy computer use all day"));
        assert!(intent.has_tag(crate::models::TagKind::ComputerHeavyUse));

        let mut ranked = vec![
            config_score("progressive", &[], 40.05),
            config_score("office", &["computer_heavy_use"], 40.0),
        ];
        rerank_with_tags(&mut ranked, &intent);

        // 40.0 + 0.1 beats 40.05.
        assert_eq!(ranked[0].configuration.lens_type, "office");
        assert!((ranked[0].clinical_score - 40.1).abs() < 1e-9);
    }

    #[test]
    fn test_rerank_no_tags_keeps_order() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract(&ClinicalNote::new(""));

        let mut ranked = vec![
            config_score("progressive", &["presbyopic"], 50.0),
            config_score("bifocal", &["presbyopic"], 45.0),
        ];
        rerank_with_tags(&mut ranked, &intent);
        assert_eq!(ranked[0].configuration.lens_type, "progressive");
        assert_eq!(ranked[0].clinical_score, 50.0);
    }

    #[test]
    fn test_build_tier_empty_matches_yields_none() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract(&ClinicalNote::new(""));
        let configuration = config_score("progressive", &[], 50.0);
        assert!(build_tier(Tier::Best, &configuration, &[], &intent).is_none());
    }
}
