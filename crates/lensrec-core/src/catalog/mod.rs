//! Catalog matcher: scores tenant products against a target configuration
//! and groups the best matches into price/quality tiers.

use crate::models::{CatalogProduct, LensCharacteristics, LensConfiguration, PricedMatch, Tier};
use crate::normalize::LensTermNormalizer;

/// Scored products retained before tiering.
const MAX_MATCHES: usize = 30;

/// Products per tier.
const TIER_WIDTH: usize = 5;

/// Additive score weights, capped at 1.0 overall.
const TYPE_EXACT: f64 = 0.40;
const TYPE_PARTIAL: f64 = 0.20;
const MATERIAL_MATCH: f64 = 0.30;
const MATERIAL_PRESENT: f64 = 0.10;
const COATING_MATCH: f64 = 0.20;
const COATING_PRESENT: f64 = 0.05;
const CHARACTERISTICS_MAX: f64 = 0.10;
const IN_STOCK_BONUS: f64 = 0.05;

/// Multi-attribute product matcher.
pub struct CatalogMatcher {
    normalizer: LensTermNormalizer,
}

impl Default for CatalogMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogMatcher {
    /// Create a matcher with the default term normalizer.
    pub fn new() -> Self {
        Self {
            normalizer: LensTermNormalizer::new(),
        }
    }

    /// Score a catalog against a target configuration and tier the winners.
    ///
    /// An empty catalog yields an empty list; tiers are never padded and a
    /// zero-score product is excluded entirely.
    pub fn match_catalog(
        &self,
        catalog: &[CatalogProduct],
        target: &LensConfiguration,
        characteristics: &LensCharacteristics,
    ) -> Vec<PricedMatch> {
        let target = self.normalizer.canonical_configuration(target);

        let mut scored: Vec<(f64, &CatalogProduct)> = catalog
            .iter()
            .filter(|product| product.active)
            .map(|product| (self.score_product(product, &target, characteristics), product))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.sku.cmp(&b.1.sku))
        });
        scored.truncate(MAX_MATCHES);

        scored
            .into_iter()
            .enumerate()
            .filter_map(|(rank, (score, product))| {
                let tier = match rank / TIER_WIDTH {
                    0 => Tier::Best,
                    1 => Tier::Better,
                    2 => Tier::Good,
                    _ => return None,
                };
                Some(PricedMatch {
                    product: product.clone(),
                    score,
                    tier,
                })
            })
            .collect()
    }

    /// Per-product additive match score (0.0 - 1.0).
    pub fn score_product(
        &self,
        product: &CatalogProduct,
        target: &LensConfiguration,
        characteristics: &LensCharacteristics,
    ) -> f64 {
        let mut score = 0.0;

        let product_type = self.normalizer.canonical_type(&product.lens_type);
        if !product_type.is_empty() && !target.lens_type.is_empty() {
            if product_type == target.lens_type {
                score += TYPE_EXACT;
            } else if substring_match(&product_type, &target.lens_type) {
                score += TYPE_PARTIAL;
            }
        }

        let product_material = self.normalizer.canonical_material(&product.material);
        if !product_material.is_empty() {
            if substring_match(&product_material, &target.material) {
                score += MATERIAL_MATCH;
            } else {
                score += MATERIAL_PRESENT;
            }
        }

        // A canonical "none" coating counts as absent, not as a mismatch.
        let product_coating = self.normalizer.canonical_coating(&product.coating);
        if product_coating != "none" {
            if substring_match(&product_coating, &target.coating) {
                score += COATING_MATCH;
            } else {
                score += COATING_PRESENT;
            }
        } else if target.coating == "none" {
            score += COATING_MATCH;
        }

        score += CHARACTERISTICS_MAX * characteristics.satisfied_fraction(&product.features);

        if product.in_stock() {
            score += IN_STOCK_BONUS;
        }

        score.min(1.0)
    }
}

/// Bidirectional substring test over non-empty canonical terms.
fn substring_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}
