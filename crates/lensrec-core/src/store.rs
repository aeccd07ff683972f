//! Collaborator interfaces the fusion core consumes.
//!
//! The engine owns none of these concerns; it is written against the traits
//! so the surrounding service can inject its own persistence. The SQLite
//! [`Database`](crate::db::Database) is the implementation shipped here.

use crate::db::{Database, DbResult};
use crate::models::{
    CatalogProduct, FusionResult, IntentExtraction, LensConfiguration, LensOutcome, OutcomeRecord,
    RecommendationStatus, Tier,
};

/// Keyed record store for intent and recommendation records.
pub trait RecordStore {
    /// Persist an intent extraction (immutable once written).
    fn create_intent_record(&self, extraction: &IntentExtraction) -> DbResult<()>;

    /// Persist a fusion result keyed by order id (content immutable once written).
    fn create_fusion_record(&self, result: &FusionResult) -> DbResult<()>;

    /// Retrieve a recommendation by order id.
    fn get_by_order_id(&self, order_id: &str) -> DbResult<Option<FusionResult>>;

    /// Partial update of acceptance state; never alters recommendation content.
    fn update_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
        chosen_tier: Option<Tier>,
        customization_note: Option<&str>,
    ) -> DbResult<bool>;
}

/// Tenant-scoped catalog reader.
pub trait CatalogSource {
    /// All active products for a tenant.
    fn tenant_catalog(&self, tenant_id: &str) -> DbResult<Vec<CatalogProduct>>;
}

/// Historical-outcomes reader/writer keyed by (lens type, material, coating).
pub trait OutcomeCorpus {
    /// Corpus rows with at least `min_samples` recorded orders.
    fn eligible_configurations(&self, min_samples: u64) -> DbResult<Vec<OutcomeRecord>>;

    /// One corpus row by configuration key.
    fn get_configuration(&self, config_key: &str) -> DbResult<Option<OutcomeRecord>>;

    /// Atomically record one outcome and return the updated row.
    fn record_outcome(
        &self,
        configuration: &LensConfiguration,
        outcome: LensOutcome,
    ) -> DbResult<OutcomeRecord>;
}

impl RecordStore for Database {
    fn create_intent_record(&self, extraction: &IntentExtraction) -> DbResult<()> {
        self.insert_intent_record(extraction)
    }

    fn create_fusion_record(&self, result: &FusionResult) -> DbResult<()> {
        self.insert_fusion_record(result)
    }

    fn get_by_order_id(&self, order_id: &str) -> DbResult<Option<FusionResult>> {
        self.get_recommendation_by_order(order_id)
    }

    fn update_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
        chosen_tier: Option<Tier>,
        customization_note: Option<&str>,
    ) -> DbResult<bool> {
        self.update_recommendation_status(recommendation_id, status, chosen_tier, customization_note)
    }
}

impl CatalogSource for Database {
    fn tenant_catalog(&self, tenant_id: &str) -> DbResult<Vec<CatalogProduct>> {
        self.list_tenant_catalog(tenant_id)
    }
}

impl OutcomeCorpus for Database {
    fn eligible_configurations(&self, min_samples: u64) -> DbResult<Vec<OutcomeRecord>> {
        self.eligible_outcome_records(min_samples)
    }

    fn get_configuration(&self, config_key: &str) -> DbResult<Option<OutcomeRecord>> {
        self.get_outcome_record(config_key)
    }

    fn record_outcome(
        &self,
        configuration: &LensConfiguration,
        outcome: LensOutcome,
    ) -> DbResult<OutcomeRecord> {
        self.record_lens_outcome(configuration, outcome)
    }
}
