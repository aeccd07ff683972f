//! LensRec Core Library
//!
//! Three-source recommendation fusion for ophthalmic dispensing: a free-text
//! clinical note plus a structured prescription become a ranked, tiered
//! (Good/Better/Best) product recommendation with deterministic clinical
//! justification and persisted provenance.
//!
//! # Architecture
//!
//! ```text
//!  Clinical note ──► Intent Extractor ──► tags / characteristics ─┐
//!                                                                 │
//!  Prescription ──► Outcome Pattern Matcher ──► ranked configs ───┤
//!                                                                 ▼
//!                                                   ┌─────────────────────────┐
//!                                                   │   Fusion Orchestrator   │
//!                                                   │  re-rank by tag overlap │
//!                                                   │  tier via Catalog Match │
//!                                                   │  justify + confidence   │
//!                                                   └────────────┬────────────┘
//!                                                                │
//!                                            persist intent + fusion records
//!                                                    (keyed by order id)
//! ```
//!
//! # Core Principle
//!
//! **All scoring is deterministic.** Rule tables and weights, no generative
//! text, no sampling: identical inputs produce byte-identical justifications.
//! Thin data degrades to fewer tiers, never to fabricated recommendations.
//!
//! # Modules
//!
//! - [`db`]: SQLite layer backing the collaborator traits (catalog FTS5,
//!   outcomes corpus, record store)
//! - [`models`]: Domain types (Prescription, IntentExtraction, FusionResult, ...)
//! - [`intent`]: Rule-based intent extractor over a static lexicon
//! - [`outcomes`]: Outcome pattern matcher over the historical corpus
//! - [`catalog`]: Multi-attribute catalog matcher with tiering
//! - [`fusion`]: Orchestrator and justification templates
//! - [`normalize`]: Lens-term normalizer (aliases + fuzzy fallback)
//! - [`store`]: Collaborator traits the core consumes

pub mod catalog;
pub mod db;
pub mod fusion;
pub mod intent;
pub mod models;
pub mod normalize;
pub mod outcomes;
pub mod store;

// Re-export commonly used types
pub use catalog::CatalogMatcher;
pub use db::{seed_starter_corpus, Database, DbError};
pub use fusion::{FusionError, FusionOrchestrator};
pub use intent::IntentExtractor;
pub use models::{
    CatalogProduct, ClinicalNote, EyeRx, FrameData, FusionResult, IntentExtraction,
    LensCharacteristics, LensConfiguration, LensOutcome, OutcomeAnalysis, OutcomeRecord,
    Prescription, PricedMatch, RecommendationStatus, Tier,
};
pub use normalize::LensTermNormalizer;
pub use outcomes::{OutcomePatternMatcher, MIN_SAMPLE_SIZE};
pub use store::{CatalogSource, OutcomeCorpus, RecordStore};

use std::sync::{Arc, Mutex};

use tracing::info;

// =========================================================================
// Engine Error Type
// =========================================================================

/// Errors surfaced by the engine facade.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The single opaque signal for a failed analysis; the cause chain stays
    /// attached for logging.
    #[error("analysis failed")]
    AnalysisFailed(#[source] FusionError),

    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<FusionError> for EngineError {
    fn from(e: FusionError) -> Self {
        EngineError::AnalysisFailed(e)
    }
}

impl<T> From<std::sync::PoisonError<T>> for EngineError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        EngineError::LockPoisoned(e.to_string())
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine facade over the SQLite-backed collaborators.
#[derive(Clone)]
pub struct RecommendationEngine {
    db: Arc<Mutex<Database>>,
}

impl RecommendationEngine {
    /// Open or create an engine database at the given path.
    pub fn open(path: &str) -> Result<Self, EngineError> {
        let db = Database::open(path)?;
        info!(path, "engine database opened");
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Create an engine over an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, EngineError> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    // =========================================================================
    // Analysis Operations
    // =========================================================================

    /// Extract clinical intent from a free-text note.
    ///
    /// Total over its input; persistence happens only inside
    /// [`RecommendationEngine::analyze_order`].
    pub fn extract_intent(
        &self,
        note_text: &str,
        age: Option<u32>,
        occupation: Option<&str>,
    ) -> IntentExtraction {
        let note = ClinicalNote {
            text: note_text.to_string(),
            patient_age: age,
            occupation: occupation.map(str::to_string),
        };
        IntentExtractor::new().extract(&note)
    }

    /// Score historical configurations against a prescription.
    pub fn analyze_outcome_patterns(
        &self,
        prescription: &Prescription,
        wrap_angle: Option<f64>,
    ) -> Result<OutcomeAnalysis, EngineError> {
        let db = self.db.lock()?;
        let matcher = OutcomePatternMatcher::new(&*db);
        Ok(matcher.analyze(prescription, wrap_angle)?)
    }

    /// Score a catalog against a target configuration and tier the winners.
    pub fn match_catalog(
        &self,
        catalog: &[CatalogProduct],
        configuration: &LensConfiguration,
        characteristics: &LensCharacteristics,
    ) -> Vec<PricedMatch> {
        CatalogMatcher::new().match_catalog(catalog, configuration, characteristics)
    }

    /// Run the full fusion pipeline for one order and persist the result.
    pub fn analyze_order(
        &self,
        order_id: &str,
        tenant_id: &str,
        prescription: &Prescription,
        note: &ClinicalNote,
        frame: Option<&FrameData>,
    ) -> Result<FusionResult, EngineError> {
        let db = self.db.lock()?;
        let orchestrator = FusionOrchestrator::new(&*db, &*db, &*db);
        Ok(orchestrator.analyze_order(order_id, tenant_id, prescription, note, frame)?)
    }

    // =========================================================================
    // Recommendation Lifecycle
    // =========================================================================

    /// Load a persisted recommendation by order id.
    pub fn get_recommendation(&self, order_id: &str) -> Result<Option<FusionResult>, EngineError> {
        let db = self.db.lock()?;
        Ok(db.get_recommendation_by_order(order_id)?)
    }

    /// Partial update of a recommendation's acceptance state.
    pub fn update_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
        chosen_tier: Option<Tier>,
        customization_note: Option<&str>,
    ) -> Result<bool, EngineError> {
        let db = self.db.lock()?;
        Ok(db.update_recommendation_status(
            recommendation_id,
            status,
            chosen_tier,
            customization_note,
        )?)
    }

    // =========================================================================
    // Outcomes Corpus
    // =========================================================================

    /// Record one dispensing outcome against a configuration (atomic).
    pub fn record_outcome(
        &self,
        configuration: &LensConfiguration,
        outcome: LensOutcome,
    ) -> Result<OutcomeRecord, EngineError> {
        let db = self.db.lock()?;
        let canonical = LensTermNormalizer::new().canonical_configuration(configuration);
        Ok(db.record_lens_outcome(&canonical, outcome)?)
    }

    /// Seed the starter corpus (demos and integration tests).
    pub fn seed_starter_corpus(&self) -> Result<(), EngineError> {
        let db = self.db.lock()?;
        Ok(seed_starter_corpus(&db)?)
    }

    // =========================================================================
    // Catalog Maintenance
    // =========================================================================

    /// Add or update a catalog product.
    pub fn upsert_product(&self, product: &CatalogProduct) -> Result<(), EngineError> {
        let db = self.db.lock()?;
        Ok(db.upsert_product(product)?)
    }

    /// Get a product by tenant and SKU.
    pub fn get_product(
        &self,
        tenant_id: &str,
        sku: &str,
    ) -> Result<Option<CatalogProduct>, EngineError> {
        let db = self.db.lock()?;
        Ok(db.get_product(tenant_id, sku)?)
    }

    /// Search a tenant's active products by name/brand/SKU.
    pub fn search_products(
        &self,
        tenant_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogProduct>, EngineError> {
        let db = self.db.lock()?;
        Ok(db.search_products(tenant_id, query, limit)?)
    }

    /// Mark a product as inactive (soft delete).
    pub fn deactivate_product(&self, tenant_id: &str, sku: &str) -> Result<bool, EngineError> {
        let db = self.db.lock()?;
        Ok(db.deactivate_product(tenant_id, sku)?)
    }
}
