//! Recommendation and intent record operations.
//!
//! Recommendation payloads are written once at creation; status updates touch
//! only the status columns, so the original recommendation content (and its
//! provenance hash) stays immutable.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{FusionResult, IntentExtraction, RecommendationStatus, Tier};

impl Database {
    /// Persist an intent extraction as an immutable audit record.
    pub fn insert_intent_record(&self, extraction: &IntentExtraction) -> DbResult<()> {
        let payload = serde_json::to_string(extraction)?;
        self.conn.execute(
            r#"
            INSERT INTO intent_records (id, payload, overall_confidence, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                extraction.id,
                payload,
                extraction.overall_confidence,
                extraction.created_at,
            ],
        )?;
        Ok(())
    }

    /// Load an intent record by id.
    pub fn get_intent_record(&self, id: &str) -> DbResult<Option<IntentExtraction>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM intent_records WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(DbError::from))
            .transpose()
    }

    /// Persist a fusion result keyed by order id, with its provenance hash.
    pub fn insert_fusion_record(&self, result: &FusionResult) -> DbResult<()> {
        let payload = result.to_canonical_json()?;
        let content_hash = result.content_hash()?;

        self.conn.execute(
            r#"
            INSERT INTO recommendations (
                id, order_id, tenant_id, payload, status, chosen_tier,
                customization_note, aggregate_confidence, content_hash,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                result.id,
                result.order_id,
                result.tenant_id,
                payload,
                result.status.as_str(),
                result.chosen_tier.map(|t| t.as_str()),
                result.customization_note,
                result.aggregate_confidence,
                content_hash,
                result.created_at,
                result.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Load a recommendation by order id.
    ///
    /// The creation payload is the source of truth for content; status fields
    /// are overlaid from their columns so partial updates are reflected.
    pub fn get_recommendation_by_order(&self, order_id: &str) -> DbResult<Option<FusionResult>> {
        let row: Option<RecommendationRow> = self
            .conn
            .query_row(
                r#"
                SELECT payload, status, chosen_tier, customization_note, updated_at
                FROM recommendations
                WHERE order_id = ?1
                "#,
                params![order_id],
                |row| {
                    Ok(RecommendationRow {
                        payload: row.get(0)?,
                        status: row.get(1)?,
                        chosen_tier: row.get(2)?,
                        customization_note: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Stored provenance hash for an order's recommendation.
    pub fn get_recommendation_hash(&self, order_id: &str) -> DbResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT content_hash FROM recommendations WHERE order_id = ?1",
                params![order_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Partial update of a recommendation's acceptance state.
    ///
    /// Never touches the payload or content hash.
    pub fn update_recommendation_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
        chosen_tier: Option<Tier>,
        customization_note: Option<&str>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE recommendations SET
                status = ?2,
                chosen_tier = ?3,
                customization_note = ?4,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                recommendation_id,
                status.as_str(),
                chosen_tier.map(|t| t.as_str()),
                customization_note,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct RecommendationRow {
    payload: String,
    status: String,
    chosen_tier: Option<String>,
    customization_note: Option<String>,
    updated_at: String,
}

impl TryFrom<RecommendationRow> for FusionResult {
    type Error = DbError;

    fn try_from(row: RecommendationRow) -> Result<Self, Self::Error> {
        let mut result: FusionResult = serde_json::from_str(&row.payload)?;
        result.status = RecommendationStatus::from_str(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("unknown status {:?}", row.status)))?;
        result.chosen_tier = match row.chosen_tier.as_deref() {
            Some(raw) => Some(
                Tier::from_str(raw)
                    .ok_or_else(|| DbError::Constraint(format!("unknown tier {:?}", raw)))?,
            ),
            None => None,
        };
        result.customization_note = row.customization_note;
        result.updated_at = row.updated_at;
        Ok(result)
    }
}
