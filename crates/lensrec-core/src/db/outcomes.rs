//! Historical outcomes corpus database operations.

use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;

use super::{Database, DbError, DbResult};
use crate::models::{LensConfiguration, LensOutcome, OutcomeRecord, PatternInsight};

impl Database {
    /// Get one corpus row by configuration key.
    pub fn get_outcome_record(&self, config_key: &str) -> DbResult<Option<OutcomeRecord>> {
        let result = self
            .conn
            .query_row(
                &format!("{} WHERE config_key = ?1", SELECT_OUTCOME),
                params![config_key],
                map_outcome_row,
            )
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// Corpus rows with at least `min_samples` recorded orders, keyed order.
    pub fn eligible_outcome_records(&self, min_samples: u64) -> DbResult<Vec<OutcomeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE total_orders >= ?1 ORDER BY config_key",
            SELECT_OUTCOME
        ))?;
        let rows = stmt.query_map(params![min_samples as i64], map_outcome_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Record one dispensing outcome for a configuration.
    ///
    /// The increment and rate recomputation execute as a single UPSERT, so
    /// two writers racing on the same key cannot lose an update. A first-seen
    /// configuration is created with this outcome as its sole sample.
    pub fn record_lens_outcome(
        &self,
        configuration: &LensConfiguration,
        outcome: LensOutcome,
    ) -> DbResult<OutcomeRecord> {
        let key = configuration.key();
        let (success, nonadapt, remake): (i64, i64, i64) = match outcome {
            LensOutcome::Success => (1, 0, 0),
            LensOutcome::NonAdapt => (0, 1, 0),
            LensOutcome::Remake => (0, 0, 1),
        };

        self.conn.execute(
            r#"
            INSERT INTO lens_outcomes (
                config_key, lens_type, material, coating, wrap_angle,
                total_orders, success_count, nonadapt_count, remake_count,
                success_rate, nonadapt_rate, remake_rate, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                1, ?6, ?7, ?8,
                CAST(?6 AS REAL), CAST(?7 AS REAL), CAST(?8 AS REAL), datetime('now')
            )
            ON CONFLICT(config_key) DO UPDATE SET
                total_orders = total_orders + 1,
                success_count = success_count + excluded.success_count,
                nonadapt_count = nonadapt_count + excluded.nonadapt_count,
                remake_count = remake_count + excluded.remake_count,
                success_rate = CAST(success_count + excluded.success_count AS REAL)
                    / (total_orders + 1),
                nonadapt_rate = CAST(nonadapt_count + excluded.nonadapt_count AS REAL)
                    / (total_orders + 1),
                remake_rate = CAST(remake_count + excluded.remake_count AS REAL)
                    / (total_orders + 1),
                updated_at = datetime('now')
            "#,
            params![
                key,
                configuration.lens_type,
                configuration.material,
                configuration.coating,
                configuration.wrap_angle,
                success,
                nonadapt,
                remake,
            ],
        )?;

        self.get_outcome_record(&key)?
            .ok_or_else(|| DbError::NotFound(key))
    }

    /// Replace a full corpus row, including context and pattern insights.
    ///
    /// Used by seeding and by corpus imports; the live write path is
    /// [`Database::record_lens_outcome`].
    pub fn upsert_outcome_record(&self, record: &OutcomeRecord) -> DbResult<()> {
        let context_json = serde_json::to_string(&record.clinical_context)?;
        let good_for_json = serde_json::to_string(&record.good_for)?;
        let worst_for_json = serde_json::to_string(&record.worst_for)?;
        let insights_json = serde_json::to_string(&record.pattern_insights)?;

        self.conn.execute(
            r#"
            INSERT INTO lens_outcomes (
                config_key, lens_type, material, coating, wrap_angle,
                total_orders, success_count, nonadapt_count, remake_count,
                success_rate, nonadapt_rate, remake_rate,
                clinical_context, good_for, worst_for, pattern_insights, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, datetime('now'))
            ON CONFLICT(config_key) DO UPDATE SET
                wrap_angle = excluded.wrap_angle,
                total_orders = excluded.total_orders,
                success_count = excluded.success_count,
                nonadapt_count = excluded.nonadapt_count,
                remake_count = excluded.remake_count,
                success_rate = excluded.success_rate,
                nonadapt_rate = excluded.nonadapt_rate,
                remake_rate = excluded.remake_rate,
                clinical_context = excluded.clinical_context,
                good_for = excluded.good_for,
                worst_for = excluded.worst_for,
                pattern_insights = excluded.pattern_insights,
                updated_at = datetime('now')
            "#,
            params![
                record.configuration.key(),
                record.configuration.lens_type,
                record.configuration.material,
                record.configuration.coating,
                record.configuration.wrap_angle,
                record.total_orders as i64,
                record.success_count as i64,
                record.nonadapt_count as i64,
                record.remake_count as i64,
                record.success_rate,
                record.nonadapt_rate,
                record.remake_rate,
                context_json,
                good_for_json,
                worst_for_json,
                insights_json,
            ],
        )?;
        Ok(())
    }
}

const SELECT_OUTCOME: &str = r#"
    SELECT lens_type, material, coating, wrap_angle,
           total_orders, success_count, nonadapt_count, remake_count,
           success_rate, nonadapt_rate, remake_rate,
           clinical_context, good_for, worst_for, pattern_insights
    FROM lens_outcomes
"#;

/// Intermediate row struct for database mapping.
struct OutcomeRow {
    lens_type: String,
    material: String,
    coating: String,
    wrap_angle: Option<f64>,
    total_orders: i64,
    success_count: i64,
    nonadapt_count: i64,
    remake_count: i64,
    success_rate: f64,
    nonadapt_rate: f64,
    remake_rate: f64,
    clinical_context: String,
    good_for: String,
    worst_for: String,
    pattern_insights: String,
}

fn map_outcome_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutcomeRow> {
    Ok(OutcomeRow {
        lens_type: row.get(0)?,
        material: row.get(1)?,
        coating: row.get(2)?,
        wrap_angle: row.get(3)?,
        total_orders: row.get(4)?,
        success_count: row.get(5)?,
        nonadapt_count: row.get(6)?,
        remake_count: row.get(7)?,
        success_rate: row.get(8)?,
        nonadapt_rate: row.get(9)?,
        remake_rate: row.get(10)?,
        clinical_context: row.get(11)?,
        good_for: row.get(12)?,
        worst_for: row.get(13)?,
        pattern_insights: row.get(14)?,
    })
}

impl TryFrom<OutcomeRow> for OutcomeRecord {
    type Error = DbError;

    fn try_from(row: OutcomeRow) -> Result<Self, Self::Error> {
        let mut configuration =
            LensConfiguration::new(row.lens_type, row.material, row.coating);
        configuration.wrap_angle = row.wrap_angle;

        let pattern_insights: BTreeMap<String, PatternInsight> =
            serde_json::from_str(&row.pattern_insights)?;

        Ok(OutcomeRecord {
            configuration,
            total_orders: row.total_orders as u64,
            success_count: row.success_count as u64,
            nonadapt_count: row.nonadapt_count as u64,
            remake_count: row.remake_count as u64,
            success_rate: row.success_rate,
            nonadapt_rate: row.nonadapt_rate,
            remake_rate: row.remake_rate,
            clinical_context: serde_json::from_str(&row.clinical_context)?,
            good_for: serde_json::from_str(&row.good_for)?,
            worst_for: serde_json::from_str(&row.worst_for)?,
            pattern_insights,
        })
    }
}

/// Seed a realistic starter corpus for demos and integration tests.
///
/// Rates reflect well-known dispensing patterns: single-vision lenses adapt
/// almost universally, progressives carry a measurable non-adapt tail that
/// softens with premium materials, and one thin row sits below the minimum
/// sample threshold on purpose.
pub fn seed_starter_corpus(db: &Database) -> DbResult<()> {
    for record in starter_records() {
        db.upsert_outcome_record(&record)?;
    }
    Ok(())
}

fn starter_records() -> Vec<OutcomeRecord> {
    fn record(
        lens_type: &str,
        material: &str,
        coating: &str,
        wrap: Option<f64>,
        totals: (u64, u64, u64, u64),
        context: &[&str],
        good_for: &[&str],
        worst_for: &[&str],
        insights: &[(&str, bool, f64)],
    ) -> OutcomeRecord {
        let (total, success, nonadapt, remake) = totals;
        let mut configuration = LensConfiguration::new(lens_type, material, coating);
        configuration.wrap_angle = wrap;
        OutcomeRecord {
            configuration,
            total_orders: total,
            success_count: success,
            nonadapt_count: nonadapt,
            remake_count: remake,
            success_rate: success as f64 / total as f64,
            nonadapt_rate: nonadapt as f64 / total as f64,
            remake_rate: remake as f64 / total as f64,
            clinical_context: context.iter().map(|s| s.to_string()).collect(),
            good_for: good_for.iter().map(|s| s.to_string()).collect(),
            worst_for: worst_for.iter().map(|s| s.to_string()).collect(),
            pattern_insights: insights
                .iter()
                .map(|(name, applicable, rate)| {
                    (
                        name.to_string(),
                        PatternInsight {
                            applicable: *applicable,
                            nonadapt_rate: *rate,
                        },
                    )
                })
                .collect(),
        }
    }

    vec![
        record(
            "progressive",
            "high-index",
            "anti-reflective",
            Some(4.0),
            (412, 371, 25, 16),
            &["presbyopic", "first_time_progressive"],
            &["presbyopic"],
            &["high_wrap"],
            &[("first_progressive_adaptation", true, 0.08)],
        ),
        record(
            "progressive",
            "polycarbonate",
            "blue-light",
            Some(4.5),
            (238, 205, 21, 12),
            &["presbyopic", "computer_heavy_use"],
            &["presbyopic"],
            &[],
            &[("screen_fatigue_relief", true, 0.06)],
        ),
        record(
            "progressive",
            "cr-39",
            "anti-reflective",
            Some(5.0),
            (520, 427, 57, 36),
            &["presbyopic"],
            &[],
            &["high_cylinder"],
            &[("economy_progressive_nonadapt", true, 0.11)],
        ),
        record(
            "progressive",
            "trivex",
            "photochromic",
            Some(5.5),
            (96, 81, 9, 6),
            &["presbyopic", "uv_exposure"],
            &["high_wrap"],
            &[],
            &[("outdoor_presbyope", true, 0.09)],
        ),
        record(
            "single-vision",
            "cr-39",
            "none",
            Some(2.0),
            (890, 846, 18, 26),
            &["myopic"],
            &["myopic"],
            &["presbyopic"],
            &[],
        ),
        record(
            "single-vision",
            "polycarbonate",
            "anti-reflective",
            Some(2.5),
            (640, 595, 19, 26),
            &["myopic", "sports_active"],
            &["myopic"],
            &[],
            &[("active_wear_fit", true, 0.03)],
        ),
        record(
            "single-vision",
            "high-index",
            "anti-reflective",
            Some(2.5),
            (310, 285, 12, 13),
            &["high_cylinder", "myopic"],
            &["high_cylinder"],
            &[],
            &[("strong_rx_thinning", true, 0.04)],
        ),
        record(
            "bifocal",
            "cr-39",
            "none",
            Some(3.0),
            (150, 120, 17, 13),
            &["presbyopic"],
            &[],
            &["computer_heavy_use"],
            &[("segment_line_rejection", true, 0.06)],
        ),
        // Below the minimum sample threshold on purpose.
        record(
            "office",
            "high-index",
            "blue-light",
            Some(3.0),
            (12, 11, 1, 0),
            &["computer_heavy_use", "presbyopic"],
            &["computer_heavy_use"],
            &[],
            &[],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcome_first_seen() {
        let db = Database::open_in_memory().unwrap();
        let cfg = LensConfiguration::new("progressive", "trivex", "anti-reflective");

        let record = db.record_lens_outcome(&cfg, LensOutcome::Success).unwrap();
        assert_eq!(record.total_orders, 1);
        assert_eq!(record.success_count, 1);
        assert_eq!(record.success_rate, 1.0);
        assert_eq!(record.nonadapt_rate, 0.0);
    }

    #[test]
    fn test_record_outcome_increments_and_recomputes() {
        let db = Database::open_in_memory().unwrap();
        let cfg = LensConfiguration::new("progressive", "trivex", "anti-reflective");

        db.record_lens_outcome(&cfg, LensOutcome::Success).unwrap();
        db.record_lens_outcome(&cfg, LensOutcome::Success).unwrap();
        db.record_lens_outcome(&cfg, LensOutcome::NonAdapt).unwrap();
        let record = db.record_lens_outcome(&cfg, LensOutcome::Remake).unwrap();

        assert_eq!(record.total_orders, 4);
        assert_eq!(record.success_count, 2);
        assert_eq!(record.nonadapt_count, 1);
        assert_eq!(record.remake_count, 1);
        assert!((record.success_rate - 0.5).abs() < 1e-9);
        assert!((record.nonadapt_rate - 0.25).abs() < 1e-9);
        assert!((record.remake_rate - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_eligible_filter() {
        let db = Database::open_in_memory().unwrap();
        seed_starter_corpus(&db).unwrap();

        let eligible = db.eligible_outcome_records(50).unwrap();
        assert!(!eligible.is_empty());
        assert!(eligible.iter().all(|r| r.total_orders >= 50));
        assert!(!eligible
            .iter()
            .any(|r| r.configuration.key() == "office|high-index|blue-light"));

        // The thin row is still retrievable directly.
        let thin = db
            .get_outcome_record("office|high-index|blue-light")
            .unwrap()
            .unwrap();
        assert_eq!(thin.total_orders, 12);
    }

    #[test]
    fn test_seed_rates_consistent() {
        let db = Database::open_in_memory().unwrap();
        seed_starter_corpus(&db).unwrap();

        for record in db.eligible_outcome_records(0).unwrap() {
            let total =
                record.success_count + record.nonadapt_count + record.remake_count;
            assert!(total <= record.total_orders);
            assert!((record.success_rate
                - record.success_count as f64 / record.total_orders as f64)
                .abs()
                < 1e-9);
        }
    }

    #[test]
    fn test_context_and_insights_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        seed_starter_corpus(&db).unwrap();

        let record = db
            .get_outcome_record("progressive|high-index|anti-reflective")
            .unwrap()
            .unwrap();
        assert!(record.clinical_context.contains(&"presbyopic".to_string()));
        assert!(record.good_for.contains(&"presbyopic".to_string()));
        assert!(record.worst_for.contains(&"high_wrap".to_string()));
        let insight = record.pattern_insights.get("first_progressive_adaptation").unwrap();
        assert!(insight.applicable);
        assert!((insight.nonadapt_rate - 0.08).abs() < 1e-9);
    }
}
