//! SQLite schema definition.

/// Complete database schema for lensrec.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Tenant Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS tenant_catalog (
    tenant_id TEXT NOT NULL,
    sku TEXT NOT NULL,
    name TEXT NOT NULL,
    brand TEXT,
    lens_type TEXT NOT NULL DEFAULT '',
    material TEXT NOT NULL DEFAULT '',
    coating TEXT NOT NULL DEFAULT '',
    features TEXT NOT NULL DEFAULT '{}',          -- JSON object of booleans
    retail_price REAL NOT NULL DEFAULT 0,
    wholesale_price REAL,
    stock_count INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (tenant_id, sku)
);

-- FTS5 virtual table for product search
CREATE VIRTUAL TABLE IF NOT EXISTS tenant_catalog_fts USING fts5(
    sku,
    name,
    brand,
    content='tenant_catalog',
    content_rowid='rowid'
);

-- Triggers to keep FTS5 in sync with main table
CREATE TRIGGER IF NOT EXISTS tenant_catalog_ai AFTER INSERT ON tenant_catalog BEGIN
    INSERT INTO tenant_catalog_fts(rowid, sku, name, brand)
    VALUES (new.rowid, new.sku, new.name, new.brand);
END;

CREATE TRIGGER IF NOT EXISTS tenant_catalog_ad AFTER DELETE ON tenant_catalog BEGIN
    INSERT INTO tenant_catalog_fts(tenant_catalog_fts, rowid, sku, name, brand)
    VALUES ('delete', old.rowid, old.sku, old.name, old.brand);
END;

CREATE TRIGGER IF NOT EXISTS tenant_catalog_au AFTER UPDATE ON tenant_catalog BEGIN
    INSERT INTO tenant_catalog_fts(tenant_catalog_fts, rowid, sku, name, brand)
    VALUES ('delete', old.rowid, old.sku, old.name, old.brand);
    INSERT INTO tenant_catalog_fts(rowid, sku, name, brand)
    VALUES (new.rowid, new.sku, new.name, new.brand);
END;

CREATE INDEX IF NOT EXISTS idx_catalog_tenant ON tenant_catalog(tenant_id);
CREATE INDEX IF NOT EXISTS idx_catalog_active ON tenant_catalog(tenant_id, active);

-- ============================================================================
-- Historical Outcomes Corpus
-- ============================================================================

CREATE TABLE IF NOT EXISTS lens_outcomes (
    config_key TEXT PRIMARY KEY,                 -- type|material|coating
    lens_type TEXT NOT NULL,
    material TEXT NOT NULL,
    coating TEXT NOT NULL,
    wrap_angle REAL,
    total_orders INTEGER NOT NULL DEFAULT 0,
    success_count INTEGER NOT NULL DEFAULT 0,
    nonadapt_count INTEGER NOT NULL DEFAULT 0,
    remake_count INTEGER NOT NULL DEFAULT 0,
    success_rate REAL NOT NULL DEFAULT 0,
    nonadapt_rate REAL NOT NULL DEFAULT 0,
    remake_rate REAL NOT NULL DEFAULT 0,
    clinical_context TEXT NOT NULL DEFAULT '[]', -- JSON array of strings
    good_for TEXT NOT NULL DEFAULT '[]',         -- JSON array of strings
    worst_for TEXT NOT NULL DEFAULT '[]',        -- JSON array of strings
    pattern_insights TEXT NOT NULL DEFAULT '{}', -- JSON map name -> insight
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_outcomes_samples ON lens_outcomes(total_orders);

-- ============================================================================
-- Intent Records (Append-Only - Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS intent_records (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,                       -- JSON IntentExtraction
    overall_confidence REAL NOT NULL,
    created_at TEXT NOT NULL
);

-- ============================================================================
-- Recommendations
-- ============================================================================

CREATE TABLE IF NOT EXISTS recommendations (
    id TEXT PRIMARY KEY,
    order_id TEXT NOT NULL UNIQUE,
    tenant_id TEXT NOT NULL,
    payload TEXT NOT NULL,                       -- JSON FusionResult at creation
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'accepted', 'rejected', 'customized')),
    chosen_tier TEXT
        CHECK (chosen_tier IS NULL OR chosen_tier IN ('GOOD', 'BETTER', 'BEST')),
    customization_note TEXT,
    aggregate_confidence REAL NOT NULL,
    content_hash TEXT NOT NULL,                  -- SHA-256 of creation payload
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recommendations_tenant ON recommendations(tenant_id);
CREATE INDEX IF NOT EXISTS idx_recommendations_status ON recommendations(status);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_fts_trigger() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO tenant_catalog (tenant_id, sku, name, brand) VALUES (?, ?, ?, ?)",
            ["tenant-1", "PRG-100", "Summit Progressive HD", "Summit"],
        )
        .unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM tenant_catalog_fts WHERE tenant_catalog_fts MATCH 'summit'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_status_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            r#"
            INSERT INTO recommendations
                (id, order_id, tenant_id, payload, status, aggregate_confidence,
                 content_hash, created_at, updated_at)
            VALUES ('r1', 'o1', 't1', '{}', 'bogus', 0.5, 'abc', '2025-01-01', '2025-01-01')
            "#,
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_order_id_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let insert = r#"
            INSERT INTO recommendations
                (id, order_id, tenant_id, payload, aggregate_confidence,
                 content_hash, created_at, updated_at)
            VALUES (?1, 'order-1', 't1', '{}', 0.5, 'abc', '2025-01-01', '2025-01-01')
        "#;
        conn.execute(insert, ["r1"]).unwrap();
        assert!(conn.execute(insert, ["r2"]).is_err());
    }
}
