//! Tenant catalog database operations.

use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;

use super::{Database, DbError, DbResult};
use crate::models::CatalogProduct;

impl Database {
    /// Insert or update a catalog product.
    pub fn upsert_product(&self, product: &CatalogProduct) -> DbResult<()> {
        let features_json = serde_json::to_string(&product.features)?;

        self.conn.execute(
            r#"
            INSERT INTO tenant_catalog (
                tenant_id, sku, name, brand, lens_type, material, coating,
                features, retail_price, wholesale_price, stock_count, active, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, datetime('now'))
            ON CONFLICT(tenant_id, sku) DO UPDATE SET
                name = excluded.name,
                brand = excluded.brand,
                lens_type = excluded.lens_type,
                material = excluded.material,
                coating = excluded.coating,
                features = excluded.features,
                retail_price = excluded.retail_price,
                wholesale_price = excluded.wholesale_price,
                stock_count = excluded.stock_count,
                active = excluded.active,
                updated_at = datetime('now')
            "#,
            params![
                product.tenant_id,
                product.sku,
                product.name,
                product.brand,
                product.lens_type,
                product.material,
                product.coating,
                features_json,
                product.retail_price,
                product.wholesale_price,
                product.stock_count,
                product.active,
            ],
        )?;
        Ok(())
    }

    /// Get a product by tenant and SKU.
    pub fn get_product(&self, tenant_id: &str, sku: &str) -> DbResult<Option<CatalogProduct>> {
        let result = self
            .conn
            .query_row(
                &format!("{} WHERE tenant_id = ?1 AND sku = ?2", SELECT_PRODUCT),
                params![tenant_id, sku],
                map_product_row,
            )
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// All active products for a tenant, ordered by SKU.
    pub fn list_tenant_catalog(&self, tenant_id: &str) -> DbResult<Vec<CatalogProduct>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE tenant_id = ?1 AND active = 1 ORDER BY sku",
            SELECT_PRODUCT
        ))?;
        let rows = stmt.query_map(params![tenant_id], map_product_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?.try_into()?);
        }
        Ok(products)
    }

    /// Search a tenant's active products by name/brand/SKU (FTS5, BM25 ranking).
    pub fn search_products(
        &self,
        tenant_id: &str,
        query: &str,
        limit: usize,
    ) -> DbResult<Vec<CatalogProduct>> {
        let escaped_query = escape_fts_query(query);

        let mut stmt = self.conn.prepare(&format!(
            r#"
            {select},
                   bm25(tenant_catalog_fts) as rank
            FROM tenant_catalog c
            JOIN tenant_catalog_fts fts ON c.rowid = fts.rowid
            WHERE tenant_catalog_fts MATCH ?1
            AND c.tenant_id = ?2
            AND c.active = 1
            ORDER BY rank
            LIMIT ?3
            "#,
            select = SELECT_PRODUCT_QUALIFIED
        ))?;

        let rows = stmt.query_map(params![escaped_query, tenant_id, limit as i64], map_product_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?.try_into()?);
        }
        Ok(products)
    }

    /// Mark a product as inactive (soft delete).
    pub fn deactivate_product(&self, tenant_id: &str, sku: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE tenant_catalog SET active = 0, updated_at = datetime('now')
             WHERE tenant_id = ?1 AND sku = ?2",
            params![tenant_id, sku],
        )?;
        Ok(rows_affected > 0)
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT tenant_id, sku, name, brand, lens_type, material, coating,
           features, retail_price, wholesale_price, stock_count, active
    FROM tenant_catalog
"#;

const SELECT_PRODUCT_QUALIFIED: &str = r#"
    SELECT c.tenant_id, c.sku, c.name, c.brand, c.lens_type, c.material, c.coating,
           c.features, c.retail_price, c.wholesale_price, c.stock_count, c.active
"#;

/// Intermediate row struct for database mapping.
struct ProductRow {
    tenant_id: String,
    sku: String,
    name: String,
    brand: Option<String>,
    lens_type: String,
    material: String,
    coating: String,
    features: String,
    retail_price: f64,
    wholesale_price: Option<f64>,
    stock_count: u32,
    active: bool,
}

fn map_product_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        tenant_id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        brand: row.get(3)?,
        lens_type: row.get(4)?,
        material: row.get(5)?,
        coating: row.get(6)?,
        features: row.get(7)?,
        retail_price: row.get(8)?,
        wholesale_price: row.get(9)?,
        stock_count: row.get(10)?,
        active: row.get(11)?,
    })
}

impl TryFrom<ProductRow> for CatalogProduct {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let features: BTreeMap<String, bool> = serde_json::from_str(&row.features)?;
        Ok(CatalogProduct {
            tenant_id: row.tenant_id,
            sku: row.sku,
            name: row.name,
            brand: row.brand,
            lens_type: row.lens_type,
            material: row.material,
            coating: row.coating,
            features,
            retail_price: row.retail_price,
            wholesale_price: row.wholesale_price,
            stock_count: row.stock_count,
            active: row.active,
        })
    }
}

/// Escape special FTS5 characters and prepare query for prefix matching.
fn escape_fts_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| format!("{}*", word))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(sku: &str, name: &str) -> CatalogProduct {
        let mut product = CatalogProduct::new(sku.into(), name.into(), "tenant-1".into());
        product.lens_type = "progressive".into();
        product.material = "polycarbonate".into();
        product.coating = "anti-reflective".into();
        product.retail_price = 299.0;
        product.stock_count = 5;
        product
    }

    #[test]
    fn test_upsert_and_get() {
        let db = Database::open_in_memory().unwrap();

        let mut product = make_product("PRG-100", "Summit Progressive HD");
        product.features.insert("blue_light".into(), true);
        db.upsert_product(&product).unwrap();

        let retrieved = db.get_product("tenant-1", "PRG-100").unwrap().unwrap();
        assert_eq!(retrieved.name, "Summit Progressive HD");
        assert_eq!(retrieved.features.get("blue_light"), Some(&true));
    }

    #[test]
    fn test_upsert_updates() {
        let db = Database::open_in_memory().unwrap();

        let mut product = make_product("PRG-100", "Original Name");
        db.upsert_product(&product).unwrap();

        product.name = "Updated Name".into();
        product.stock_count = 0;
        db.upsert_product(&product).unwrap();

        let retrieved = db.get_product("tenant-1", "PRG-100").unwrap().unwrap();
        assert_eq!(retrieved.name, "Updated Name");
        assert_eq!(retrieved.stock_count, 0);
    }

    #[test]
    fn test_tenant_scoping() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_product(&make_product("PRG-100", "Tenant One Lens")).unwrap();
        let mut other = make_product("PRG-200", "Tenant Two Lens");
        other.tenant_id = "tenant-2".into();
        db.upsert_product(&other).unwrap();

        let catalog = db.list_tenant_catalog("tenant-1").unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].sku, "PRG-100");

        assert!(db.get_product("tenant-1", "PRG-200").unwrap().is_none());
    }

    #[test]
    fn test_search_products() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_product(&make_product("PRG-100", "Summit Progressive HD")).unwrap();
        db.upsert_product(&make_product("SV-200", "ClearView Single Vision")).unwrap();

        let results = db.search_products("tenant-1", "summit", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sku, "PRG-100");

        // Prefix search
        let results = db.search_products("tenant-1", "clear", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sku, "SV-200");
    }

    #[test]
    fn test_deactivate() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_product(&make_product("PRG-100", "Summit Progressive HD")).unwrap();
        assert!(db.deactivate_product("tenant-1", "PRG-100").unwrap());

        // Gone from the active catalog and search
        assert!(db.list_tenant_catalog("tenant-1").unwrap().is_empty());
        assert!(db.search_products("tenant-1", "summit", 10).unwrap().is_empty());

        // Still retrievable directly
        let product = db.get_product("tenant-1", "PRG-100").unwrap().unwrap();
        assert!(!product.active);
    }
}
