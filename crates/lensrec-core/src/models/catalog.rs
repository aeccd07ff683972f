//! Tenant catalog models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recommendation tier labels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Good,
    Better,
    Best,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Good => "GOOD",
            Tier::Better => "BETTER",
            Tier::Best => "BEST",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "GOOD" => Some(Tier::Good),
            "BETTER" => Some(Tier::Better),
            "BEST" => Some(Tier::Best),
            _ => None,
        }
    }
}

/// A tenant-specific sellable product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogProduct {
    /// Stock Keeping Unit - unique within a tenant
    pub sku: String,
    /// Display name
    pub name: String,
    pub brand: Option<String>,
    /// Lens type as the tenant catalogs it (canonicalized before matching)
    pub lens_type: String,
    pub material: String,
    pub coating: String,
    /// Boolean feature map keyed by characteristic name
    pub features: BTreeMap<String, bool>,
    pub retail_price: f64,
    pub wholesale_price: Option<f64>,
    pub stock_count: u32,
    /// Owning tenant
    pub tenant_id: String,
    /// Whether this product is currently sellable
    pub active: bool,
}

impl CatalogProduct {
    /// Create a product with required fields.
    pub fn new(sku: String, name: String, tenant_id: String) -> Self {
        Self {
            sku,
            name,
            brand: None,
            lens_type: String::new(),
            material: String::new(),
            coating: String::new(),
            features: BTreeMap::new(),
            retail_price: 0.0,
            wholesale_price: None,
            stock_count: 0,
            tenant_id,
            active: true,
        }
    }

    /// True when at least one unit is in stock.
    pub fn in_stock(&self) -> bool {
        self.stock_count > 0
    }

    /// Feature keys the product carries, in map order.
    pub fn enabled_features(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|(_, on)| **on)
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

/// A catalog product scored against a target configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedMatch {
    pub product: CatalogProduct,
    /// Match score (0.0 - 1.0)
    pub score: f64,
    /// Assigned price/quality tier
    pub tier: Tier,
}
