//! Material Catalog Lookup
//!
//! Prices come from an external catalog (a supplier price list, a database,
//! a remote service). The engine never fetches anything itself: callers hand
//! it something implementing [`MaterialCatalog`], and a miss is reported as
//! `MaterialNotFound` instead of being priced at zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::MaterialLine;
use crate::errors::{CalcError, CalcResult};

/// A catalog record
///
/// ## JSON Example
///
/// ```json
/// { "name": "Cement", "unit": "sack", "price": 65000.0, "supplier": "TB Maju" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub unit: String,
    pub price: f64,
    #[serde(default)]
    pub supplier: Option<String>,
}

/// Lookup seam for material prices.
pub trait MaterialCatalog {
    /// Find an entry by name (implementations decide on case sensitivity)
    fn lookup(&self, name: &str) -> Option<CatalogEntry>;
}

/// Simple in-memory catalog keyed by lower-cased name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder pattern)
    pub fn with_entry(mut self, entry: CatalogEntry) -> Self {
        self.insert(entry);
        self
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.name.to_lowercase(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CatalogEntry> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

impl MaterialCatalog for InMemoryCatalog {
    fn lookup(&self, name: &str) -> Option<CatalogEntry> {
        self.entries.get(&name.to_lowercase()).cloned()
    }
}

/// Resolve a material line from the catalog.
///
/// # Errors
///
/// * `MaterialNotFound` - the catalog has no entry for `name`
pub fn resolve_line(
    catalog: &dyn MaterialCatalog,
    name: &str,
    quantity_per_base_unit: f64,
) -> CalcResult<MaterialLine> {
    let entry = catalog
        .lookup(name)
        .ok_or_else(|| CalcError::material_not_found(name))?;
    Ok(MaterialLine::new(entry.name, quantity_per_base_unit, entry.unit, entry.price))
}

/// Resolve a material line, substituting the caller's placeholder price on a miss.
///
/// The substitution is the caller's explicit choice; it is logged so a
/// placeholder-priced estimate can be traced later.
pub fn resolve_line_or_placeholder(
    catalog: &dyn MaterialCatalog,
    name: &str,
    quantity_per_base_unit: f64,
    unit: &str,
    placeholder_price: f64,
) -> MaterialLine {
    match resolve_line(catalog, name, quantity_per_base_unit) {
        Ok(line) => line,
        Err(_) => {
            tracing::warn!(
                material = name,
                placeholder_price,
                "catalog miss, using placeholder price"
            );
            MaterialLine::new(name, quantity_per_base_unit, unit, placeholder_price)
        }
    }
}
