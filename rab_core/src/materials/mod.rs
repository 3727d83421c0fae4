//! # Materials
//!
//! Material lines, pricing with waste, and the static material tables.
//!
//! - [`concrete`] - Concrete K-grades and accepted mortar ratios
//! - [`rebar`] - Deformed bar sizes and unit weights
//! - [`catalog`] - Material catalog lookup seam (prices come from outside)
//!
//! ## Pricing
//!
//! A [`MaterialLine`] says how much of a material one base unit of work
//! needs (e.g., 0.23 sacks of cement per m² of wall). Pricing a line for a
//! job multiplies by the job quantity, adds waste, then multiplies by price:
//!
//! ```text
//! base_quantity       = quantity_per_base_unit × total_quantity
//! quantity_with_waste = base_quantity × (1 + waste_fraction)
//! cost                = quantity_with_waste × unit_price
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rab_core::materials::{MaterialLine, price_line};
//!
//! let cement = MaterialLine::new("Cement", 0.25, "sack", 65_000.0);
//! let priced = price_line(&cement, 40.0, 0.05).unwrap();
//! assert!((priced.base_quantity - 10.0).abs() < 1e-9);
//! assert!((priced.quantity_with_waste - 10.5).abs() < 1e-9);
//! assert!((priced.cost - 682_500.0).abs() < 1e-6);
//! ```

pub mod catalog;
pub mod concrete;
pub mod rebar;

pub use catalog::{CatalogEntry, InMemoryCatalog, MaterialCatalog};
pub use concrete::{ConcreteGrade, ConcreteMix, DEFAULT_MORTAR_RATIO, MORTAR_RATIOS};
pub use rebar::{RebarSize, STOCK_BAR_LENGTH_M};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// One material needed per base unit of work.
///
/// Resolved from a catalog or a default table; after that only an explicit
/// user override of quantity or price changes it (see [`MaterialLine::with_unit_price`]).
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "Cement",
///   "quantity_per_base_unit": 0.25,
///   "unit": "sack",
///   "unit_price": 65000.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub name: String,
    /// Material quantity per base unit of work (per m², per m³, ...)
    pub quantity_per_base_unit: f64,
    /// Unit the quantity and price refer to ("sack", "m3", "kg")
    pub unit: String,
    /// Price per `unit`
    pub unit_price: f64,
}

impl MaterialLine {
    pub fn new(
        name: impl Into<String>,
        quantity_per_base_unit: f64,
        unit: impl Into<String>,
        unit_price: f64,
    ) -> Self {
        MaterialLine {
            name: name.into(),
            quantity_per_base_unit,
            unit: unit.into(),
            unit_price,
        }
    }

    /// Copy with a user-overridden quantity per base unit
    pub fn with_quantity_per_base_unit(&self, quantity: f64) -> Self {
        MaterialLine {
            quantity_per_base_unit: quantity,
            ..self.clone()
        }
    }

    /// Copy with a user-overridden unit price
    pub fn with_unit_price(&self, price: f64) -> Self {
        MaterialLine {
            unit_price: price,
            ..self.clone()
        }
    }
}

/// A material line priced for a job quantity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricedLine {
    pub name: String,
    pub unit: String,
    pub unit_price: f64,
    pub base_quantity: f64,
    pub quantity_with_waste: f64,
    pub cost: f64,
}

/// Sum of priced lines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialCost {
    pub lines: Vec<PricedLine>,
    pub total_cost: f64,
}

impl MaterialCost {
    /// Find a priced line by name
    pub fn line(&self, name: &str) -> Option<&PricedLine> {
        self.lines.iter().find(|l| l.name == name)
    }

    /// Merge two cost summaries (used when sub-works are flattened)
    pub fn merged(mut self, other: MaterialCost) -> MaterialCost {
        self.total_cost += other.total_cost;
        self.lines.extend(other.lines);
        self
    }
}

/// Reject negative or non-finite waste fractions
pub fn validate_waste_fraction(waste_fraction: f64) -> CalcResult<()> {
    if !(waste_fraction >= 0.0) || !waste_fraction.is_finite() {
        return Err(CalcError::InvalidWasteFactor {
            value: waste_fraction.to_string(),
        });
    }
    Ok(())
}

/// Price one material line for `total_quantity` base units of work.
///
/// # Errors
///
/// * `InvalidWasteFactor` - `waste_fraction` is negative
pub fn price_line(
    line: &MaterialLine,
    total_quantity: f64,
    waste_fraction: f64,
) -> CalcResult<PricedLine> {
    validate_waste_fraction(waste_fraction)?;

    let base_quantity = line.quantity_per_base_unit * total_quantity;
    let quantity_with_waste = base_quantity * (1.0 + waste_fraction);
    let cost = quantity_with_waste * line.unit_price;

    Ok(PricedLine {
        name: line.name.clone(),
        unit: line.unit.clone(),
        unit_price: line.unit_price,
        base_quantity,
        quantity_with_waste,
        cost,
    })
}

/// Price every line with the same waste fraction and sum the costs.
pub fn price_lines(
    lines: &[MaterialLine],
    total_quantity: f64,
    waste_fraction: f64,
) -> CalcResult<MaterialCost> {
    let priced = lines
        .iter()
        .map(|line| price_line(line, total_quantity, waste_fraction))
        .collect::<CalcResult<Vec<_>>>()?;
    let total_cost = priced.iter().map(|l| l.cost).sum();

    Ok(MaterialCost {
        lines: priced,
        total_cost,
    })
}
