//! # Unit Conversion
//!
//! Converts quantities between the unit a material is bought in (market
//! unit: sack, truck, bar, box) and the unit physical formulas use (base
//! unit: kg, m³, m, m²).
//!
//! A [`ConversionRule`] reads "1 market unit = factor base units":
//!
//! ```text
//! base   = market × factor
//! market = base / factor
//! ```
//!
//! Nothing is converted implicitly. A quantity whose unit does not match the
//! side of the rule it is converted from is rejected, and a market unit with
//! no registered preset is never guessed; the caller asks for the registered
//! placeholder rule instead.
//!
//! ## Example
//!
//! ```rust
//! use rab_core::conversion::{to_base, to_market, ConversionRule};
//! use rab_core::units::Quantity;
//!
//! let sack = ConversionRule::new("cement-40kg", "sack", "kg", 40.0);
//! let kg = to_base(&Quantity::new(3.0, "sack"), &sack).unwrap();
//! assert_eq!(kg, Quantity::new(120.0, "kg"));
//!
//! let back = to_market(&kg, &sack).unwrap();
//! assert_eq!(back.value, 3.0);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::tables::LookupTables;
use crate::units::Quantity;

/// Id of the registered identity rule used when no preset matches
pub const PLACEHOLDER_RULE_ID: &str = "placeholder";

/// `1 market_unit = factor base_unit`
///
/// ## JSON Example
///
/// ```json
/// { "id": "sand-truck", "market_unit": "truck", "base_unit": "m3", "factor": 7.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRule {
    pub id: String,
    pub market_unit: String,
    pub base_unit: String,
    pub factor: f64,
}

impl ConversionRule {
    pub fn new(
        id: impl Into<String>,
        market_unit: impl Into<String>,
        base_unit: impl Into<String>,
        factor: f64,
    ) -> Self {
        ConversionRule {
            id: id.into(),
            market_unit: market_unit.into(),
            base_unit: base_unit.into(),
            factor,
        }
    }

    /// Identity rule for a unit that has no registered preset
    pub fn placeholder(unit: impl Into<String>) -> Self {
        let unit = unit.into();
        ConversionRule::new(PLACEHOLDER_RULE_ID, unit.clone(), unit, 1.0)
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_RULE_ID
    }

    /// Factor must be finite and positive
    pub fn validate(&self) -> CalcResult<()> {
        if !self.factor.is_finite() || self.factor <= 0.0 {
            return Err(CalcError::invalid_conversion_rule(
                &self.id,
                format!("factor must be a finite positive number, got {}", self.factor),
            ));
        }
        Ok(())
    }
}

/// The rule's factor, after validation
pub fn conversion_factor(rule: &ConversionRule) -> CalcResult<f64> {
    rule.validate()?;
    Ok(rule.factor)
}

/// Market → base (`sack` → `kg`)
pub fn to_base(quantity: &Quantity, rule: &ConversionRule) -> CalcResult<Quantity> {
    let factor = conversion_factor(rule)?;
    if quantity.unit != rule.market_unit {
        return Err(CalcError::invalid_conversion_rule(
            &rule.id,
            format!("expected a quantity in '{}', got '{}'", rule.market_unit, quantity.unit),
        ));
    }
    Ok(Quantity::new(quantity.value * factor, rule.base_unit.clone()))
}

/// Base → market (`kg` → `sack`)
pub fn to_market(quantity: &Quantity, rule: &ConversionRule) -> CalcResult<Quantity> {
    let factor = conversion_factor(rule)?;
    if quantity.unit != rule.base_unit {
        return Err(CalcError::invalid_conversion_rule(
            &rule.id,
            format!("expected a quantity in '{}', got '{}'", rule.base_unit, quantity.unit),
        ));
    }
    Ok(Quantity::new(quantity.value / factor, rule.market_unit.clone()))
}

/// Converter bound to the preset rules of a [`LookupTables`] snapshot.
#[derive(Debug, Clone)]
pub struct UnitConverter {
    tables: Arc<LookupTables>,
}

impl UnitConverter {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        UnitConverter { tables }
    }

    /// Registered preset by id
    ///
    /// # Errors
    ///
    /// * `InvalidConversionRule` - no preset with this id
    pub fn preset(&self, id: &str) -> CalcResult<&ConversionRule> {
        self.tables
            .conversion_presets
            .get(id)
            .ok_or_else(|| {
                CalcError::invalid_conversion_rule(id, "no registered conversion preset")
            })
    }

    /// Registered preset, or the identity placeholder for `unit` when none exists
    pub fn preset_or_placeholder(&self, id: &str, unit: &str) -> ConversionRule {
        match self.preset(id) {
            Ok(rule) => rule.clone(),
            Err(_) => {
                tracing::warn!(preset = id, unit, "no conversion preset, using placeholder rule");
                ConversionRule::placeholder(unit)
            }
        }
    }

    /// Presets whose market unit is `market_unit`
    pub fn presets_for_market_unit<'a>(
        &'a self,
        market_unit: &'a str,
    ) -> impl Iterator<Item = &'a ConversionRule> + 'a {
        self.tables
            .conversion_presets
            .values()
            .filter(move |r| r.market_unit == market_unit)
    }

    /// Convert a market quantity to base units with a named preset
    pub fn to_base(&self, quantity: &Quantity, preset_id: &str) -> CalcResult<Quantity> {
        to_base(quantity, self.preset(preset_id)?)
    }

    /// Convert a base quantity to market units with a named preset
    pub fn to_market(&self, quantity: &Quantity, preset_id: &str) -> CalcResult<Quantity> {
        to_market(quantity, self.preset(preset_id)?)
    }
}
