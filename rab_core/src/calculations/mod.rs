//! # Work-Item Calculations
//!
//! Each work item follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable, every field may be blank)
//! - `*Estimate` - Quantities, priced materials, labor and the final figures
//! - `preview(ctx) -> *Estimate` - Lenient, never fails
//! - `commit(ctx) -> CalcResult<*Estimate>` - Strict, reports every bad field
//!
//! ## Preview and commit
//!
//! A form recomputes the preview on every keystroke, so blank or half-typed
//! input yields zero-valued stages instead of an error. Commit validates the
//! whole input first and fails with [`CalcError::Validation`] listing each
//! offending field, then computes with every component error propagated.
//!
//! ## Available Calculations
//!
//! - [`wall`] - Brick masonry wall (pasangan bata)
//! - [`concrete`] - Cast-in-place concrete element
//! - [`footing`] - Reinforced foot plate in three stages

pub mod concrete;
pub mod footing;
pub mod wall;

use serde::{Deserialize, Serialize};

use crate::context::EstimationContext;
use crate::errors::{CalcError, CalcResult, IssueKind, ValidationReport};
use crate::estimate::EstimationResult;
use crate::labor::WorkerAllocation;
use crate::materials::catalog::resolve_line;
use crate::units::Percent;

pub use concrete::{ConcreteEstimate, ConcreteWorkInput};
pub use footing::{FootingEstimate, FootingInput};
pub use wall::{BrickWallEstimate, BrickWallInput};

/// Material names used on priced lines and for catalog lookups
pub mod names {
    pub const BRICK: &str = "Brick";
    pub const CEMENT: &str = "Cement";
    pub const SAND: &str = "Sand";
    pub const GRAVEL: &str = "Gravel";
    pub const REBAR: &str = "Rebar";
    pub const FORMWORK: &str = "Formwork";
}

/// Which validation tier a computation runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Preview,
    Commit,
}

impl Tier {
    /// Under `Preview` a failed stage becomes its zero value; under
    /// `Commit` the error propagates.
    pub fn settle<T: Default>(self, stage: &str, result: CalcResult<T>) -> CalcResult<T> {
        match (self, result) {
            (_, Ok(value)) => Ok(value),
            (Tier::Preview, Err(e)) => {
                tracing::debug!(stage, error = %e, "incomplete input, stage previewed as zero");
                Ok(T::default())
            }
            (Tier::Commit, Err(e)) => Err(e),
        }
    }
}

fn catalog_price(ctx: &EstimationContext, name: &str, unit: &str) -> CalcResult<f64> {
    let line = resolve_line(&*ctx.catalog, name, 1.0)?;
    if line.unit != unit {
        return Err(CalcError::invalid_conversion_rule(
            name,
            format!("catalog prices {} per '{}', expected '{}'", name, line.unit, unit),
        ));
    }
    Ok(line.unit_price)
}

/// Unit price: the input's own value when given, else the catalog's.
fn usable_price(
    ctx: &EstimationContext,
    name: &str,
    unit: &str,
    explicit: Option<f64>,
) -> CalcResult<f64> {
    let price = match explicit {
        Some(price) => price,
        None => catalog_price(ctx, name, unit)?,
    };
    if price >= 0.0 && price.is_finite() {
        Ok(price)
    } else {
        Err(CalcError::invalid_price(name, price))
    }
}

/// Resolves unit prices for one computation.
///
/// Under `Commit` a catalog miss, a unit mismatch or a negative price is an
/// error. Under `Preview` the material is priced at zero and its name is
/// kept, so the estimate can report which figures are incomplete.
pub(crate) struct PriceBook<'a> {
    ctx: &'a EstimationContext,
    tier: Tier,
    missing: Vec<String>,
}

impl<'a> PriceBook<'a> {
    pub(crate) fn new(ctx: &'a EstimationContext, tier: Tier) -> Self {
        PriceBook {
            ctx,
            tier,
            missing: Vec::new(),
        }
    }

    pub(crate) fn price(
        &mut self,
        name: &str,
        unit: &str,
        explicit: Option<f64>,
    ) -> CalcResult<f64> {
        match (self.tier, usable_price(self.ctx, name, unit, explicit)) {
            (_, Ok(price)) => Ok(price),
            (Tier::Commit, Err(e)) => Err(e),
            (Tier::Preview, Err(e)) => {
                tracing::warn!(material = name, error = %e, "no usable price, previewed at zero");
                if !self.missing.iter().any(|m| m == name) {
                    self.missing.push(name.to_string());
                }
                Ok(0.0)
            }
        }
    }

    /// Materials priced at zero so far
    pub(crate) fn into_missing(self) -> Vec<String> {
        self.missing
    }
}

pub(crate) fn check_price(
    report: &mut ValidationReport,
    ctx: &EstimationContext,
    field: &str,
    name: &str,
    unit: &str,
    explicit: Option<f64>,
) {
    report.check(field, usable_price(ctx, name, unit, explicit));
}

pub(crate) fn check_margins(
    report: &mut ValidationReport,
    waste: Option<Percent>,
    profit: Option<Percent>,
) {
    if let Some(waste) = waste {
        report.require_non_negative(
            "waste_percent",
            waste.0,
            IssueKind::InvalidWasteFactor,
            "Waste cannot be negative",
        );
    }
    if let Some(profit) = profit {
        report.require_non_negative(
            "profit_percent",
            profit.0,
            IssueKind::InvalidProfitFactor,
            "Profit cannot be negative",
        );
    }
}

pub(crate) fn check_workforce(
    report: &mut ValidationReport,
    crew: &WorkerAllocation,
    productivity_field: &str,
    productivity: f64,
) {
    report.check("crew", crew.validate());
    report.require_positive(productivity_field, productivity, "Productivity must be positive");
}

/// Enum wrapper for all work items.
///
/// ## JSON Example
///
/// ```json
/// {
///   "type": "Concrete",
///   "label": "Column K1",
///   "shape": { "shape": "cylinder", "radius_m": 0.15, "height_m": 3.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    /// Brick masonry wall
    BrickWall(BrickWallInput),
    /// Cast-in-place concrete element
    Concrete(ConcreteWorkInput),
    /// Reinforced foot plate
    Footing(FootingInput),
}

impl CalculationItem {
    /// Get the user-provided label for this item
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::BrickWall(w) => &w.label,
            CalculationItem::Concrete(c) => &c.label,
            CalculationItem::Footing(f) => &f.label,
        }
    }

    /// Get the calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::BrickWall(_) => "BrickWall",
            CalculationItem::Concrete(_) => "Concrete",
            CalculationItem::Footing(_) => "Footing",
        }
    }

    pub fn validate(&self, ctx: &EstimationContext) -> ValidationReport {
        match self {
            CalculationItem::BrickWall(w) => w.validate(ctx),
            CalculationItem::Concrete(c) => c.validate(ctx),
            CalculationItem::Footing(f) => f.validate(ctx),
        }
    }

    pub fn preview(&self, ctx: &EstimationContext) -> CalculationOutput {
        match self {
            CalculationItem::BrickWall(w) => CalculationOutput::BrickWall(w.preview(ctx)),
            CalculationItem::Concrete(c) => CalculationOutput::Concrete(c.preview(ctx)),
            CalculationItem::Footing(f) => CalculationOutput::Footing(f.preview(ctx)),
        }
    }

    pub fn commit(&self, ctx: &EstimationContext) -> CalcResult<CalculationOutput> {
        Ok(match self {
            CalculationItem::BrickWall(w) => CalculationOutput::BrickWall(w.commit(ctx)?),
            CalculationItem::Concrete(c) => CalculationOutput::Concrete(c.commit(ctx)?),
            CalculationItem::Footing(f) => CalculationOutput::Footing(f.commit(ctx)?),
        })
    }
}

/// Result of any work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationOutput {
    BrickWall(BrickWallEstimate),
    Concrete(ConcreteEstimate),
    Footing(FootingEstimate),
}

impl CalculationOutput {
    /// The HPP/RAB figures
    pub fn estimate(&self) -> &EstimationResult {
        match self {
            CalculationOutput::BrickWall(w) => &w.estimate,
            CalculationOutput::Concrete(c) => &c.estimate,
            CalculationOutput::Footing(f) => &f.estimate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{CatalogEntry, InMemoryCatalog};

    fn ctx_with_sand() -> EstimationContext {
        EstimationContext::default().with_catalog(InMemoryCatalog::new().with_entry(CatalogEntry {
            name: names::SAND.to_string(),
            unit: "m3".to_string(),
            price: 250_000.0,
            supplier: None,
        }))
    }

    #[test]
    fn test_settle() {
        let err: CalcResult<f64> = Err(CalcError::unknown_grade("K-1"));
        assert_eq!(Tier::Preview.settle("mix", err.clone()).unwrap(), 0.0);
        assert!(Tier::Commit.settle("mix", err).is_err());
        assert_eq!(Tier::Commit.settle("mix", Ok(2.0)).unwrap(), 2.0);
    }

    #[test]
    fn test_price_resolution() {
        let ctx = ctx_with_sand();
        let mut prices = PriceBook::new(&ctx, Tier::Commit);
        assert_eq!(prices.price(names::SAND, "m3", Some(1.0)).unwrap(), 1.0);
        assert_eq!(prices.price(names::SAND, "m3", None).unwrap(), 250_000.0);

        let miss = prices.price(names::GRAVEL, "m3", None).unwrap_err();
        assert_eq!(miss.error_code(), "MATERIAL_NOT_FOUND");

        let wrong_unit = prices.price(names::SAND, "truck", None).unwrap_err();
        assert_eq!(wrong_unit.error_code(), "INVALID_CONVERSION_RULE");

        let negative = prices.price(names::CEMENT, "sack", Some(-5.0)).unwrap_err();
        assert_eq!(negative.error_code(), "INVALID_PRICE");
        assert!(prices.into_missing().is_empty());
    }

    #[test]
    fn test_negative_catalog_price_rejected() {
        let ctx = EstimationContext::default().with_catalog(InMemoryCatalog::new().with_entry(
            CatalogEntry {
                name: names::REBAR.to_string(),
                unit: "kg".to_string(),
                price: -14_000.0,
                supplier: None,
            },
        ));
        let err = PriceBook::new(&ctx, Tier::Commit).price(names::REBAR, "kg", None).unwrap_err();
        assert_eq!(err.kind(), Some(IssueKind::InvalidPrice));

        let mut preview = PriceBook::new(&ctx, Tier::Preview);
        assert_eq!(preview.price(names::REBAR, "kg", None).unwrap(), 0.0);
        assert_eq!(preview.into_missing(), vec![names::REBAR]);
    }

    #[test]
    fn test_preview_records_unpriced_materials() {
        let ctx = ctx_with_sand();
        let mut prices = PriceBook::new(&ctx, Tier::Preview);
        assert_eq!(prices.price(names::GRAVEL, "m3", None).unwrap(), 0.0);
        assert_eq!(prices.price(names::GRAVEL, "m3", None).unwrap(), 0.0);
        assert_eq!(prices.price(names::CEMENT, "sack", Some(-70_000.0)).unwrap(), 0.0);
        assert_eq!(prices.price(names::SAND, "m3", None).unwrap(), 250_000.0);
        assert_eq!(prices.into_missing(), vec![names::GRAVEL, names::CEMENT]);
    }

    #[test]
    fn test_check_helpers_collect() {
        let ctx = ctx_with_sand();
        let mut report = ValidationReport::new();
        check_price(&mut report, &ctx, "prices.gravel_per_m3", names::GRAVEL, "m3", None);
        check_price(&mut report, &ctx, "prices.sand_per_m3", names::SAND, "m3", None);
        check_price(&mut report, &ctx, "prices.cement_per_sack", names::CEMENT, "sack", Some(-1.0));
        check_margins(&mut report, Some(Percent(-5.0)), Some(Percent(-1.0)));
        check_workforce(&mut report, &WorkerAllocation::default(), "productivity_m2_per_day", 0.0);

        let kinds: Vec<_> = report.issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::MaterialNotFound,
                IssueKind::InvalidPrice,
                IssueKind::InvalidWasteFactor,
                IssueKind::InvalidProfitFactor,
                IssueKind::InvalidAllocation,
                IssueKind::InvalidDimensions,
            ]
        );
    }
}
