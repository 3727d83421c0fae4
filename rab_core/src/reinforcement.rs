//! # Reinforcement Planning
//!
//! Bar counts, lengths and weights for a two-way footing mat.
//!
//! Per axis:
//!
//! ```text
//! effective_span = max(span - 2 × cover, 0)
//! bar_count      = ceil(effective_span / spacing) + 1
//! total_length   = bar_count × orthogonal_span
//! ```
//!
//! The `+1` is the starting bar at the edge. Bars along one axis run across
//! the other axis, hence the orthogonal span.
//!
//! Cover outside 25-75 mm or spacing outside 100-300 mm still produces a
//! plan (live preview), but [`ReinforcementPlanner::validate`] reports it so
//! a final estimate refuses it.
//!
//! ## Example
//!
//! ```rust
//! use rab_core::reinforcement::plan_axis;
//!
//! let x = plan_axis(2.0, 40.0, 200.0, 1.5);
//! assert_eq!(x.bar_count, 11);
//! assert!((x.effective_span_m - 1.92).abs() < 1e-12);
//! assert!((x.total_length_m - 16.5).abs() < 1e-12);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::conversion::{to_market, ConversionRule};
use crate::errors::{CalcError, CalcResult, IssueKind, ValidationReport};
use crate::materials::STOCK_BAR_LENGTH_M;
use crate::tables::{preset, LookupTables};
use crate::units::{Meters, Millimeters, Quantity};

pub const MIN_COVER_MM: f64 = 25.0;
pub const MAX_COVER_MM: f64 = 75.0;
pub const MIN_SPACING_MM: f64 = 100.0;
pub const MAX_SPACING_MM: f64 = 300.0;

/// Bars along one axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisPlan {
    pub effective_span_m: f64,
    pub bar_count: u32,
    pub total_length_m: f64,
}

/// Plan one axis. Span in meters, cover and spacing in millimeters.
///
/// Blank input (non-positive span or spacing) gives an empty plan rather
/// than an error.
pub fn plan_axis(span_m: f64, cover_mm: f64, spacing_mm: f64, orthogonal_span_m: f64) -> AxisPlan {
    if !(span_m > 0.0) || !(spacing_mm > 0.0) {
        return AxisPlan::default();
    }
    let span_mm = Millimeters::from(Meters(span_m));
    let effective_mm = (span_mm.0 - 2.0 * cover_mm.max(0.0)).max(0.0);

    // 1920 / 200 must be 10 even when the mm conversion leaves 9.600000000000001
    let intervals = (effective_mm / spacing_mm - 1e-9).ceil().max(0.0);
    let bar_count = intervals as u32 + 1;

    AxisPlan {
        effective_span_m: Meters::from(Millimeters(effective_mm)).0,
        bar_count,
        total_length_m: bar_count as f64 * orthogonal_span_m.max(0.0),
    }
}

/// Two-way footing mat.
///
/// ## JSON Example
///
/// ```json
/// {
///   "length_m": 1.2,
///   "width_m": 1.2,
///   "cover_mm": 50,
///   "spacing_mm": 150,
///   "bar_code": "D13",
///   "layers": 1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootingReinforcementSpec {
    pub length_m: f64,
    pub width_m: f64,
    pub cover_mm: f64,
    pub spacing_mm: f64,
    pub bar_code: String,
    /// Identical mats (top and bottom = 2)
    pub layers: u32,
}

impl Default for FootingReinforcementSpec {
    fn default() -> Self {
        FootingReinforcementSpec {
            length_m: 0.0,
            width_m: 0.0,
            cover_mm: 50.0,
            spacing_mm: 150.0,
            bar_code: "D13".to_string(),
            layers: 1,
        }
    }
}

/// Both axes plus weight and stock
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FootingReinforcementPlan {
    /// Bars spaced along the length, each running across the width
    pub x: AxisPlan,
    /// Bars spaced along the width, each running across the length
    pub y: AxisPlan,
    pub layers: u32,
    pub total_length_m: f64,
    pub weight_kg_per_m: f64,
    pub total_weight_kg: f64,
    /// Stock bars to buy (whole bars)
    pub stock_bars: f64,
}

/// Plans reinforcement against an injected table snapshot.
#[derive(Debug, Clone)]
pub struct ReinforcementPlanner {
    tables: Arc<LookupTables>,
}

impl ReinforcementPlanner {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        ReinforcementPlanner { tables }
    }

    /// Unit weight of a bar size
    ///
    /// # Errors
    ///
    /// * `MaterialNotFound` - bar code not in the weight table
    pub fn per_meter_weight(&self, bar_code: &str) -> CalcResult<f64> {
        let key = bar_code.trim().to_uppercase();
        self.tables
            .rebar_weights
            .get(&key)
            .copied()
            .ok_or_else(|| CalcError::material_not_found(bar_code))
    }

    fn stock_rule(&self) -> ConversionRule {
        self.tables
            .conversion_presets
            .get(preset::REBAR_BAR)
            .cloned()
            .unwrap_or_else(|| {
                ConversionRule::new(preset::REBAR_BAR, "bar", "m", STOCK_BAR_LENGTH_M)
            })
    }

    /// Plan both axes of a footing mat.
    ///
    /// Out-of-range cover or spacing still computes; see [`Self::validate`].
    ///
    /// # Errors
    ///
    /// * `MaterialNotFound` - unknown bar code
    pub fn plan_footing(
        &self,
        spec: &FootingReinforcementSpec,
    ) -> CalcResult<FootingReinforcementPlan> {
        let weight_kg_per_m = self.per_meter_weight(&spec.bar_code)?;

        let x = plan_axis(spec.length_m, spec.cover_mm, spec.spacing_mm, spec.width_m);
        let y = plan_axis(spec.width_m, spec.cover_mm, spec.spacing_mm, spec.length_m);
        let layers = spec.layers.max(1);

        let total_length_m = (x.total_length_m + y.total_length_m) * layers as f64;
        let total_weight_kg = total_length_m * weight_kg_per_m;
        let stock = to_market(&Quantity::new(total_length_m, "m"), &self.stock_rule())?;

        tracing::debug!(
            bar = %spec.bar_code,
            x_bars = x.bar_count,
            y_bars = y.bar_count,
            total_length_m,
            total_weight_kg,
            "footing reinforcement planned"
        );

        Ok(FootingReinforcementPlan {
            x,
            y,
            layers,
            total_length_m,
            weight_kg_per_m,
            total_weight_kg,
            stock_bars: stock.value.ceil(),
        })
    }

    /// Strict design checks for a final estimate.
    pub fn validate(&self, spec: &FootingReinforcementSpec) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.require_positive("length_m", spec.length_m, "Footing length must be positive");
        report.require_positive("width_m", spec.width_m, "Footing width must be positive");

        if !(MIN_COVER_MM..=MAX_COVER_MM).contains(&spec.cover_mm) {
            report.push(
                "cover_mm",
                spec.cover_mm,
                IssueKind::InvalidDimensions,
                format!("Concrete cover must be between {} and {} mm", MIN_COVER_MM, MAX_COVER_MM),
            );
        }
        if !(MIN_SPACING_MM..=MAX_SPACING_MM).contains(&spec.spacing_mm) {
            report.push(
                "spacing_mm",
                spec.spacing_mm,
                IssueKind::InvalidDimensions,
                format!("Bar spacing must be between {} and {} mm", MIN_SPACING_MM, MAX_SPACING_MM),
            );
        }
        if spec.length_m > 0.0 && spec.width_m > 0.0 {
            let min_side_mm = Millimeters::from(Meters(spec.length_m.min(spec.width_m))).0;
            if 2.0 * spec.cover_mm >= min_side_mm {
                report.push(
                    "cover_mm",
                    spec.cover_mm,
                    IssueKind::InvalidDimensions,
                    "Cover leaves no room for bars",
                );
            }
        }
        report.check("bar_code", self.per_meter_weight(&spec.bar_code));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::default_tables;

    fn planner() -> ReinforcementPlanner {
        ReinforcementPlanner::new(default_tables())
    }

    fn spec() -> FootingReinforcementSpec {
        FootingReinforcementSpec {
            length_m: 2.0,
            width_m: 2.0,
            cover_mm: 40.0,
            spacing_mm: 200.0,
            bar_code: "D13".to_string(),
            layers: 1,
        }
    }

    #[test]
    fn test_footing_scenario_axis() {
        let plan = plan_axis(2.0, 40.0, 200.0, 2.0);
        assert!((plan.effective_span_m - 1.92).abs() < 1e-12);
        assert_eq!(plan.bar_count, 11);
        assert!((plan.total_length_m - 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_multiple_keeps_plus_one() {
        // 1000 mm / 200 mm = 5 intervals -> 6 bars
        let plan = plan_axis(1.1, 50.0, 200.0, 1.0);
        assert_eq!(plan.bar_count, 6);
    }

    #[test]
    fn test_cover_consumes_span() {
        let plan = plan_axis(0.05, 40.0, 200.0, 1.0);
        assert_eq!(plan.effective_span_m, 0.0);
        assert_eq!(plan.bar_count, 1);
    }

    #[test]
    fn test_blank_input_is_empty_plan() {
        assert_eq!(plan_axis(0.0, 40.0, 200.0, 1.0), AxisPlan::default());
        assert_eq!(plan_axis(2.0, 40.0, 0.0, 1.0), AxisPlan::default());
    }

    #[test]
    fn test_plan_footing_weight_and_stock() {
        let plan = planner().plan_footing(&spec()).unwrap();
        assert_eq!(plan.x.bar_count, 11);
        assert_eq!(plan.y.bar_count, 11);
        assert!((plan.total_length_m - 44.0).abs() < 1e-9);
        assert!((plan.total_weight_kg - 44.0 * 1.042).abs() < 1e-9);
        // 44 m / 12 m = 3.67 -> 4 bars
        assert_eq!(plan.stock_bars, 4.0);
    }

    #[test]
    fn test_layers_multiply_length() {
        let two = FootingReinforcementSpec { layers: 2, ..spec() };
        let plan = planner().plan_footing(&two).unwrap();
        assert!((plan.total_length_m - 88.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_bar_code() {
        let bad = FootingReinforcementSpec { bar_code: "D99".to_string(), ..spec() };
        let err = planner().plan_footing(&bad).unwrap_err();
        assert_eq!(err, CalcError::material_not_found("D99"));
        assert_eq!(planner().per_meter_weight("d8").unwrap(), 0.395);
    }

    #[test]
    fn test_out_of_range_computes_but_fails_validation() {
        let loose = FootingReinforcementSpec { cover_mm: 10.0, spacing_mm: 400.0, ..spec() };
        assert!(planner().plan_footing(&loose).is_ok());

        let report = planner().validate(&loose);
        let fields: Vec<_> = report.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["cover_mm", "spacing_mm"]);

        assert!(planner().validate(&spec()).is_empty());
    }

    #[test]
    fn test_validate_collects_bar_code() {
        let bad = FootingReinforcementSpec { length_m: 0.0, bar_code: "X".to_string(), ..spec() };
        let report = planner().validate(&bad);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[1].kind, IssueKind::MaterialNotFound);
    }
}
