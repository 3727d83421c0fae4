//! # Estimation Aggregation
//!
//! Combines material and labor cost into HPP (cost price) and RAB (billed
//! price):
//!
//! ```text
//! hpp    = material_cost + labor_cost
//! rab    = hpp × (1 + profit_fraction)
//! profit = rab - hpp
//! ```
//!
//! Multi-stage work is estimated per stage and then combined with
//! [`aggregate_sub_works`]. Money and quantities always sum; the duration
//! depends on how the stages run, and the caller states that explicitly
//! with [`SubWorkMode`].
//!
//! ## Example
//!
//! ```rust
//! use rab_core::estimate::aggregate;
//!
//! let r = aggregate(600_000.0, 400_000.0, 0.10).unwrap();
//! assert_eq!(r.hpp, 1_000_000.0);
//! assert!((r.rab - 1_100_000.0).abs() < 1e-6);
//! assert!((r.profit - 100_000.0).abs() < 1e-6);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Final figures for one work item or stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Work quantity in the item's base unit (m², m³, units).
    ///
    /// Per-unit figures divide by it. A combined result normally carries the
    /// sum of its stages, except where the stages are measured in different
    /// units: a footing counts footings and a project total carries none.
    pub base_quantity: f64,
    pub material_cost: f64,
    pub labor_cost: f64,
    pub hpp: f64,
    pub rab: f64,
    pub profit: f64,
    pub duration_days: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_works: Vec<SubWorkResult>,
    /// Materials a preview priced at zero (no catalog entry or no usable
    /// price). Always empty after a commit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_prices: Vec<String>,
}

/// A named stage of a multi-stage item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubWorkResult {
    pub name: String,
    pub estimate: EstimationResult,
}

impl SubWorkResult {
    pub fn new(name: impl Into<String>, estimate: EstimationResult) -> Self {
        SubWorkResult {
            name: name.into(),
            estimate,
        }
    }
}

/// How stage durations combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubWorkMode {
    /// Stages overlap; the longest one sets the duration
    Parallel,
    /// Stages follow each other; durations add up
    #[default]
    Sequential,
}

/// Reject negative or non-finite profit fractions
pub fn validate_profit_fraction(profit_fraction: f64) -> CalcResult<()> {
    if !(profit_fraction >= 0.0) || !profit_fraction.is_finite() {
        return Err(CalcError::InvalidProfitFactor {
            value: profit_fraction.to_string(),
        });
    }
    Ok(())
}

/// HPP, RAB and profit from material and labor cost.
///
/// # Errors
///
/// * `InvalidProfitFactor` - `profit_fraction` is negative
pub fn aggregate(
    material_cost: f64,
    labor_cost: f64,
    profit_fraction: f64,
) -> CalcResult<EstimationResult> {
    validate_profit_fraction(profit_fraction)?;

    let hpp = material_cost + labor_cost;
    let rab = hpp * (1.0 + profit_fraction);

    Ok(EstimationResult {
        material_cost,
        labor_cost,
        hpp,
        rab,
        profit: rab - hpp,
        ..Default::default()
    })
}

impl EstimationResult {
    pub fn with_base_quantity(mut self, base_quantity: f64) -> Self {
        self.base_quantity = base_quantity;
        self
    }

    pub fn with_duration(mut self, duration_days: f64) -> Self {
        self.duration_days = duration_days;
        self
    }

    pub fn with_missing_prices(mut self, missing_prices: Vec<String>) -> Self {
        self.missing_prices = missing_prices;
        self
    }

    /// True when every material had a price
    pub fn is_fully_priced(&self) -> bool {
        self.missing_prices.is_empty()
    }

    /// HPP per base unit; `None` when there is no quantity to divide by
    pub fn hpp_per_unit(&self) -> Option<f64> {
        (self.base_quantity > 0.0).then(|| self.hpp / self.base_quantity)
    }

    /// RAB per base unit; `None` when there is no quantity to divide by
    pub fn rab_per_unit(&self) -> Option<f64> {
        (self.base_quantity > 0.0).then(|| self.rab / self.base_quantity)
    }

    /// Round a summed fractional duration up to whole days
    pub fn finalize_duration(mut self) -> Self {
        self.duration_days = finalize_duration(self.duration_days);
        self
    }

    /// Stage by name
    pub fn sub_work(&self, name: &str) -> Option<&EstimationResult> {
        self.sub_works.iter().find(|s| s.name == name).map(|s| &s.estimate)
    }
}

/// Whole days for display
pub fn finalize_duration(duration_days: f64) -> f64 {
    if duration_days > 0.0 {
        duration_days.ceil()
    } else {
        0.0
    }
}

/// Combine stages into one result.
///
/// Every money and quantity field is the sum over stages. The duration is
/// the maximum (`Parallel`) or the sum (`Sequential`). An empty list is a
/// zero result.
pub fn aggregate_sub_works(
    sub_works: Vec<SubWorkResult>,
    mode: SubWorkMode,
) -> EstimationResult {
    let mut total = EstimationResult::default();
    for sub in &sub_works {
        let e = &sub.estimate;
        total.base_quantity += e.base_quantity;
        total.material_cost += e.material_cost;
        total.labor_cost += e.labor_cost;
        total.hpp += e.hpp;
        total.rab += e.rab;
        total.profit += e.profit;
        total.duration_days = match mode {
            SubWorkMode::Parallel => total.duration_days.max(e.duration_days),
            SubWorkMode::Sequential => total.duration_days + e.duration_days,
        };
        for name in &e.missing_prices {
            if !total.missing_prices.contains(name) {
                total.missing_prices.push(name.clone());
            }
        }
    }
    tracing::debug!(stages = sub_works.len(), ?mode, hpp = total.hpp, "sub-works aggregated");
    total.sub_works = sub_works;
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str, material: f64, labor: f64, profit: f64, days: f64) -> SubWorkResult {
        SubWorkResult::new(name, aggregate(material, labor, profit).unwrap().with_duration(days))
    }

    #[test]
    fn test_hpp_rab_identity() {
        let inputs = [0.0, 1.0, 1_234.5, 9_999_999.0];
        let profits = [0.0, 0.05, 0.1, 0.35, 1.0];
        for &m in &inputs {
            for &l in &inputs {
                for &p in &profits {
                    let r = aggregate(m, l, p).unwrap();
                    assert_eq!(r.hpp, m + l);
                    assert!((r.rab - r.hpp - r.profit).abs() < 1e-9);
                    assert!(r.profit >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_profit_monotonic() {
        let mut previous = aggregate(500.0, 500.0, 0.0).unwrap();
        for step in 1..=10 {
            let r = aggregate(500.0, 500.0, step as f64 * 0.05).unwrap();
            assert!(r.rab > previous.rab);
            assert!(r.profit > previous.profit);
            assert_eq!(r.hpp, previous.hpp);
            previous = r;
        }
    }

    #[test]
    fn test_negative_profit_rejected() {
        let err = aggregate(1.0, 1.0, -0.1).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PROFIT_FACTOR");
    }

    #[test]
    fn test_sequential_additivity() {
        let subs = vec![
            stage("concrete", 1_000.0, 300.0, 0.1, 1.5),
            stage("formwork", 200.0, 150.0, 0.1, 0.75),
            stage("reinforcement", 800.0, 100.0, 0.2, 2.0),
        ];
        let hpp: f64 = subs.iter().map(|s| s.estimate.hpp).sum();
        let rab: f64 = subs.iter().map(|s| s.estimate.rab).sum();

        let total = aggregate_sub_works(subs, SubWorkMode::Sequential);
        assert!((total.hpp - hpp).abs() < 1e-9);
        assert!((total.rab - rab).abs() < 1e-9);
        assert!((total.duration_days - 4.25).abs() < 1e-12);
        assert_eq!(total.finalize_duration().duration_days, 5.0);
    }

    #[test]
    fn test_parallel_takes_longest() {
        let subs = vec![stage("a", 1.0, 1.0, 0.0, 2.0), stage("b", 1.0, 1.0, 0.0, 3.5)];
        let total = aggregate_sub_works(subs, SubWorkMode::Parallel);
        assert_eq!(total.duration_days, 3.5);
        assert_eq!(total.hpp, 4.0);
        assert!(total.sub_work("b").is_some());
    }

    #[test]
    fn test_empty_sub_works() {
        let total = aggregate_sub_works(Vec::new(), SubWorkMode::Parallel);
        assert_eq!(total, EstimationResult::default());
    }

    #[test]
    fn test_per_unit_metrics_unrounded() {
        let r = aggregate(100.0, 0.0, 0.1).unwrap().with_base_quantity(3.0);
        assert!((r.hpp_per_unit().unwrap() - 100.0 / 3.0).abs() < 1e-12);
        assert!((r.rab_per_unit().unwrap() - 110.0 / 3.0).abs() < 1e-9);
        assert!(aggregate(1.0, 1.0, 0.0).unwrap().hpp_per_unit().is_none());
    }

    #[test]
    fn test_serialization_omits_empty_sub_works() {
        let r = aggregate(1.0, 2.0, 0.0).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("sub_works"));
        assert!(!json.contains("missing_prices"));
        let roundtrip: EstimationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, r);
    }

    #[test]
    fn test_base_quantity_sums_unless_overridden() {
        let subs = vec![
            SubWorkResult::new("a", aggregate(1.0, 0.0, 0.0).unwrap().with_base_quantity(2.0)),
            SubWorkResult::new("b", aggregate(1.0, 0.0, 0.0).unwrap().with_base_quantity(3.0)),
        ];
        let total = aggregate_sub_works(subs.clone(), SubWorkMode::Parallel);
        assert_eq!(total.base_quantity, 5.0);

        let counted = aggregate_sub_works(subs, SubWorkMode::Parallel).with_base_quantity(4.0);
        assert_eq!(counted.base_quantity, 4.0);
        assert_eq!(counted.hpp_per_unit(), Some(0.5));
    }

    #[test]
    fn test_missing_prices_merged_once() {
        let a = aggregate(0.0, 1.0, 0.0)
            .unwrap()
            .with_missing_prices(vec!["Sand".to_string(), "Cement".to_string()]);
        let b = aggregate(0.0, 1.0, 0.0)
            .unwrap()
            .with_missing_prices(vec!["Cement".to_string(), "Gravel".to_string()]);
        let total = aggregate_sub_works(
            vec![SubWorkResult::new("a", a), SubWorkResult::new("b", b)],
            SubWorkMode::Sequential,
        );
        assert_eq!(total.missing_prices, vec!["Sand", "Cement", "Gravel"]);
        assert!(!total.is_fully_priced());
    }
}
