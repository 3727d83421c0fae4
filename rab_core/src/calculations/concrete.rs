//! # Concrete Work Calculation
//!
//! Cast-in-place concrete for any [`ShapeSpec`]: columns, beams, slabs, pile
//! caps. The base quantity is the total volume in m³.
//!
//! Materials per m³ come from the grade's mix. Cement is tabled in kg and
//! bought in sacks through the settings' cement preset; sand and gravel are
//! priced per m³.
//!
//! When no grade is given the table's default grade is used. A grade that is
//! given but unknown is an error.

use serde::{Deserialize, Serialize};

use super::{check_margins, check_price, check_workforce, names, PriceBook, Tier};
use crate::context::EstimationContext;
use crate::errors::{CalcResult, IssueKind, ValidationReport};
use crate::estimate::{aggregate, EstimationResult};
use crate::geometry::{compute_volume, ShapeSpec};
use crate::labor::{LaborSchedule, WorkerAllocation};
use crate::materials::{price_lines, ConcreteMix, MaterialCost, MaterialLine};
use crate::units::Percent;

/// Unit prices; a blank price is looked up in the catalog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcretePrices {
    pub cement_per_sack: Option<f64>,
    pub sand_per_m3: Option<f64>,
    pub gravel_per_m3: Option<f64>,
}

/// Material lines for one m³ of concrete.
pub(crate) fn concrete_lines(
    ctx: &EstimationContext,
    tier: Tier,
    book: &mut PriceBook<'_>,
    mix: &ConcreteMix,
    prices: &ConcretePrices,
) -> CalcResult<Vec<MaterialLine>> {
    let cement_sacks = tier.settle("cement", ctx.cement_kg_to_sacks(mix.cement_kg_per_m3))?;
    let cement_unit = tier.settle("cement", ctx.cement_unit())?;

    Ok(vec![
        MaterialLine::new(
            names::CEMENT,
            cement_sacks,
            cement_unit.as_str(),
            book.price(names::CEMENT, &cement_unit, prices.cement_per_sack)?,
        ),
        MaterialLine::new(
            names::SAND,
            mix.sand_m3_per_m3,
            "m3",
            book.price(names::SAND, "m3", prices.sand_per_m3)?,
        ),
        MaterialLine::new(
            names::GRAVEL,
            mix.gravel_m3_per_m3,
            "m3",
            book.price(names::GRAVEL, "m3", prices.gravel_per_m3)?,
        ),
    ])
}

pub(crate) fn check_concrete_prices(
    report: &mut ValidationReport,
    ctx: &EstimationContext,
    prices: &ConcretePrices,
) {
    let cement_unit = report
        .check("cement_preset", ctx.cement_unit())
        .unwrap_or_else(|| "sack".to_string());
    check_price(
        report,
        ctx,
        "prices.cement_per_sack",
        names::CEMENT,
        &cement_unit,
        prices.cement_per_sack,
    );
    check_price(report, ctx, "prices.sand_per_m3", names::SAND, "m3", prices.sand_per_m3);
    check_price(report, ctx, "prices.gravel_per_m3", names::GRAVEL, "m3", prices.gravel_per_m3);
}

/// Input parameters for a concrete element.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Column K1",
///   "shape": { "shape": "rectangular_prism", "length_m": 0.3, "width_m": 0.3, "height_m": 3.5 },
///   "count": 12,
///   "grade": "K-250",
///   "prices": { "cement_per_sack": 70000, "sand_per_m3": 250000, "gravel_per_m3": 300000 },
///   "crew": { "tukang_count": 2, "pekerja_count": 6,
///             "ratio": { "tukang_units": 1, "pekerja_units": 3 } },
///   "productivity_m3_per_day": 1.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcreteWorkInput {
    /// User label (e.g., "Column K1", "Ground beam")
    pub label: String,

    /// Shape of one element
    pub shape: ShapeSpec,

    /// Identical elements
    pub count: u32,

    /// Grade code; the table's default grade when absent or blank
    pub grade: Option<String>,

    pub prices: ConcretePrices,

    pub crew: WorkerAllocation,

    /// Volume one team casts per day
    pub productivity_m3_per_day: f64,

    pub waste_percent: Option<Percent>,

    pub profit_percent: Option<Percent>,
}

impl Default for ConcreteWorkInput {
    fn default() -> Self {
        ConcreteWorkInput {
            label: String::new(),
            shape: ShapeSpec::RectangularPrism {
                length_m: 0.0,
                width_m: 0.0,
                height_m: 0.0,
            },
            count: 1,
            grade: None,
            prices: ConcretePrices::default(),
            crew: WorkerAllocation::default(),
            productivity_m3_per_day: 0.0,
            waste_percent: None,
            profit_percent: None,
        }
    }
}

/// Results from a concrete element calculation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConcreteEstimate {
    /// Grade actually used
    pub grade: String,
    pub mix: ConcreteMix,
    /// Total volume of all elements (m³)
    pub volume_m3: f64,
    /// Mixing water for the total volume (L)
    pub water_l: f64,
    pub materials: MaterialCost,
    pub labor: LaborSchedule,
    pub estimate: EstimationResult,
}

impl ConcreteWorkInput {
    /// Total volume of all elements (m³), 0 while incomplete
    pub fn volume_m3(&self) -> f64 {
        compute_volume(&self.shape) * self.count as f64
    }

    pub fn validate(&self, ctx: &EstimationContext) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.extend_prefixed("shape", self.shape.validate());
        if self.count == 0 {
            report.push(
                "count",
                0,
                IssueKind::InvalidDimensions,
                "Element count must be at least 1",
            );
        }
        report.check(
            "grade",
            ctx.mix_resolver().resolve_concrete_or_default(self.grade.as_deref()),
        );
        check_concrete_prices(&mut report, ctx, &self.prices);
        check_workforce(
            &mut report,
            &self.crew,
            "productivity_m3_per_day",
            self.productivity_m3_per_day,
        );
        check_margins(&mut report, self.waste_percent, self.profit_percent);
        report
    }

    fn run(&self, ctx: &EstimationContext, tier: Tier) -> CalcResult<ConcreteEstimate> {
        let waste = ctx.settings.waste_fraction(self.waste_percent);
        let profit = ctx.settings.profit_fraction(self.profit_percent);
        let volume_m3 = self.volume_m3();

        let (grade, mix) = tier.settle(
            "grade",
            ctx.mix_resolver().resolve_concrete_or_default(self.grade.as_deref()),
        )?;
        let mut book = PriceBook::new(ctx, tier);
        let lines = concrete_lines(ctx, tier, &mut book, &mix, &self.prices)?;
        let materials = tier.settle("materials", price_lines(&lines, volume_m3, waste))?;

        let labor = tier.settle(
            "labor",
            ctx.labor_scheduler()
                .schedule(&self.crew, self.productivity_m3_per_day, volume_m3),
        )?;

        let estimate = tier
            .settle("estimate", aggregate(materials.total_cost, labor.labor_cost, profit))?
            .with_base_quantity(volume_m3)
            .with_duration(labor.duration_days)
            .with_missing_prices(book.into_missing());

        Ok(ConcreteEstimate {
            grade,
            water_l: mix.water_l_per_m3() * volume_m3,
            mix,
            volume_m3,
            materials,
            labor,
            estimate,
        })
    }

    /// Live figures; blank or invalid fields give zero-valued stages.
    pub fn preview(&self, ctx: &EstimationContext) -> ConcreteEstimate {
        self.run(ctx, Tier::Preview).unwrap_or_default()
    }

    /// Validate every field, then compute.
    pub fn commit(&self, ctx: &EstimationContext) -> CalcResult<ConcreteEstimate> {
        self.validate(ctx).into_result()?;
        let result = self.run(ctx, Tier::Commit)?;
        tracing::debug!(
            label = %self.label,
            grade = %result.grade,
            volume_m3 = result.volume_m3,
            hpp = result.estimate.hpp,
            "concrete work estimated"
        );
        Ok(result)
    }
}
