//! # Footing Calculation
//!
//! Foot plate (pondasi telapak): a rectangular pad with a two-way rebar mat,
//! estimated in three stages:
//!
//! | Stage | Base quantity | Materials |
//! |-------|---------------|-----------|
//! | concrete | volume (m³) | cement, sand, gravel by grade |
//! | formwork | side area (m²) | formwork per m² |
//! | reinforcement | rebar weight (kg) | rebar per kg |
//!
//! Each stage is scheduled with fractional days. The stages are combined in
//! the item's [`SubWorkMode`] (the settings default when absent) and only
//! the combined duration is rounded up.
//!
//! The combined base quantity is the number of footings, so per-unit figures
//! read as cost per footing.

use serde::{Deserialize, Serialize};

use super::concrete::{check_concrete_prices, concrete_lines, ConcretePrices};
use super::{check_margins, check_price, check_workforce, names, PriceBook, Tier};
use crate::context::EstimationContext;
use crate::errors::{CalcResult, IssueKind, ValidationReport};
use crate::estimate::{
    aggregate, aggregate_sub_works, EstimationResult, SubWorkMode, SubWorkResult,
};
use crate::geometry::{compute_volume, formwork_area_m2, ShapeSpec};
use crate::labor::{LaborSchedule, WorkerAllocation};
use crate::materials::{price_lines, ConcreteMix, MaterialCost, MaterialLine};
use crate::reinforcement::{FootingReinforcementPlan, FootingReinforcementSpec};
use crate::tables::preset;
use crate::units::{Percent, Quantity};

pub const CONCRETE_STAGE: &str = "concrete";
pub const FORMWORK_STAGE: &str = "formwork";
pub const REINFORCEMENT_STAGE: &str = "reinforcement";

/// Rebar mat layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebarLayout {
    pub cover_mm: f64,
    pub spacing_mm: f64,
    pub bar_code: String,
    pub layers: u32,
}

impl Default for RebarLayout {
    fn default() -> Self {
        let spec = FootingReinforcementSpec::default();
        RebarLayout {
            cover_mm: spec.cover_mm,
            spacing_mm: spec.spacing_mm,
            bar_code: spec.bar_code,
            layers: spec.layers,
        }
    }
}

/// Unit prices; a blank price is looked up in the catalog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FootingPrices {
    #[serde(flatten)]
    pub concrete: ConcretePrices,
    pub rebar_per_kg: Option<f64>,
    pub formwork_per_m2: Option<f64>,
}

/// Output of one team per day, per stage
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageProductivity {
    pub concrete_m3_per_day: f64,
    pub formwork_m2_per_day: f64,
    pub rebar_kg_per_day: f64,
}

/// Input parameters for a footing.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "F1",
///   "length_m": 1.2,
///   "width_m": 1.2,
///   "thickness_m": 0.3,
///   "count": 4,
///   "rebar": { "cover_mm": 50, "spacing_mm": 150, "bar_code": "D13", "layers": 1 },
///   "grade": "K-225",
///   "prices": { "cement_per_sack": 70000, "sand_per_m3": 250000, "gravel_per_m3": 300000,
///               "rebar_per_kg": 14000, "formwork_per_m2": 95000 },
///   "crew": { "tukang_count": 2, "pekerja_count": 2,
///             "ratio": { "tukang_units": 1, "pekerja_units": 1 } },
///   "productivity": { "concrete_m3_per_day": 1.0, "formwork_m2_per_day": 6.0,
///                     "rebar_kg_per_day": 100.0 },
///   "sub_work_mode": "sequential"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootingInput {
    /// User label (e.g., "F1", "Pad under column K1")
    pub label: String,

    pub length_m: f64,

    pub width_m: f64,

    pub thickness_m: f64,

    /// Identical footings
    pub count: u32,

    pub rebar: RebarLayout,

    /// Grade code; the table's default grade when absent or blank
    pub grade: Option<String>,

    pub prices: FootingPrices,

    pub crew: WorkerAllocation,

    pub productivity: StageProductivity,

    /// Settings default when absent
    pub sub_work_mode: Option<SubWorkMode>,

    pub waste_percent: Option<Percent>,

    pub profit_percent: Option<Percent>,
}

impl Default for FootingInput {
    fn default() -> Self {
        FootingInput {
            label: String::new(),
            length_m: 0.0,
            width_m: 0.0,
            thickness_m: 0.0,
            count: 1,
            rebar: RebarLayout::default(),
            grade: None,
            prices: FootingPrices::default(),
            crew: WorkerAllocation::default(),
            productivity: StageProductivity::default(),
            sub_work_mode: None,
            waste_percent: None,
            profit_percent: None,
        }
    }
}

/// Quantities, materials and labor of one stage (all footings)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FootingStage {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub materials: MaterialCost,
    /// Fractional days
    pub labor: LaborSchedule,
}

/// Results from a footing calculation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FootingEstimate {
    pub grade: String,
    pub mix: ConcreteMix,
    /// Concrete for all footings (m³)
    pub volume_m3: f64,
    /// Formwork for all footings (m²)
    pub formwork_area_m2: f64,
    /// Mat of a single footing
    pub reinforcement: FootingReinforcementPlan,
    /// Rebar for all footings (kg)
    pub rebar_weight_kg: f64,
    /// Stock bars for all footings
    pub stock_bars: f64,
    pub stages: Vec<FootingStage>,
    pub mode: SubWorkMode,
    pub estimate: EstimationResult,
}

impl FootingEstimate {
    pub fn stage(&self, name: &str) -> Option<&FootingStage> {
        self.stages.iter().find(|s| s.name == name)
    }
}

/// One stage to be priced and scheduled
struct StageWork<'a> {
    name: &'static str,
    quantity: f64,
    unit: &'static str,
    lines: &'a [MaterialLine],
    productivity: f64,
}

impl FootingInput {
    fn shape(&self) -> ShapeSpec {
        ShapeSpec::RectangularPrism {
            length_m: self.length_m,
            width_m: self.width_m,
            height_m: self.thickness_m,
        }
    }

    pub fn reinforcement_spec(&self) -> FootingReinforcementSpec {
        FootingReinforcementSpec {
            length_m: self.length_m,
            width_m: self.width_m,
            cover_mm: self.rebar.cover_mm,
            spacing_mm: self.rebar.spacing_mm,
            bar_code: self.rebar.bar_code.clone(),
            layers: self.rebar.layers,
        }
    }

    pub fn validate(&self, ctx: &EstimationContext) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.require_positive("length_m", self.length_m, "Footing length must be positive");
        report.require_positive("width_m", self.width_m, "Footing width must be positive");
        report.require_positive(
            "thickness_m",
            self.thickness_m,
            "Footing thickness must be positive",
        );
        if self.count == 0 {
            report.push(
                "count",
                0,
                IssueKind::InvalidDimensions,
                "Footing count must be at least 1",
            );
        }

        // length and width are already reported above
        let mut rebar = ctx.reinforcement_planner().validate(&self.reinforcement_spec());
        rebar.issues.retain(|i| i.field != "length_m" && i.field != "width_m");
        report.extend_prefixed("rebar", rebar);

        report.check(
            "grade",
            ctx.mix_resolver().resolve_concrete_or_default(self.grade.as_deref()),
        );

        check_concrete_prices(&mut report, ctx, &self.prices.concrete);
        check_price(
            &mut report,
            ctx,
            "prices.rebar_per_kg",
            names::REBAR,
            "kg",
            self.prices.rebar_per_kg,
        );
        check_price(
            &mut report,
            ctx,
            "prices.formwork_per_m2",
            names::FORMWORK,
            "m2",
            self.prices.formwork_per_m2,
        );

        let p = &self.productivity;
        check_workforce(
            &mut report,
            &self.crew,
            "productivity.concrete_m3_per_day",
            p.concrete_m3_per_day,
        );
        report.require_positive(
            "productivity.formwork_m2_per_day",
            p.formwork_m2_per_day,
            "Productivity must be positive",
        );
        report.require_positive(
            "productivity.rebar_kg_per_day",
            p.rebar_kg_per_day,
            "Productivity must be positive",
        );

        check_margins(&mut report, self.waste_percent, self.profit_percent);
        report
    }

    fn stage(
        &self,
        ctx: &EstimationContext,
        tier: Tier,
        work: StageWork<'_>,
        waste: f64,
        profit: f64,
    ) -> CalcResult<(FootingStage, SubWorkResult)> {
        let materials = tier.settle(work.name, price_lines(work.lines, work.quantity, waste))?;
        let labor = tier.settle(
            work.name,
            ctx.labor_scheduler()
                .schedule_fractional(&self.crew, work.productivity, work.quantity),
        )?;
        let estimate = tier
            .settle(work.name, aggregate(materials.total_cost, labor.labor_cost, profit))?
            .with_base_quantity(work.quantity)
            .with_duration(labor.duration_days);

        let stage = FootingStage {
            name: work.name.to_string(),
            quantity: work.quantity,
            unit: work.unit.to_string(),
            materials,
            labor,
        };
        Ok((stage, SubWorkResult::new(work.name, estimate)))
    }

    fn run(&self, ctx: &EstimationContext, tier: Tier) -> CalcResult<FootingEstimate> {
        let waste = ctx.settings.waste_fraction(self.waste_percent);
        let profit = ctx.settings.profit_fraction(self.profit_percent);
        let count = self.count as f64;

        let volume_m3 = compute_volume(&self.shape()) * count;
        let formwork_m2 = formwork_area_m2(self.length_m, self.width_m, self.thickness_m) * count;

        let (grade, mix) = tier.settle(
            "grade",
            ctx.mix_resolver().resolve_concrete_or_default(self.grade.as_deref()),
        )?;
        let reinforcement = tier.settle(
            REINFORCEMENT_STAGE,
            ctx.reinforcement_planner().plan_footing(&self.reinforcement_spec()),
        )?;
        let rebar_weight_kg = reinforcement.total_weight_kg * count;
        let bar_length = Quantity::new(reinforcement.total_length_m * count, "m");
        let stock_bars = tier.settle(
            REINFORCEMENT_STAGE,
            ctx.converter()
                .to_market(&bar_length, preset::REBAR_BAR)
                .map(|q| q.value.ceil()),
        )?;

        let mut book = PriceBook::new(ctx, tier);
        let concrete = concrete_lines(ctx, tier, &mut book, &mix, &self.prices.concrete)?;
        let formwork = [MaterialLine::new(
            names::FORMWORK,
            1.0,
            "m2",
            book.price(names::FORMWORK, "m2", self.prices.formwork_per_m2)?,
        )];
        let rebar = [MaterialLine::new(
            names::REBAR,
            1.0,
            "kg",
            book.price(names::REBAR, "kg", self.prices.rebar_per_kg)?,
        )];

        let works = [
            StageWork {
                name: CONCRETE_STAGE,
                quantity: volume_m3,
                unit: "m3",
                lines: &concrete,
                productivity: self.productivity.concrete_m3_per_day,
            },
            StageWork {
                name: FORMWORK_STAGE,
                quantity: formwork_m2,
                unit: "m2",
                lines: &formwork,
                productivity: self.productivity.formwork_m2_per_day,
            },
            StageWork {
                name: REINFORCEMENT_STAGE,
                quantity: rebar_weight_kg,
                unit: "kg",
                lines: &rebar,
                productivity: self.productivity.rebar_kg_per_day,
            },
        ];

        let mut stages = Vec::with_capacity(works.len());
        let mut sub_works = Vec::with_capacity(works.len());
        for work in works {
            let (stage, sub) = self.stage(ctx, tier, work, waste, profit)?;
            stages.push(stage);
            sub_works.push(sub);
        }

        let mode = self.sub_work_mode.unwrap_or(ctx.settings.default_sub_work_mode);
        let estimate = aggregate_sub_works(sub_works, mode)
            .with_base_quantity(count)
            .with_missing_prices(book.into_missing())
            .finalize_duration();

        Ok(FootingEstimate {
            grade,
            mix,
            volume_m3,
            formwork_area_m2: formwork_m2,
            reinforcement,
            rebar_weight_kg,
            stock_bars,
            stages,
            mode,
            estimate,
        })
    }

    /// Live figures; blank or invalid fields give zero-valued stages.
    pub fn preview(&self, ctx: &EstimationContext) -> FootingEstimate {
        self.run(ctx, Tier::Preview).unwrap_or_default()
    }

    /// Validate every field, then compute.
    pub fn commit(&self, ctx: &EstimationContext) -> CalcResult<FootingEstimate> {
        self.validate(ctx).into_result()?;
        let result = self.run(ctx, Tier::Commit)?;
        tracing::debug!(
            label = %self.label,
            footings = self.count,
            mode = ?result.mode,
            days = result.estimate.duration_days,
            hpp = result.estimate.hpp,
            "footing estimated"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labor::WorkerRatio;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    fn footings() -> FootingInput {
        FootingInput {
            label: "F1".to_string(),
            length_m: 1.2,
            width_m: 1.2,
            thickness_m: 0.3,
            count: 4,
            rebar: RebarLayout {
                cover_mm: 50.0,
                spacing_mm: 150.0,
                bar_code: "D13".to_string(),
                layers: 1,
            },
            grade: Some("K-225".to_string()),
            prices: FootingPrices {
                concrete: ConcretePrices {
                    cement_per_sack: Some(70_000.0),
                    sand_per_m3: Some(250_000.0),
                    gravel_per_m3: Some(300_000.0),
                },
                rebar_per_kg: Some(14_000.0),
                formwork_per_m2: Some(95_000.0),
            },
            crew: WorkerAllocation::new(2, 2, WorkerRatio::ONE_TO_ONE),
            productivity: StageProductivity {
                concrete_m3_per_day: 1.0,
                formwork_m2_per_day: 6.0,
                rebar_kg_per_day: 100.0,
            },
            sub_work_mode: Some(SubWorkMode::Sequential),
            waste_percent: Some(Percent(0.0)),
            profit_percent: Some(Percent(10.0)),
        }
    }

    #[test]
    fn test_stage_quantities() {
        let r = footings().commit(&EstimationContext::default()).unwrap();
        assert!(close(r.volume_m3, 1.728, 1e-12));
        assert!(close(r.formwork_area_m2, 5.76, 1e-12));

        // (1200 - 100) / 150 = 7.33 -> 8 intervals -> 9 bars, each 1.2 m, both ways
        assert_eq!(r.reinforcement.x.bar_count, 9);
        assert!(close(r.reinforcement.total_length_m, 21.6, 1e-12));
        assert!(close(r.rebar_weight_kg, 21.6 * 1.042 * 4.0, 1e-12));
        // 86.4 m / 12 m
        assert_eq!(r.stock_bars, 8.0);

        assert_eq!(r.stages.len(), 3);
        assert_eq!(r.stage(FORMWORK_STAGE).unwrap().unit, "m2");
    }

    #[test]
    fn test_sequential_sums_fractional_days_then_rounds() {
        let r = footings().commit(&EstimationContext::default()).unwrap();
        let days: Vec<f64> = r.stages.iter().map(|s| s.labor.duration_days).collect();
        // 1.728 / 2, 5.76 / 12, 90.0288 / 200
        assert!(close(days[0], 0.864, 1e-12));
        assert!(close(days[1], 0.48, 1e-12));
        assert!(close(days[2], 0.450144, 1e-12));
        assert_eq!(r.estimate.duration_days, 2.0);
    }

    #[test]
    fn test_parallel_takes_longest_stage() {
        let input = FootingInput { sub_work_mode: Some(SubWorkMode::Parallel), ..footings() };
        let r = input.commit(&EstimationContext::default()).unwrap();
        assert_eq!(r.mode, SubWorkMode::Parallel);
        assert_eq!(r.estimate.duration_days, 1.0);

        let sequential = footings().commit(&EstimationContext::default()).unwrap();
        assert!(close(r.estimate.hpp, sequential.estimate.hpp, 1e-12));
    }

    #[test]
    fn test_totals_equal_sum_of_stages() {
        let r = footings().commit(&EstimationContext::default()).unwrap();
        let hpp: f64 = r.estimate.sub_works.iter().map(|s| s.estimate.hpp).sum();
        let rab: f64 = r.estimate.sub_works.iter().map(|s| s.estimate.rab).sum();
        assert!(close(r.estimate.hpp, hpp, 1e-12));
        assert!(close(r.estimate.rab, rab, 1e-12));
        assert_eq!(r.estimate.base_quantity, 4.0);

        let rebar = r.estimate.sub_work(REINFORCEMENT_STAGE).unwrap();
        assert!(close(rebar.material_cost, r.rebar_weight_kg * 14_000.0, 1e-9));
        let formwork = r.estimate.sub_work(FORMWORK_STAGE).unwrap();
        assert!(close(formwork.material_cost, 5.76 * 95_000.0, 1e-9));
    }

    #[test]
    fn test_reinforcement_scenario() {
        let input = FootingInput {
            length_m: 2.0,
            width_m: 2.0,
            count: 1,
            rebar: RebarLayout { cover_mm: 40.0, spacing_mm: 200.0, ..footings().rebar },
            ..footings()
        };
        let r = input.commit(&EstimationContext::default()).unwrap();
        assert!(close(r.reinforcement.x.effective_span_m, 1.92, 1e-12));
        assert_eq!(r.reinforcement.x.bar_count, 11);
        assert_eq!(r.reinforcement.y.bar_count, 11);
    }

    #[test]
    fn test_settings_mode_used_when_absent() {
        let mut ctx = EstimationContext::default();
        ctx.settings.default_sub_work_mode = SubWorkMode::Parallel;
        let input = FootingInput { sub_work_mode: None, ..footings() };
        assert_eq!(input.commit(&ctx).unwrap().mode, SubWorkMode::Parallel);
    }

    #[test]
    fn test_commit_rejects_bad_design() {
        let input = FootingInput {
            thickness_m: 0.0,
            rebar: RebarLayout {
                cover_mm: 10.0,
                spacing_mm: 350.0,
                bar_code: "D99".to_string(),
                layers: 1,
            },
            ..footings()
        };
        let err = input.commit(&EstimationContext::default()).unwrap_err();
        let fields: Vec<_> = err.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["thickness_m", "rebar.cover_mm", "rebar.spacing_mm", "rebar.bar_code"]
        );
    }

    #[test]
    fn test_preview_blank_input() {
        let r = FootingInput::default().preview(&EstimationContext::default());
        assert_eq!(r.volume_m3, 0.0);
        assert_eq!(r.estimate.hpp, 0.0);
        assert_eq!(r.estimate.duration_days, 0.0);
    }

    #[test]
    fn test_preview_unknown_bar_still_prices_concrete() {
        let mut input = footings();
        input.rebar.bar_code = "D99".to_string();
        let r = input.preview(&EstimationContext::default());
        assert_eq!(r.rebar_weight_kg, 0.0);
        assert!(r.estimate.sub_work(CONCRETE_STAGE).unwrap().material_cost > 0.0);
    }

    #[test]
    fn test_preview_flags_unpriced_rebar() {
        let mut input = footings();
        input.prices.rebar_per_kg = None;
        let r = input.preview(&EstimationContext::default());

        assert_eq!(r.estimate.missing_prices, vec![names::REBAR]);
        assert_eq!(r.estimate.sub_work(REINFORCEMENT_STAGE).unwrap().material_cost, 0.0);
        assert!(r.estimate.sub_work(FORMWORK_STAGE).unwrap().material_cost > 0.0);
        // the total still counts footings
        assert_eq!(r.estimate.base_quantity, 4.0);
    }
}
