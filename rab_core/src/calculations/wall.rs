//! # Brick Wall Calculation
//!
//! Pasangan bata: a masonry wall one brick thick laid in cement/sand mortar.
//!
//! ## Method
//!
//! 1. Wall area = length × height - openings (m², the base quantity)
//! 2. Brick coverage gives bricks per m² and the mortar volume per m²
//! 3. Bricks are bought in packages: `bricks_per_m2 / pieces_per_package`
//! 4. Mortar is mixed by the ratio `C:S` from dry materials:
//!
//! ```text
//! dry_mortar = mortar_volume × 1.3
//! cement     = dry_mortar × cement_fraction   (m³ → kg → sacks)
//! sand       = dry_mortar × sand_fraction     (m³)
//! ```
//!
//! 5. Labor is scheduled on the wall area; duration rounds up to whole days.
//!
//! ## Example
//!
//! ```rust
//! use rab_core::calculations::wall::{BrickSpec, BrickWallInput, BrickWallPrices};
//! use rab_core::context::EstimationContext;
//! use rab_core::labor::WorkerAllocation;
//!
//! let input = BrickWallInput {
//!     label: "Wall A".to_string(),
//!     wall_length_m: 10.0,
//!     wall_height_m: 3.0,
//!     brick: BrickSpec::red_brick(),
//!     prices: BrickWallPrices {
//!         brick_per_package: Some(4_500_000.0),
//!         cement_per_sack: Some(70_000.0),
//!         sand_per_m3: Some(250_000.0),
//!     },
//!     crew: WorkerAllocation::new(2, 2, "1:1".parse().unwrap()),
//!     productivity_m2_per_day: 8.0,
//!     ..Default::default()
//! };
//!
//! let result = input.commit(&EstimationContext::default()).unwrap();
//! assert_eq!(result.wall_area_m2, 30.0);
//! assert_eq!(result.labor.duration_days, 2.0);
//! ```

use serde::{Deserialize, Serialize};

use super::{check_margins, check_price, check_workforce, names, PriceBook, Tier};
use crate::context::EstimationContext;
use crate::errors::{CalcResult, IssueKind, ValidationReport};
use crate::estimate::{aggregate, EstimationResult};
use crate::geometry::{
    compute_brick_coverage, compute_volume, BrickCoverageParams, CoverageResult,
    DimensionWarning, ShapeSpec,
};
use crate::labor::{LaborSchedule, WorkerAllocation};
use crate::materials::{price_lines, MaterialCost, MaterialLine, DEFAULT_MORTAR_RATIO};
use crate::mix::MortarMix;
use crate::units::Percent;

/// Dry material volume needed per m³ of wet mortar
pub const MORTAR_DRY_VOLUME_FACTOR: f64 = 1.3;

/// Brick unit and package.
///
/// ## JSON Example
///
/// ```json
/// {
///   "pieces_per_package": 6000,
///   "brick_length_mm": 230,
///   "brick_width_mm": 110,
///   "brick_height_mm": 50,
///   "mortar_thickness_mm": 10,
///   "package_unit": "truck"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickSpec {
    pub pieces_per_package: f64,
    pub brick_length_mm: f64,
    pub brick_width_mm: f64,
    pub brick_height_mm: f64,
    pub mortar_thickness_mm: f64,
    /// Unit a package is sold in ("truck", "pallet")
    pub package_unit: String,
}

impl Default for BrickSpec {
    fn default() -> Self {
        BrickSpec {
            pieces_per_package: 0.0,
            brick_length_mm: 0.0,
            brick_width_mm: 0.0,
            brick_height_mm: 0.0,
            mortar_thickness_mm: 0.0,
            package_unit: "truck".to_string(),
        }
    }
}

impl BrickSpec {
    /// Common fired red brick, 6000 per truck
    pub fn red_brick() -> Self {
        BrickSpec {
            pieces_per_package: 6000.0,
            brick_length_mm: 230.0,
            brick_width_mm: 110.0,
            brick_height_mm: 50.0,
            mortar_thickness_mm: 10.0,
            package_unit: "truck".to_string(),
        }
    }

    pub fn coverage_params(&self, waste_fraction: f64) -> BrickCoverageParams {
        BrickCoverageParams {
            pieces_per_package: self.pieces_per_package,
            brick_length_mm: self.brick_length_mm,
            brick_width_mm: self.brick_width_mm,
            brick_height_mm: self.brick_height_mm,
            mortar_thickness_mm: self.mortar_thickness_mm,
            waste_fraction,
        }
    }
}

/// Unit prices; a blank price is looked up in the catalog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickWallPrices {
    pub brick_per_package: Option<f64>,
    pub cement_per_sack: Option<f64>,
    pub sand_per_m3: Option<f64>,
}

/// Input parameters for a brick wall.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Wall A",
///   "wall_length_m": 10.0,
///   "wall_height_m": 3.0,
///   "openings_m2": 2.4,
///   "brick": { "pieces_per_package": 6000, "brick_length_mm": 230, "brick_width_mm": 110,
///              "brick_height_mm": 50, "mortar_thickness_mm": 10 },
///   "mortar_ratio": "1:4",
///   "prices": { "brick_per_package": 4500000, "cement_per_sack": 70000, "sand_per_m3": 250000 },
///   "crew": { "tukang_count": 2, "pekerja_count": 2,
///             "ratio": { "tukang_units": 1, "pekerja_units": 1 } },
///   "productivity_m2_per_day": 8.0,
///   "waste_percent": 5.0,
///   "profit_percent": 10.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickWallInput {
    /// User label for this wall (e.g., "Wall A", "Fence north")
    pub label: String,

    pub wall_length_m: f64,

    pub wall_height_m: f64,

    /// Doors and windows deducted from the wall face (m²)
    pub openings_m2: f64,

    pub brick: BrickSpec,

    /// Mortar `C:S`; the default ratio when absent
    pub mortar_ratio: Option<String>,

    pub prices: BrickWallPrices,

    pub crew: WorkerAllocation,

    /// Wall area one team lays per day
    pub productivity_m2_per_day: f64,

    /// Settings default when absent
    pub waste_percent: Option<Percent>,

    /// Settings default when absent
    pub profit_percent: Option<Percent>,
}

/// Results from a brick wall calculation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrickWallEstimate {
    /// Net wall area (m²), the base quantity
    pub wall_area_m2: f64,
    /// Gross masonry volume (m³)
    pub wall_volume_m3: f64,
    pub coverage: CoverageResult,
    pub mortar: MortarMix,
    /// Bricks to order, including waste
    pub brick_count: f64,
    pub materials: MaterialCost,
    pub labor: LaborSchedule,
    pub estimate: EstimationResult,
}

impl BrickWallEstimate {
    /// Advisory notes about unusual brick dimensions
    pub fn warnings(&self) -> &[DimensionWarning] {
        &self.coverage.warnings
    }
}

impl BrickWallInput {
    fn shape(&self) -> ShapeSpec {
        ShapeSpec::BrickCourse {
            wall_length_m: self.wall_length_m,
            wall_height_m: self.wall_height_m,
            brick_width_mm: self.brick.brick_width_mm,
        }
    }

    /// Wall face less openings (m²), 0 while incomplete
    pub fn wall_area_m2(&self) -> f64 {
        (self.shape().face_area_m2() - self.openings_m2.max(0.0)).max(0.0)
    }

    fn mortar_ratio_code(&self) -> &str {
        self.mortar_ratio
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_MORTAR_RATIO)
    }

    /// Strict validation for a final estimate.
    pub fn validate(&self, ctx: &EstimationContext) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.require_positive(
            "wall_length_m",
            self.wall_length_m,
            "Wall length must be positive",
        );
        report.require_positive(
            "wall_height_m",
            self.wall_height_m,
            "Wall height must be positive",
        );
        report.require_non_negative(
            "openings_m2",
            self.openings_m2,
            IssueKind::InvalidDimensions,
            "Openings cannot be negative",
        );
        let gross = self.shape().face_area_m2();
        if gross > 0.0 && self.openings_m2 >= gross {
            report.push(
                "openings_m2",
                self.openings_m2,
                IssueKind::InvalidDimensions,
                "Openings cover the whole wall",
            );
        }

        let brick = &self.brick;
        report.require_positive(
            "brick.pieces_per_package",
            brick.pieces_per_package,
            "Pieces per package must be positive",
        );
        report.require_positive(
            "brick.brick_length_mm",
            brick.brick_length_mm,
            "Brick length must be positive",
        );
        report.require_positive(
            "brick.brick_height_mm",
            brick.brick_height_mm,
            "Brick height must be positive",
        );
        report.require_positive(
            "brick.brick_width_mm",
            brick.brick_width_mm,
            "Brick width must be positive",
        );
        report.require_non_negative(
            "brick.mortar_thickness_mm",
            brick.mortar_thickness_mm,
            IssueKind::InvalidDimensions,
            "Mortar thickness cannot be negative",
        );

        report.check("mortar_ratio", ctx.mix_resolver().resolve_mortar(self.mortar_ratio_code()));
        let cement_unit = report
            .check("cement_preset", ctx.cement_unit())
            .unwrap_or_else(|| "sack".to_string());

        let prices = &self.prices;
        check_price(
            &mut report,
            ctx,
            "prices.brick_per_package",
            names::BRICK,
            &brick.package_unit,
            prices.brick_per_package,
        );
        check_price(
            &mut report,
            ctx,
            "prices.cement_per_sack",
            names::CEMENT,
            &cement_unit,
            prices.cement_per_sack,
        );
        check_price(&mut report, ctx, "prices.sand_per_m3", names::SAND, "m3", prices.sand_per_m3);

        check_workforce(
            &mut report,
            &self.crew,
            "productivity_m2_per_day",
            self.productivity_m2_per_day,
        );
        check_margins(&mut report, self.waste_percent, self.profit_percent);
        report
    }

    fn run(&self, ctx: &EstimationContext, tier: Tier) -> CalcResult<BrickWallEstimate> {
        let waste = ctx.settings.waste_fraction(self.waste_percent);
        let profit = ctx.settings.profit_fraction(self.profit_percent);
        let wall_area_m2 = self.wall_area_m2();

        let coverage = tier.settle(
            "brick coverage",
            compute_brick_coverage(&self.brick.coverage_params(waste)),
        )?;
        let mortar = tier.settle(
            "mortar",
            ctx.mix_resolver().resolve_mortar(self.mortar_ratio_code()),
        )?;

        let dry_mortar_m3 = coverage.mortar_volume_per_m2 * MORTAR_DRY_VOLUME_FACTOR;
        let cement_kg = tier.settle(
            "cement",
            ctx.cement_m3_to_kg(dry_mortar_m3 * mortar.cement_fraction),
        )?;
        let cement_sacks = tier.settle("cement", ctx.cement_kg_to_sacks(cement_kg))?;
        let cement_unit = tier.settle("cement", ctx.cement_unit())?;

        let packages_per_m2 = if self.brick.pieces_per_package > 0.0 {
            coverage.bricks_per_m2 / self.brick.pieces_per_package
        } else {
            0.0
        };
        let package_unit = &self.brick.package_unit;

        let mut book = PriceBook::new(ctx, tier);
        let lines = [
            MaterialLine::new(
                names::BRICK,
                packages_per_m2,
                package_unit.as_str(),
                book.price(names::BRICK, package_unit, self.prices.brick_per_package)?,
            ),
            MaterialLine::new(
                names::CEMENT,
                cement_sacks,
                cement_unit.as_str(),
                book.price(names::CEMENT, &cement_unit, self.prices.cement_per_sack)?,
            ),
            MaterialLine::new(
                names::SAND,
                dry_mortar_m3 * mortar.sand_fraction,
                "m3",
                book.price(names::SAND, "m3", self.prices.sand_per_m3)?,
            ),
        ];
        let materials = tier.settle("materials", price_lines(&lines, wall_area_m2, waste))?;

        let labor = tier.settle(
            "labor",
            ctx.labor_scheduler()
                .schedule(&self.crew, self.productivity_m2_per_day, wall_area_m2),
        )?;

        let estimate = tier
            .settle("estimate", aggregate(materials.total_cost, labor.labor_cost, profit))?
            .with_base_quantity(wall_area_m2)
            .with_duration(labor.duration_days)
            .with_missing_prices(book.into_missing());

        Ok(BrickWallEstimate {
            wall_area_m2,
            wall_volume_m3: compute_volume(&self.shape()),
            brick_count: coverage.bricks_per_m2 * wall_area_m2 * (1.0 + waste),
            coverage,
            mortar,
            materials,
            labor,
            estimate,
        })
    }

    /// Live figures; blank or invalid fields give zero-valued stages.
    pub fn preview(&self, ctx: &EstimationContext) -> BrickWallEstimate {
        self.run(ctx, Tier::Preview).unwrap_or_default()
    }

    /// Validate every field, then compute.
    ///
    /// # Errors
    ///
    /// * `Validation` - one issue per offending field
    pub fn commit(&self, ctx: &EstimationContext) -> CalcResult<BrickWallEstimate> {
        self.validate(ctx).into_result()?;
        let result = self.run(ctx, Tier::Commit)?;
        tracing::debug!(
            label = %self.label,
            area_m2 = result.wall_area_m2,
            hpp = result.estimate.hpp,
            rab = result.estimate.rab,
            "brick wall estimated"
        );
        Ok(result)
    }
}
