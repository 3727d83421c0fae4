//! # Geometry
//!
//! Base quantities from shape dimensions: volumes of cast elements and the
//! wall area a package of bricks covers.
//!
//! ## Forgiving volumes
//!
//! [`compute_volume`] returns `0.0` when any dimension is zero, negative or
//! blank instead of failing, so a form can show a live figure while the user
//! is still typing. [`ShapeSpec::validate`] is the strict check a final
//! estimate runs before accepting the volume.
//!
//! ## Brick coverage
//!
//! ```text
//! effective_length = brick_length + mortar        (m)
//! effective_height = brick_height + mortar        (m)
//! area_per_brick   = effective_length × effective_height
//! total_area_base  = pieces_per_package × area_per_brick
//! total_area_waste = total_area_base × (1 + waste)
//! bricks_per_m2    = 1 / area_per_brick
//! packages_per_m2  = 1 / total_area_waste
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rab_core::geometry::{compute_volume, ShapeSpec};
//!
//! let footing = ShapeSpec::RectangularPrism { length_m: 1.0, width_m: 1.0, height_m: 0.3 };
//! assert!((compute_volume(&footing) - 0.3).abs() < 1e-12);
//!
//! let blank = ShapeSpec::Cylinder { radius_m: 0.0, height_m: 3.0 };
//! assert_eq!(compute_volume(&blank), 0.0);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::conversion::ConversionRule;
use crate::errors::{CalcError, CalcResult, ValidationReport};
use crate::materials::validate_waste_fraction;
use crate::units::{Meters, Millimeters};

/// Shape of a cast element or masonry course.
///
/// Lengths in meters; brick dimensions in millimeters. Omitted fields
/// deserialize as `0`.
///
/// ## JSON Example
///
/// ```json
/// { "shape": "cylinder", "radius_m": 0.15, "height_m": 3.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ShapeSpec {
    RectangularPrism {
        #[serde(default)]
        length_m: f64,
        #[serde(default)]
        width_m: f64,
        #[serde(default)]
        height_m: f64,
    },
    Cylinder {
        #[serde(default)]
        radius_m: f64,
        #[serde(default)]
        height_m: f64,
    },
    Sphere {
        #[serde(default)]
        radius_m: f64,
    },
    Cone {
        #[serde(default)]
        radius_m: f64,
        #[serde(default)]
        height_m: f64,
    },
    Pyramid {
        #[serde(default)]
        base_length_m: f64,
        #[serde(default)]
        base_width_m: f64,
        #[serde(default)]
        height_m: f64,
    },
    TrapezoidPrism {
        #[serde(default)]
        top_length_m: f64,
        #[serde(default)]
        bottom_length_m: f64,
        #[serde(default)]
        width_m: f64,
        #[serde(default)]
        height_m: f64,
    },
    /// A masonry wall one brick thick
    BrickCourse {
        #[serde(default)]
        wall_length_m: f64,
        #[serde(default)]
        wall_height_m: f64,
        #[serde(default)]
        brick_width_mm: f64,
    },
}

impl ShapeSpec {
    /// Shape kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            ShapeSpec::RectangularPrism { .. } => "rectangular_prism",
            ShapeSpec::Cylinder { .. } => "cylinder",
            ShapeSpec::Sphere { .. } => "sphere",
            ShapeSpec::Cone { .. } => "cone",
            ShapeSpec::Pyramid { .. } => "pyramid",
            ShapeSpec::TrapezoidPrism { .. } => "trapezoid_prism",
            ShapeSpec::BrickCourse { .. } => "brick_course",
        }
    }

    /// Named dimensions of this shape
    pub fn dimensions(&self) -> Vec<(&'static str, f64)> {
        match *self {
            ShapeSpec::RectangularPrism { length_m, width_m, height_m } => {
                vec![("length_m", length_m), ("width_m", width_m), ("height_m", height_m)]
            }
            ShapeSpec::Cylinder { radius_m, height_m } | ShapeSpec::Cone { radius_m, height_m } => {
                vec![("radius_m", radius_m), ("height_m", height_m)]
            }
            ShapeSpec::Sphere { radius_m } => vec![("radius_m", radius_m)],
            ShapeSpec::Pyramid { base_length_m, base_width_m, height_m } => vec![
                ("base_length_m", base_length_m),
                ("base_width_m", base_width_m),
                ("height_m", height_m),
            ],
            ShapeSpec::TrapezoidPrism { top_length_m, bottom_length_m, width_m, height_m } => vec![
                ("top_length_m", top_length_m),
                ("bottom_length_m", bottom_length_m),
                ("width_m", width_m),
                ("height_m", height_m),
            ],
            ShapeSpec::BrickCourse { wall_length_m, wall_height_m, brick_width_mm } => vec![
                ("wall_length_m", wall_length_m),
                ("wall_height_m", wall_height_m),
                ("brick_width_mm", brick_width_mm),
            ],
        }
    }

    /// True when every dimension is strictly positive
    pub fn is_complete(&self) -> bool {
        self.dimensions().iter().all(|(_, v)| *v > 0.0)
    }

    /// Strict check for a final estimate: every dimension must be positive.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for (field, value) in self.dimensions() {
            let message = format!("{} of a {} must be positive", field, self.kind());
            report.require_positive(field, value, &message);
        }
        report
    }

    /// Wall face area of a brick course (m²); 0 for other shapes
    pub fn face_area_m2(&self) -> f64 {
        match *self {
            ShapeSpec::BrickCourse {
                wall_length_m,
                wall_height_m,
                ..
            } if wall_length_m > 0.0 && wall_height_m > 0.0 => wall_length_m * wall_height_m,
            _ => 0.0,
        }
    }
}

/// Volume of a shape in m³; `0.0` for any incomplete shape.
pub fn compute_volume(shape: &ShapeSpec) -> f64 {
    if !shape.is_complete() {
        return 0.0;
    }
    match *shape {
        ShapeSpec::RectangularPrism {
            length_m,
            width_m,
            height_m,
        } => length_m * width_m * height_m,
        ShapeSpec::Cylinder { radius_m, height_m } => PI * radius_m * radius_m * height_m,
        ShapeSpec::Sphere { radius_m } => (4.0 / 3.0) * PI * radius_m.powi(3),
        ShapeSpec::Cone { radius_m, height_m } => (1.0 / 3.0) * PI * radius_m * radius_m * height_m,
        ShapeSpec::Pyramid { base_length_m, base_width_m, height_m } => {
            (1.0 / 3.0) * base_length_m * base_width_m * height_m
        }
        ShapeSpec::TrapezoidPrism { top_length_m, bottom_length_m, width_m, height_m } => {
            0.5 * (top_length_m + bottom_length_m) * width_m * height_m
        }
        ShapeSpec::BrickCourse { wall_length_m, wall_height_m, brick_width_mm } => {
            let thickness: Meters = Millimeters(brick_width_mm).into();
            wall_length_m * wall_height_m * thickness.0
        }
    }
}

/// Formwork (side) area of a rectangular element, m²; `0.0` when incomplete
pub fn formwork_area_m2(length_m: f64, width_m: f64, height_m: f64) -> f64 {
    if length_m > 0.0 && width_m > 0.0 && height_m > 0.0 {
        2.0 * (length_m + width_m) * height_m
    } else {
        0.0
    }
}

// ============================================================================
// Brick coverage
// ============================================================================

/// Typical brick dimension ranges (mm) for advisory warnings
pub mod typical {
    pub const LENGTH_MM: (f64, f64) = (100.0, 600.0);
    pub const WIDTH_MM: (f64, f64) = (50.0, 300.0);
    pub const HEIGHT_MM: (f64, f64) = (30.0, 250.0);
}

/// Brick package and unit dimensions.
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
///   "waste_fraction": 0.05
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickCoverageParams {
    pub pieces_per_package: f64,
    pub brick_length_mm: f64,
    /// May be 0 for area-only estimates
    pub brick_width_mm: f64,
    pub brick_height_mm: f64,
    pub mortar_thickness_mm: f64,
    pub waste_fraction: f64,
}

/// Advisory note about an unusual (but accepted) dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionWarning {
    pub field: String,
    pub value_mm: f64,
    pub typical_min_mm: f64,
    pub typical_max_mm: f64,
    pub message: String,
}

/// Coverage of one brick package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageResult {
    pub effective_length_m: f64,
    pub effective_height_m: f64,
    pub area_per_brick_m2: f64,
    pub total_area_base_m2: f64,
    pub total_area_with_waste_m2: f64,
    pub bricks_per_m2: f64,
    pub packages_per_m2: f64,
    /// Mortar volume per m² of wall, one brick thick (0 when width is 0)
    pub mortar_volume_per_m2: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DimensionWarning>,
}

impl CoverageResult {
    /// `1 package = total_area_with_waste m²` as a conversion rule
    pub fn package_rule(&self, package_unit: &str) -> CalcResult<ConversionRule> {
        let rule = ConversionRule::new(
            format!("brick-{}-coverage", package_unit),
            package_unit,
            "m2",
            self.total_area_with_waste_m2,
        );
        rule.validate()?;
        Ok(rule)
    }
}

fn check_range(
    warnings: &mut Vec<DimensionWarning>,
    field: &str,
    value: f64,
    (min, max): (f64, f64),
) {
    if value < min || value > max {
        warnings.push(DimensionWarning {
            field: field.to_string(),
            value_mm: value,
            typical_min_mm: min,
            typical_max_mm: max,
            message: format!("{} of {} mm is outside the typical {}-{} mm", field, value, min, max),
        });
    }
}

/// Wall area covered by one brick package.
///
/// # Errors
///
/// * `InvalidDimensions` - pieces, brick length or brick height not positive,
///   or a negative width/mortar thickness
/// * `InvalidWasteFactor` - negative waste
pub fn compute_brick_coverage(params: &BrickCoverageParams) -> CalcResult<CoverageResult> {
    let required = [
        ("pieces_per_package", params.pieces_per_package),
        ("brick_length_mm", params.brick_length_mm),
        ("brick_height_mm", params.brick_height_mm),
    ];
    for (field, value) in required {
        if !(value > 0.0) {
            return Err(CalcError::invalid_dimensions(field, value.to_string(), "must be positive"));
        }
    }
    for (field, value) in [
        ("brick_width_mm", params.brick_width_mm),
        ("mortar_thickness_mm", params.mortar_thickness_mm),
    ] {
        if !(value >= 0.0) {
            return Err(CalcError::invalid_dimensions(
                field,
                value.to_string(),
                "cannot be negative",
            ));
        }
    }
    validate_waste_fraction(params.waste_fraction)?;

    let mut warnings = Vec::new();
    check_range(&mut warnings, "brick_length_mm", params.brick_length_mm, typical::LENGTH_MM);
    if params.brick_width_mm > 0.0 {
        check_range(&mut warnings, "brick_width_mm", params.brick_width_mm, typical::WIDTH_MM);
    }
    check_range(&mut warnings, "brick_height_mm", params.brick_height_mm, typical::HEIGHT_MM);
    for w in &warnings {
        tracing::warn!(field = %w.field, value_mm = w.value_mm, "unusual brick dimension");
    }

    let mortar = Meters::from(Millimeters(params.mortar_thickness_mm));
    let effective_length = Meters::from(Millimeters(params.brick_length_mm)) + mortar;
    let effective_height = Meters::from(Millimeters(params.brick_height_mm)) + mortar;

    let area_per_brick = (effective_length * effective_height).0;
    let total_area_base = params.pieces_per_package * area_per_brick;
    let total_area_with_waste = total_area_base * (1.0 + params.waste_fraction);
    let bricks_per_m2 = 1.0 / area_per_brick;

    // wall one brick thick: mortar fills what the bricks' faces leave open
    let brick_face = Meters::from(Millimeters(params.brick_length_mm))
        * Meters::from(Millimeters(params.brick_height_mm));
    let thickness = Meters::from(Millimeters(params.brick_width_mm));
    let mortar_volume_per_m2 = (1.0 - bricks_per_m2 * brick_face.0).max(0.0) * thickness.0;

    tracing::debug!(area_per_brick, total_area_base, total_area_with_waste, "brick coverage");

    Ok(CoverageResult {
        effective_length_m: effective_length.0,
        effective_height_m: effective_height.0,
        area_per_brick_m2: area_per_brick,
        total_area_base_m2: total_area_base,
        total_area_with_waste_m2: total_area_with_waste,
        bricks_per_m2,
        packages_per_m2: 1.0 / total_area_with_waste,
        mortar_volume_per_m2,
        warnings,
    })
}
