//! Concrete Grades and Mortar Ratios
//!
//! Reference mix proportions per cubic meter of concrete for the common
//! K-grades (characteristic strength in kg/cm²), plus the mortar ratios a
//! brick-and-plaster estimate is allowed to use.
//!
//! Cement is stored in kilograms; it is expressed in sacks only through an
//! explicit conversion rule (40 kg or 50 kg sacks both exist on the market).
//! Sand and gravel are loose volumes (m³ per m³ of concrete).

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Concrete K-grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConcreteGrade {
    #[serde(rename = "K-100")]
    K100,
    #[serde(rename = "K-125")]
    K125,
    #[serde(rename = "K-150")]
    K150,
    #[serde(rename = "K-175")]
    K175,
    #[serde(rename = "K-200")]
    K200,
    #[serde(rename = "K-225")]
    K225,
    #[serde(rename = "K-250")]
    K250,
    #[serde(rename = "K-275")]
    K275,
    #[serde(rename = "K-300")]
    K300,
    #[serde(rename = "K-350")]
    K350,
}

impl ConcreteGrade {
    /// All grades, weakest first
    pub const ALL: [ConcreteGrade; 10] = [
        ConcreteGrade::K100,
        ConcreteGrade::K125,
        ConcreteGrade::K150,
        ConcreteGrade::K175,
        ConcreteGrade::K200,
        ConcreteGrade::K225,
        ConcreteGrade::K250,
        ConcreteGrade::K275,
        ConcreteGrade::K300,
        ConcreteGrade::K350,
    ];

    /// Grade used when a work item does not name one
    pub const DEFAULT: ConcreteGrade = ConcreteGrade::K225;

    /// Table code (e.g., "K-225")
    pub fn code(&self) -> &'static str {
        match self {
            ConcreteGrade::K100 => "K-100",
            ConcreteGrade::K125 => "K-125",
            ConcreteGrade::K150 => "K-150",
            ConcreteGrade::K175 => "K-175",
            ConcreteGrade::K200 => "K-200",
            ConcreteGrade::K225 => "K-225",
            ConcreteGrade::K250 => "K-250",
            ConcreteGrade::K275 => "K-275",
            ConcreteGrade::K300 => "K-300",
            ConcreteGrade::K350 => "K-350",
        }
    }

    /// Characteristic strength in kg/cm²
    pub fn strength_kg_cm2(&self) -> u32 {
        match self {
            ConcreteGrade::K100 => 100,
            ConcreteGrade::K125 => 125,
            ConcreteGrade::K150 => 150,
            ConcreteGrade::K175 => 175,
            ConcreteGrade::K200 => 200,
            ConcreteGrade::K225 => 225,
            ConcreteGrade::K250 => 250,
            ConcreteGrade::K275 => 275,
            ConcreteGrade::K300 => 300,
            ConcreteGrade::K350 => 350,
        }
    }

    /// Reference proportions per m³ of concrete
    pub fn mix(&self) -> ConcreteMix {
        let (cement, sand, gravel, wc) = match self {
            ConcreteGrade::K100 => (250.0, 0.58, 0.72, 0.87),
            ConcreteGrade::K125 => (276.0, 0.56, 0.71, 0.78),
            ConcreteGrade::K150 => (300.0, 0.54, 0.70, 0.72),
            ConcreteGrade::K175 => (326.0, 0.52, 0.70, 0.66),
            ConcreteGrade::K200 => (350.0, 0.50, 0.69, 0.61),
            ConcreteGrade::K225 => (375.0, 0.48, 0.68, 0.58),
            ConcreteGrade::K250 => (387.5, 0.47, 0.68, 0.56),
            ConcreteGrade::K275 => (405.0, 0.46, 0.67, 0.53),
            ConcreteGrade::K300 => (412.5, 0.45, 0.67, 0.52),
            ConcreteGrade::K350 => (450.0, 0.44, 0.66, 0.48),
        };
        ConcreteMix {
            cement_kg_per_m3: cement,
            sand_m3_per_m3: sand,
            gravel_m3_per_m3: gravel,
            water_cement_ratio: wc,
        }
    }

    /// Parse from common spellings ("K-225", "k225", "K 225")
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let normalized = normalize_grade_code(s);
        ConcreteGrade::ALL
            .iter()
            .copied()
            .find(|g| g.code() == normalized)
            .ok_or_else(|| CalcError::unknown_grade(s))
    }
}

impl std::fmt::Display for ConcreteGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Normalize a grade code to the "K-225" table form.
///
/// Anything that does not look like a K-grade is returned trimmed and
/// upper-cased so the caller's lookup fails on the original spelling.
pub fn normalize_grade_code(s: &str) -> String {
    let upper = s.trim().to_uppercase().replace([' ', '_'], "");
    match upper.strip_prefix('K') {
        Some(rest) => {
            let digits = rest.trim_start_matches('-');
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                format!("K-{}", digits)
            } else {
                upper
            }
        }
        None => upper,
    }
}

/// Proportions per m³ of concrete
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConcreteMix {
    /// Cement mass (kg)
    pub cement_kg_per_m3: f64,
    /// Loose sand volume (m³)
    pub sand_m3_per_m3: f64,
    /// Loose gravel volume (m³)
    pub gravel_m3_per_m3: f64,
    /// Water/cement ratio by mass
    pub water_cement_ratio: f64,
}

impl ConcreteMix {
    /// Water in liters per m³ (1 kg of water = 1 L)
    pub fn water_l_per_m3(&self) -> f64 {
        self.cement_kg_per_m3 * self.water_cement_ratio
    }
}

/// Mortar ratios (cement:sand by volume) accepted for masonry and plaster
pub const MORTAR_RATIOS: [&str; 7] = ["1:2", "1:3", "1:4", "1:5", "1:6", "1:7", "1:8"];

/// Ratio used for brick walls that do not name one
pub const DEFAULT_MORTAR_RATIO: &str = "1:4";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k225_reference_values() {
        let mix = ConcreteGrade::K225.mix();
        assert_eq!(mix.cement_kg_per_m3, 375.0);
        assert_eq!(mix.sand_m3_per_m3, 0.48);
        assert_eq!(mix.gravel_m3_per_m3, 0.68);
        // 7.5 sacks of 50 kg
        assert!((mix.cement_kg_per_m3 / 50.0 - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_grades_monotonic() {
        for pair in ConcreteGrade::ALL.windows(2) {
            let (lo, hi) = (pair[0].mix(), pair[1].mix());
            assert!(hi.cement_kg_per_m3 > lo.cement_kg_per_m3, "{} -> {}", pair[0], pair[1]);
            assert!(hi.water_cement_ratio < lo.water_cement_ratio, "{} -> {}", pair[0], pair[1]);
            assert!(pair[1].strength_kg_cm2() > pair[0].strength_kg_cm2());
        }
    }

    #[test]
    fn test_flexible_parsing() {
        assert_eq!(ConcreteGrade::from_str_flexible("K-225").unwrap(), ConcreteGrade::K225);
        assert_eq!(ConcreteGrade::from_str_flexible("k225").unwrap(), ConcreteGrade::K225);
        assert_eq!(ConcreteGrade::from_str_flexible(" K 300 ").unwrap(), ConcreteGrade::K300);
        assert!(matches!(
            ConcreteGrade::from_str_flexible("K-999"),
            Err(CalcError::UnknownGrade { .. })
        ));
        assert!(ConcreteGrade::from_str_flexible("fc25").is_err());
    }

    #[test]
    fn test_normalize_leaves_other_codes() {
        assert_eq!(normalize_grade_code("1:4"), "1:4");
        assert_eq!(normalize_grade_code("kx"), "KX");
    }

    #[test]
    fn test_grade_serialization() {
        let json = serde_json::to_string(&ConcreteGrade::K175).unwrap();
        assert_eq!(json, "\"K-175\"");
        let parsed: ConcreteGrade = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ConcreteGrade::K175);
    }

    #[test]
    fn test_water_per_m3() {
        let mix = ConcreteGrade::K225.mix();
        assert!((mix.water_l_per_m3() - 217.5).abs() < 1e-9);
    }
}
