//! Deformed Reinforcing Bar Sizes
//!
//! Nominal unit weights for deformed bars (D-series). Weights follow
//! `0.00617 × d²` kg/m rounded the way suppliers list them; the table is
//! authoritative, the formula is only used in tests as a sanity check.
//!
//! Bars are sold in 12 m lengths.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Stock length of one market bar (m)
pub const STOCK_BAR_LENGTH_M: f64 = 12.0;

/// Deformed bar designation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum RebarSize {
    D6,
    D8,
    D10,
    D12,
    #[default]
    D13,
    D16,
    D19,
    D22,
    D25,
}

impl RebarSize {
    /// All sizes, smallest first
    pub const ALL: [RebarSize; 9] = [
        RebarSize::D6,
        RebarSize::D8,
        RebarSize::D10,
        RebarSize::D12,
        RebarSize::D13,
        RebarSize::D16,
        RebarSize::D19,
        RebarSize::D22,
        RebarSize::D25,
    ];

    /// Nominal diameter in millimeters
    pub fn diameter_mm(&self) -> u32 {
        match self {
            RebarSize::D6 => 6,
            RebarSize::D8 => 8,
            RebarSize::D10 => 10,
            RebarSize::D12 => 12,
            RebarSize::D13 => 13,
            RebarSize::D16 => 16,
            RebarSize::D19 => 19,
            RebarSize::D22 => 22,
            RebarSize::D25 => 25,
        }
    }

    /// Nominal weight per meter (kg/m)
    pub fn weight_kg_per_m(&self) -> f64 {
        match self {
            RebarSize::D6 => 0.222,
            RebarSize::D8 => 0.395,
            RebarSize::D10 => 0.617,
            RebarSize::D12 => 0.888,
            RebarSize::D13 => 1.042,
            RebarSize::D16 => 1.578,
            RebarSize::D19 => 2.226,
            RebarSize::D22 => 2.984,
            RebarSize::D25 => 3.853,
        }
    }

    /// Designation code (e.g., "D13")
    pub fn code(&self) -> String {
        format!("D{}", self.diameter_mm())
    }

    /// Parse "D13", "d13", "13"
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let upper = s.trim().to_uppercase();
        let digits = upper.strip_prefix('D').unwrap_or(&upper);
        let diameter: u32 = digits.parse().map_err(|_| CalcError::material_not_found(s))?;
        RebarSize::ALL
            .iter()
            .copied()
            .find(|r| r.diameter_mm() == diameter)
            .ok_or_else(|| CalcError::material_not_found(s))
    }
}

impl std::fmt::Display for RebarSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "D{}", self.diameter_mm())
    }
}
