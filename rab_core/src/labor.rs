//! # Labor Scheduling
//!
//! Turns a crew (tukang = skilled, pekerja = helper) and a base productivity
//! into complete teams, throughput, duration and labor cost.
//!
//! ## Team rule
//!
//! The ratio `T:P` is the minimum composition of one team.
//!
//! ```text
//! T == 0, P > 0   teams = floor(pekerja / P)
//! P == 0, T > 0   teams = floor(tukang / T)
//! otherwise       teams = min(floor(tukang / T), floor(pekerja / P))
//!
//! adjusted_productivity = teams > 0 ? base × teams : base
//! duration_days         = adjusted > 0 ? quantity / adjusted : 0
//! daily_labor_cost      = tukang × tukang_rate + pekerja × pekerja_rate
//! labor_cost            = daily_labor_cost × duration_days
//! ```
//!
//! With zero complete teams the crew still works at the single-crew base
//! rate instead of zero throughput.
//!
//! ## Rounding
//!
//! [`LaborScheduler::schedule`] rounds the duration up to whole days (a job
//! summary). [`LaborScheduler::schedule_fractional`] keeps fractional days so
//! stages can be summed first and rounded once at the end.
//!
//! ## Example
//!
//! ```rust
//! use rab_core::labor::{LaborRates, LaborScheduler, WorkerAllocation};
//!
//! let crew = WorkerAllocation::new(2, 2, "1:1".parse().unwrap());
//! let s = LaborScheduler::new(LaborRates::default()).schedule(&crew, 8.0, 40.0).unwrap();
//! assert_eq!(s.teams, 2);
//! assert_eq!(s.adjusted_productivity, 16.0);
//! assert_eq!(s.duration_days, 3.0);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Minimum team composition, `tukang:pekerja`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRatio {
    pub tukang_units: u32,
    pub pekerja_units: u32,
}

impl WorkerRatio {
    pub const ONE_TO_ONE: WorkerRatio = WorkerRatio {
        tukang_units: 1,
        pekerja_units: 1,
    };

    pub fn new(tukang_units: u32, pekerja_units: u32) -> Self {
        WorkerRatio {
            tukang_units,
            pekerja_units,
        }
    }

    /// Both units zero
    pub fn is_degenerate(&self) -> bool {
        self.tukang_units == 0 && self.pekerja_units == 0
    }
}

impl Default for WorkerRatio {
    fn default() -> Self {
        WorkerRatio::ONE_TO_ONE
    }
}

impl FromStr for WorkerRatio {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed =
            || CalcError::invalid_allocation(format!("ratio '{}' is not of the form T:P", s));
        let (t, p) = s.trim().split_once(':').ok_or_else(malformed)?;
        let tukang_units = t.trim().parse().map_err(|_| malformed())?;
        let pekerja_units = p.trim().parse().map_err(|_| malformed())?;
        Ok(WorkerRatio::new(tukang_units, pekerja_units))
    }
}

impl fmt::Display for WorkerRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tukang_units, self.pekerja_units)
    }
}

/// Crew on site
///
/// ## JSON Example
///
/// ```json
/// { "tukang_count": 2, "pekerja_count": 4, "ratio": { "tukang_units": 1, "pekerja_units": 2 } }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerAllocation {
    pub tukang_count: u32,
    pub pekerja_count: u32,
    pub ratio: WorkerRatio,
}

impl WorkerAllocation {
    pub fn new(tukang_count: u32, pekerja_count: u32, ratio: WorkerRatio) -> Self {
        WorkerAllocation {
            tukang_count,
            pekerja_count,
            ratio,
        }
    }

    /// At least one worker and a non-degenerate ratio
    ///
    /// # Errors
    ///
    /// * `InvalidAllocation` - no workers, or ratio `0:0`
    pub fn validate(&self) -> CalcResult<()> {
        if self.tukang_count == 0 && self.pekerja_count == 0 {
            return Err(CalcError::invalid_allocation("tukang and pekerja counts are both zero"));
        }
        if self.ratio.is_degenerate() {
            return Err(CalcError::invalid_allocation("ratio 0:0 has no team composition"));
        }
        Ok(())
    }
}

/// Complete teams the crew forms under its ratio.
pub fn team_count(allocation: &WorkerAllocation) -> CalcResult<u32> {
    allocation.validate()?;
    let WorkerAllocation {
        tukang_count,
        pekerja_count,
        ratio,
    } = *allocation;

    let teams = match (ratio.tukang_units, ratio.pekerja_units) {
        (0, p) => pekerja_count / p,
        (t, 0) => tukang_count / t,
        (t, p) => (tukang_count / t).min(pekerja_count / p),
    };
    Ok(teams)
}

/// Daily wages, supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaborRates {
    pub tukang_daily: f64,
    pub pekerja_daily: f64,
}

impl Default for LaborRates {
    fn default() -> Self {
        LaborRates {
            tukang_daily: 150_000.0,
            pekerja_daily: 120_000.0,
        }
    }
}

/// How the duration is rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationRounding {
    /// Whole days, rounded up
    Ceil,
    /// Fractional days, for later summing
    Fractional,
}

/// Labor outcome for one stage of work
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LaborSchedule {
    pub teams: u32,
    pub adjusted_productivity: f64,
    pub duration_days: f64,
    pub daily_labor_cost: f64,
    pub labor_cost: f64,
}

/// Computes labor schedules with fixed day rates.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaborScheduler {
    rates: LaborRates,
}

impl LaborScheduler {
    pub fn new(rates: LaborRates) -> Self {
        LaborScheduler { rates }
    }

    pub fn rates(&self) -> LaborRates {
        self.rates
    }

    /// Schedule with the duration rounded up to whole days.
    ///
    /// # Errors
    ///
    /// * `InvalidAllocation` - no workers, or ratio `0:0`
    pub fn schedule(
        &self,
        allocation: &WorkerAllocation,
        base_productivity: f64,
        total_quantity: f64,
    ) -> CalcResult<LaborSchedule> {
        self.schedule_with(allocation, base_productivity, total_quantity, DurationRounding::Ceil)
    }

    /// Schedule keeping fractional days.
    pub fn schedule_fractional(
        &self,
        allocation: &WorkerAllocation,
        base_productivity: f64,
        total_quantity: f64,
    ) -> CalcResult<LaborSchedule> {
        self.schedule_with(
            allocation,
            base_productivity,
            total_quantity,
            DurationRounding::Fractional,
        )
    }

    pub fn schedule_with(
        &self,
        allocation: &WorkerAllocation,
        base_productivity: f64,
        total_quantity: f64,
        rounding: DurationRounding,
    ) -> CalcResult<LaborSchedule> {
        let teams = team_count(allocation)?;

        let adjusted_productivity = if teams > 0 {
            base_productivity * teams as f64
        } else {
            base_productivity
        };

        let raw_days = if adjusted_productivity > 0.0 && total_quantity > 0.0 {
            total_quantity / adjusted_productivity
        } else {
            0.0
        };
        let duration_days = match rounding {
            DurationRounding::Ceil => raw_days.ceil(),
            DurationRounding::Fractional => raw_days,
        };

        let daily_labor_cost = allocation.tukang_count as f64 * self.rates.tukang_daily
            + allocation.pekerja_count as f64 * self.rates.pekerja_daily;

        tracing::debug!(teams, adjusted_productivity, duration_days, ?rounding, "labor scheduled");

        Ok(LaborSchedule {
            teams,
            adjusted_productivity,
            duration_days,
            daily_labor_cost,
            labor_cost: daily_labor_cost * duration_days,
        })
    }
}
