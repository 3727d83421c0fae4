//! # Estimation Settings
//!
//! Office-wide defaults applied when a work item leaves a field out: day
//! rates, profit and waste percentages, the cement sack size, and how stages
//! of a multi-stage item combine.
//!
//! A value the item states explicitly always wins over these defaults, and
//! an explicit invalid value is an error rather than a reason to fall back.
//!
//! ## TOML Example
//!
//! ```toml
//! default_profit_percent = 12.5
//! default_waste_percent = 5.0
//! cement_preset = "cement-40kg"
//! default_sub_work_mode = "parallel"
//!
//! [labor_rates]
//! tukang_daily = 175000.0
//! pekerja_daily = 130000.0
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::estimate::{validate_profit_fraction, SubWorkMode};
use crate::labor::LaborRates;
use crate::materials::validate_waste_fraction;
use crate::tables::{preset, LookupTables};
use crate::units::Percent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationSettings {
    pub default_profit_percent: Percent,
    pub default_waste_percent: Percent,
    /// Conversion preset that turns tabled cement kg into purchase sacks
    pub cement_preset: String,
    pub default_sub_work_mode: SubWorkMode,
    pub labor_rates: LaborRates,
}

impl Default for EstimationSettings {
    fn default() -> Self {
        EstimationSettings {
            default_profit_percent: Percent(10.0),
            default_waste_percent: Percent(5.0),
            cement_preset: preset::CEMENT_50KG.to_string(),
            default_sub_work_mode: SubWorkMode::Sequential,
            labor_rates: LaborRates::default(),
        }
    }
}

impl EstimationSettings {
    /// Profit fraction: the item's own value when given, else the default
    pub fn profit_fraction(&self, explicit: Option<Percent>) -> f64 {
        explicit.unwrap_or(self.default_profit_percent).fraction()
    }

    /// Waste fraction: the item's own value when given, else the default
    pub fn waste_fraction(&self, explicit: Option<Percent>) -> f64 {
        explicit.unwrap_or(self.default_waste_percent).fraction()
    }

    /// Check the settings against the tables they will be used with.
    pub fn validate(&self, tables: &LookupTables) -> CalcResult<()> {
        validate_profit_fraction(self.default_profit_percent.fraction())?;
        validate_waste_fraction(self.default_waste_percent.fraction())?;
        for (field, rate) in [
            ("labor_rates.tukang_daily", self.labor_rates.tukang_daily),
            ("labor_rates.pekerja_daily", self.labor_rates.pekerja_daily),
        ] {
            if !(rate >= 0.0) {
                return Err(CalcError::config_error(
                    "validate settings",
                    field,
                    "day rate cannot be negative",
                ));
            }
        }
        match tables.conversion_presets.get(&self.cement_preset) {
            Some(rule) if rule.base_unit == "kg" => rule.validate(),
            Some(rule) => Err(CalcError::invalid_conversion_rule(
                &rule.id,
                format!("cement preset must convert to kg, not '{}'", rule.base_unit),
            )),
            None => Err(CalcError::invalid_conversion_rule(
                &self.cement_preset,
                "no registered conversion preset",
            )),
        }
    }
}
