//! # Lookup Tables
//!
//! The read-only reference data every component works from: concrete
//! grades, mortar ratios, conversion presets, rebar unit weights.
//!
//! Components never read a global. They receive an `Arc<LookupTables>` when
//! constructed, so tests can hand in custom tables and concurrent requests
//! share one immutable snapshot.
//!
//! ## Reloading
//!
//! [`TableStore`] holds the current snapshot. [`TableStore::replace`]
//! validates a complete new table set and swaps the whole `Arc`; readers that
//! already took a snapshot keep using the old one, so nobody ever observes a
//! half-updated table.
//!
//! ## Example
//!
//! ```rust
//! use rab_core::tables::{default_tables, TableStore};
//!
//! let store = TableStore::new((*default_tables()).clone());
//! let snapshot = store.snapshot();
//! assert!(snapshot.concrete_grades.contains_key("K-225"));
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::conversion::ConversionRule;
use crate::errors::{CalcError, CalcResult};
use crate::materials::{ConcreteGrade, ConcreteMix, RebarSize, MORTAR_RATIOS, STOCK_BAR_LENGTH_M};

/// Preset ids the calculators refer to
pub mod preset {
    pub const CEMENT_40KG: &str = "cement-40kg";
    pub const CEMENT_50KG: &str = "cement-50kg";
    pub const CEMENT_BULK: &str = "cement-bulk";
    pub const SAND_TRUCK: &str = "sand-truck";
    pub const GRAVEL_TRUCK: &str = "gravel-truck";
    pub const REBAR_BAR: &str = "rebar-12m";
    pub const BRICK_TRUCK: &str = "brick-truck";
    pub const TILE_40X40_BOX: &str = "tile-40x40-box";
}

/// Static reference data shared by all components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTables {
    /// Concrete proportions keyed by grade code ("K-225")
    pub concrete_grades: BTreeMap<String, ConcreteMix>,

    /// Grade used when a work item does not name one
    pub default_grade: String,

    /// Accepted mortar ratios ("1:4")
    pub mortar_ratios: Vec<String>,

    /// Conversion presets keyed by rule id
    pub conversion_presets: BTreeMap<String, ConversionRule>,

    /// Rebar unit weight (kg/m) keyed by bar code ("D13")
    pub rebar_weights: BTreeMap<String, f64>,
}

impl LookupTables {
    /// Tables built from the compiled-in material data
    pub fn builtin() -> Self {
        let concrete_grades = ConcreteGrade::ALL
            .iter()
            .map(|g| (g.code().to_string(), g.mix()))
            .collect();

        let rebar_weights = RebarSize::ALL
            .iter()
            .map(|r| (r.code(), r.weight_kg_per_m()))
            .collect();

        let presets = [
            ConversionRule::new(preset::CEMENT_40KG, "sack", "kg", 40.0),
            ConversionRule::new(preset::CEMENT_50KG, "sack", "kg", 50.0),
            // loose bulk density of portland cement
            ConversionRule::new(preset::CEMENT_BULK, "m3", "kg", 1440.0),
            ConversionRule::new(preset::SAND_TRUCK, "truck", "m3", 7.0),
            ConversionRule::new(preset::GRAVEL_TRUCK, "truck", "m3", 7.0),
            ConversionRule::new(preset::REBAR_BAR, "bar", "m", STOCK_BAR_LENGTH_M),
            ConversionRule::new(preset::BRICK_TRUCK, "truck", "pcs", 6000.0),
            // 6 tiles of 400 x 400 mm
            ConversionRule::new(preset::TILE_40X40_BOX, "box", "m2", 0.96),
        ];

        LookupTables {
            concrete_grades,
            default_grade: ConcreteGrade::DEFAULT.code().to_string(),
            mortar_ratios: MORTAR_RATIOS.iter().map(|s| s.to_string()).collect(),
            conversion_presets: presets.into_iter().map(|r| (r.id.clone(), r)).collect(),
            rebar_weights,
        }
    }

    /// Check internal consistency before the tables are put into service.
    pub fn validate(&self) -> CalcResult<()> {
        if !self.concrete_grades.contains_key(&self.default_grade) {
            return Err(CalcError::unknown_grade(&self.default_grade));
        }
        for (code, mix) in &self.concrete_grades {
            let proportions_ok = mix.cement_kg_per_m3 > 0.0
                && mix.sand_m3_per_m3 >= 0.0
                && mix.gravel_m3_per_m3 >= 0.0;
            if !proportions_ok {
                return Err(CalcError::config_error(
                    "validate tables",
                    code,
                    "mix proportions must be non-negative with positive cement",
                ));
            }
        }
        for ratio in &self.mortar_ratios {
            if crate::mix::parse_mortar_ratio(ratio).is_none() {
                return Err(CalcError::unknown_grade(ratio));
            }
        }
        for (id, rule) in &self.conversion_presets {
            if id != &rule.id {
                return Err(CalcError::invalid_conversion_rule(
                    id,
                    format!("keyed under a different id '{}'", rule.id),
                ));
            }
            rule.validate()?;
        }
        for (code, weight) in &self.rebar_weights {
            if !(*weight > 0.0) {
                return Err(CalcError::config_error(
                    "validate tables",
                    code,
                    "rebar weight must be positive",
                ));
            }
        }
        Ok(())
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        LookupTables::builtin()
    }
}

static BUILTIN_TABLES: Lazy<Arc<LookupTables>> = Lazy::new(|| Arc::new(LookupTables::builtin()));

/// Shared snapshot of the compiled-in tables (built once per process)
pub fn default_tables() -> Arc<LookupTables> {
    Arc::clone(&BUILTIN_TABLES)
}

/// Holder for the current tables with whole-snapshot replacement.
#[derive(Debug)]
pub struct TableStore {
    current: RwLock<Arc<LookupTables>>,
}

impl TableStore {
    pub fn new(tables: LookupTables) -> Self {
        TableStore {
            current: RwLock::new(Arc::new(tables)),
        }
    }

    /// The tables in force right now
    pub fn snapshot(&self) -> Arc<LookupTables> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Validate and swap in a complete new table set.
    ///
    /// On error the current tables stay in place.
    pub fn replace(&self, tables: LookupTables) -> CalcResult<()> {
        tables.validate()?;
        let next = Arc::new(tables);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
        tracing::info!("lookup tables replaced");
        Ok(())
    }
}

impl Default for TableStore {
    fn default() -> Self {
        TableStore {
            current: RwLock::new(default_tables()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_valid() {
        let tables = LookupTables::builtin();
        tables.validate().unwrap();
        assert_eq!(tables.default_grade, "K-225");
        assert_eq!(tables.rebar_weights["D8"], 0.395);
        assert_eq!(tables.conversion_presets[preset::SAND_TRUCK].factor, 7.0);
    }

    #[test]
    fn test_default_tables_shared() {
        let a = default_tables();
        let b = default_tables();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_replace_swaps_whole_snapshot() {
        let store = TableStore::default();
        let before = store.snapshot();

        let mut custom = LookupTables::builtin();
        custom.rebar_weights.insert("D32".to_string(), 6.31);
        store.replace(custom).unwrap();

        let after = store.snapshot();
        assert!(after.rebar_weights.contains_key("D32"));
        // old snapshot untouched
        assert!(!before.rebar_weights.contains_key("D32"));
    }

    #[test]
    fn test_replace_rejects_bad_tables() {
        let store = TableStore::default();

        let mut bad = LookupTables::builtin();
        bad.conversion_presets
            .insert("broken".to_string(), ConversionRule::new("broken", "sack", "kg", 0.0));
        assert!(store.replace(bad).is_err());

        let mut no_default = LookupTables::builtin();
        no_default.default_grade = "K-999".to_string();
        assert!(matches!(store.replace(no_default), Err(CalcError::UnknownGrade { .. })));

        // still the builtin set
        assert!(!store.snapshot().conversion_presets.contains_key("broken"));
    }

    #[test]
    fn test_concurrent_readers_see_complete_tables() {
        let store = Arc::new(TableStore::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        if i == 0 {
                            let mut t = LookupTables::builtin();
                            t.default_grade = "K-300".to_string();
                            store.replace(t).unwrap();
                        }
                        let snap = store.snapshot();
                        assert!(snap.concrete_grades.contains_key(&snap.default_grade));
                        assert_eq!(snap.concrete_grades.len(), 10);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn test_tables_json_roundtrip() {
        let tables = LookupTables::builtin();
        let json = serde_json::to_string(&tables).unwrap();
        let parsed: LookupTables = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tables);
    }
}
