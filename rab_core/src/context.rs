//! # Estimation Context
//!
//! Everything a work-item calculator needs besides its own input: the table
//! snapshot, the office settings and the material catalog. Components are
//! built from it on demand; all of them share the same `Arc`ed tables.

use std::fmt;
use std::sync::Arc;

use crate::conversion::{to_base, UnitConverter};
use crate::errors::{CalcError, CalcResult};
use crate::labor::LaborScheduler;
use crate::materials::{InMemoryCatalog, MaterialCatalog};
use crate::mix::MixRatioResolver;
use crate::reinforcement::ReinforcementPlanner;
use crate::settings::EstimationSettings;
use crate::tables::{default_tables, preset, LookupTables};
use crate::units::Quantity;

#[derive(Clone)]
pub struct EstimationContext {
    pub tables: Arc<LookupTables>,
    pub settings: EstimationSettings,
    pub catalog: Arc<dyn MaterialCatalog + Send + Sync>,
}

impl fmt::Debug for EstimationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstimationContext")
            .field("tables", &self.tables)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for EstimationContext {
    fn default() -> Self {
        EstimationContext::new(default_tables(), EstimationSettings::default())
    }
}

impl EstimationContext {
    /// Context with an empty catalog; prices must come from the inputs
    pub fn new(tables: Arc<LookupTables>, settings: EstimationSettings) -> Self {
        EstimationContext {
            tables,
            settings,
            catalog: Arc::new(InMemoryCatalog::new()),
        }
    }

    pub fn with_catalog(mut self, catalog: impl MaterialCatalog + Send + Sync + 'static) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn converter(&self) -> UnitConverter {
        UnitConverter::new(Arc::clone(&self.tables))
    }

    pub fn mix_resolver(&self) -> MixRatioResolver {
        MixRatioResolver::new(Arc::clone(&self.tables))
    }

    pub fn reinforcement_planner(&self) -> ReinforcementPlanner {
        ReinforcementPlanner::new(Arc::clone(&self.tables))
    }

    pub fn labor_scheduler(&self) -> LaborScheduler {
        LaborScheduler::new(self.settings.labor_rates)
    }

    /// Unit cement is bought in ("sack")
    pub fn cement_unit(&self) -> CalcResult<String> {
        Ok(self.converter().preset(&self.settings.cement_preset)?.market_unit.clone())
    }

    /// Cement kg expressed in purchase units (sacks)
    pub fn cement_kg_to_sacks(&self, kg: f64) -> CalcResult<f64> {
        let sacks = self
            .converter()
            .to_market(&Quantity::new(kg, "kg"), &self.settings.cement_preset)?;
        Ok(sacks.value)
    }

    /// Loose cement volume (m³) expressed in kg
    pub fn cement_m3_to_kg(&self, m3: f64) -> CalcResult<f64> {
        let rule = self.converter().preset(preset::CEMENT_BULK)?.clone();
        if rule.base_unit != "kg" {
            return Err(CalcError::invalid_conversion_rule(
                &rule.id,
                "bulk cement must convert to kg",
            ));
        }
        Ok(to_base(&Quantity::new(m3, rule.market_unit.clone()), &rule)?.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::CatalogEntry;

    #[test]
    fn test_cement_conversions() {
        let ctx = EstimationContext::default();
        assert_eq!(ctx.cement_unit().unwrap(), "sack");
        assert_eq!(ctx.cement_kg_to_sacks(375.0).unwrap(), 7.5);
        assert_eq!(ctx.cement_m3_to_kg(0.5).unwrap(), 720.0);
    }

    #[test]
    fn test_components_share_tables() {
        let ctx = EstimationContext::new(
            Arc::new(LookupTables::builtin()),
            EstimationSettings::default(),
        );
        let before = Arc::strong_count(&ctx.tables);
        let _resolver = ctx.mix_resolver();
        assert_eq!(Arc::strong_count(&ctx.tables), before + 1);
    }

    #[test]
    fn test_with_catalog() {
        let catalog = InMemoryCatalog::new().with_entry(CatalogEntry {
            name: "Sand".to_string(),
            unit: "m3".to_string(),
            price: 250_000.0,
            supplier: None,
        });
        let ctx = EstimationContext::default().with_catalog(catalog);
        assert!(ctx.catalog.lookup("sand").is_some());
    }

    #[test]
    fn test_unknown_cement_preset() {
        let settings = EstimationSettings {
            cement_preset: "cement-13kg".to_string(),
            ..Default::default()
        };
        let ctx = EstimationContext::new(default_tables(), settings);
        assert!(ctx.cement_kg_to_sacks(100.0).is_err());
    }
}
