//! # Estimate Project
//!
//! The `EstimateProject` struct is the root container for a bill of work
//! items (RAB). It serializes to human-readable JSON; storing it is up to the
//! caller.
//!
//! ## Structure
//!
//! ```text
//! EstimateProject
//! ├── meta: ProjectMetadata (version, estimator, job info, timestamps)
//! ├── settings: EstimationSettings (profit, waste, rates, cement sack)
//! └── items: HashMap<Uuid, CalculationItem> (all work items)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rab_core::project::EstimateProject;
//!
//! let project = EstimateProject::new("Budi", "RAB-2024-07", "CV Maju Jaya");
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("RAB-2024-07"));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{CalculationItem, CalculationOutput};
use crate::context::EstimationContext;
use crate::errors::{CalcResult, ValidationReport};
use crate::estimate::{aggregate_sub_works, EstimationResult, SubWorkMode, SubWorkResult};
use crate::settings::EstimationSettings;

/// Current schema version of a serialized project
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root bill container.
///
/// Items are stored in a flat UUID-keyed map; totals list them by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateProject {
    pub meta: ProjectMetadata,

    /// Applied to every item in place of the caller's settings
    #[serde(default)]
    pub settings: EstimationSettings,

    #[serde(default)]
    pub items: HashMap<Uuid, CalculationItem>,
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Person responsible for the estimate
    pub estimator: String,

    pub job_id: String,

    pub client: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Figures of one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEstimate {
    pub id: Uuid,
    pub label: String,
    pub calc_type: String,
    pub output: CalculationOutput,
}

/// Every item's figures plus the bill total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEstimate {
    pub items: Vec<ItemEstimate>,
    /// Items summed as sequential work. Items are measured in different
    /// units, so the total carries no base quantity.
    pub total: EstimationResult,
}

impl ProjectEstimate {
    fn new(items: Vec<ItemEstimate>) -> Self {
        let sub_works = items
            .iter()
            .map(|i| SubWorkResult::new(item_key(&i.id, &i.label), i.output.estimate().clone()))
            .collect();
        let total = aggregate_sub_works(sub_works, SubWorkMode::Sequential).with_base_quantity(0.0);
        ProjectEstimate { items, total }
    }
}

impl ItemEstimate {
    fn new(id: &Uuid, item: &CalculationItem, output: CalculationOutput) -> Self {
        ItemEstimate {
            id: *id,
            label: item.label().to_string(),
            calc_type: item.calc_type().to_string(),
            output,
        }
    }
}

impl EstimateProject {
    pub fn new(
        estimator: impl Into<String>,
        job_id: impl Into<String>,
        client: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        EstimateProject {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                estimator: estimator.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: EstimationSettings::default(),
            items: HashMap::new(),
        }
    }

    /// Add a work item; returns the UUID assigned to it.
    pub fn add_item(&mut self, item: CalculationItem) -> Uuid {
        let id = Uuid::new_v4();
        self.items.insert(id, item);
        self.touch();
        id
    }

    /// Remove a work item by UUID.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<CalculationItem> {
        let item = self.items.remove(id);
        if item.is_some() {
            self.touch();
        }
        item
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&CalculationItem> {
        self.items.get(id)
    }

    /// Mutable access marks the project as modified.
    pub fn get_item_mut(&mut self, id: &Uuid) -> Option<&mut CalculationItem> {
        if self.items.contains_key(id) {
            self.touch();
            self.items.get_mut(id)
        } else {
            None
        }
    }

    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items ordered by label, then id
    fn ordered_items(&self) -> Vec<(&Uuid, &CalculationItem)> {
        let mut entries: Vec<_> = self.items.iter().collect();
        entries.sort_by(|a, b| a.1.label().cmp(b.1.label()).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// The caller's tables and catalog with this project's settings
    fn context(&self, ctx: &EstimationContext) -> EstimationContext {
        EstimationContext {
            settings: self.settings.clone(),
            ..ctx.clone()
        }
    }

    /// Commit every item and total the bill.
    ///
    /// Every item is validated before anything is computed; the error lists
    /// the issues of all items, each field prefixed with its item's label
    /// (or UUID when the label is blank).
    pub fn estimate_all(&self, ctx: &EstimationContext) -> CalcResult<ProjectEstimate> {
        let ctx = self.context(ctx);
        let entries = self.ordered_items();

        let mut report = ValidationReport::new();
        for (id, item) in &entries {
            report.extend_prefixed(&item_key(id, item.label()), item.validate(&ctx));
        }
        report.into_result()?;

        let mut items = Vec::with_capacity(entries.len());
        for (id, item) in entries {
            items.push(ItemEstimate::new(id, item, item.commit(&ctx)?));
        }

        let estimate = ProjectEstimate::new(items);
        tracing::info!(
            job = %self.meta.job_id,
            items = estimate.items.len(),
            hpp = estimate.total.hpp,
            rab = estimate.total.rab,
            days = estimate.total.duration_days,
            "project estimated"
        );
        Ok(estimate)
    }

    /// Preview every item with this project's settings and total the bill.
    ///
    /// Never fails; incomplete items contribute zero figures and the total
    /// lists every material previewed without a price.
    pub fn preview_all(&self, ctx: &EstimationContext) -> ProjectEstimate {
        let ctx = self.context(ctx);
        let items = self
            .ordered_items()
            .into_iter()
            .map(|(id, item)| ItemEstimate::new(id, item, item.preview(&ctx)))
            .collect();

        let estimate = ProjectEstimate::new(items);
        tracing::debug!(
            job = %self.meta.job_id,
            items = estimate.items.len(),
            unpriced = estimate.total.missing_prices.len(),
            "project previewed"
        );
        estimate
    }
}

impl Default for EstimateProject {
    fn default() -> Self {
        EstimateProject::new("", "", "")
    }
}

fn item_key(id: &Uuid, label: &str) -> String {
    match label.trim() {
        "" => id.to_string(),
        label => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::concrete::ConcretePrices;
    use crate::calculations::wall::{BrickSpec, BrickWallPrices};
    use crate::calculations::{BrickWallInput, ConcreteWorkInput};
    use crate::geometry::ShapeSpec;
    use crate::labor::{WorkerAllocation, WorkerRatio};
    use crate::units::Percent;

    fn wall(label: &str) -> CalculationItem {
        CalculationItem::BrickWall(BrickWallInput {
            label: label.to_string(),
            wall_length_m: 10.0,
            wall_height_m: 3.0,
            openings_m2: 0.0,
            brick: BrickSpec::red_brick(),
            mortar_ratio: Some("1:4".to_string()),
            prices: BrickWallPrices {
                brick_per_package: Some(4_500_000.0),
                cement_per_sack: Some(70_000.0),
                sand_per_m3: Some(250_000.0),
            },
            crew: WorkerAllocation::new(2, 2, WorkerRatio::ONE_TO_ONE),
            productivity_m2_per_day: 8.0,
            waste_percent: None,
            profit_percent: None,
        })
    }

    fn columns(label: &str) -> CalculationItem {
        CalculationItem::Concrete(ConcreteWorkInput {
            label: label.to_string(),
            shape: ShapeSpec::RectangularPrism {
                length_m: 0.3,
                width_m: 0.3,
                height_m: 3.5,
            },
            count: 4,
            grade: Some("K-225".to_string()),
            prices: ConcretePrices {
                cement_per_sack: Some(70_000.0),
                sand_per_m3: Some(250_000.0),
                gravel_per_m3: Some(300_000.0),
            },
            crew: WorkerAllocation::new(1, 3, WorkerRatio::new(1, 3)),
            productivity_m3_per_day: 1.0,
            waste_percent: None,
            profit_percent: None,
        })
    }

    #[test]
    fn test_new_project() {
        let project = EstimateProject::new("Budi", "RAB-01", "CV Maju");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.meta.estimator, "Budi");
        assert_eq!(project.item_count(), 0);
        assert_eq!(project.meta.created, project.meta.modified);
    }

    #[test]
    fn test_add_remove_item() {
        let mut project = EstimateProject::default();
        let id = project.add_item(wall("Wall A"));
        assert!(project.meta.modified >= project.meta.created);
        assert_eq!(project.get_item(&id).map(|i| i.label()), Some("Wall A"));

        assert!(project.remove_item(&id).is_some());
        assert!(project.remove_item(&id).is_none());
        assert_eq!(project.item_count(), 0);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut project = EstimateProject::new("Budi", "RAB-01", "CV Maju");
        project.add_item(wall("Wall A"));
        project.add_item(columns("Column K1"));

        let json = serde_json::to_string_pretty(&project).unwrap();
        let restored: EstimateProject = serde_json::from_str(&json).unwrap();
        assert_eq!(project, restored);
    }

    #[test]
    fn test_estimate_all_totals_sequentially() {
        let mut project = EstimateProject::default();
        project.add_item(wall("Wall A"));
        project.add_item(columns("Column K1"));

        let ctx = EstimationContext::default();
        let result = project.estimate_all(&ctx).unwrap();
        let labels: Vec<_> = result.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Column K1", "Wall A"]);

        let wall_days = result.items[1].output.estimate().duration_days;
        let column_days = result.items[0].output.estimate().duration_days;
        assert_eq!(result.total.duration_days, wall_days + column_days);

        let hpp: f64 = result.items.iter().map(|i| i.output.estimate().hpp).sum();
        assert!((result.total.hpp - hpp).abs() < 1e-6);
        assert_eq!(result.total.base_quantity, 0.0);
        assert!(result.total.sub_work("Wall A").is_some());
    }

    #[test]
    fn test_project_settings_apply() {
        let mut project = EstimateProject::default();
        project.add_item(columns("Column K1"));
        project.settings.default_profit_percent = Percent(20.0);

        let result = project.estimate_all(&EstimationContext::default()).unwrap();
        let e = &result.total;
        assert!((e.rab - e.hpp * 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_estimate_all_reports_every_item() {
        let mut project = EstimateProject::default();
        let mut bad_wall = wall("Wall A");
        if let CalculationItem::BrickWall(w) = &mut bad_wall {
            w.wall_height_m = 0.0;
        }
        project.add_item(bad_wall);
        let blank = project.add_item(CalculationItem::Concrete(ConcreteWorkInput::default()));

        let err = project.estimate_all(&EstimationContext::default()).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert!(err.issues().iter().any(|i| i.field.starts_with("Wall A.")));
        let prefix = format!("{}.", blank);
        assert!(err.issues().iter().any(|i| i.field.starts_with(&prefix)));
    }

    #[test]
    fn test_empty_project() {
        let ctx = EstimationContext::default();
        let result = EstimateProject::default().estimate_all(&ctx).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total.hpp, 0.0);
        assert!(EstimateProject::default().preview_all(&ctx).items.is_empty());
    }

    #[test]
    fn test_preview_uses_project_settings() {
        let mut project = EstimateProject::default();
        project.add_item(wall("Wall A"));
        project.add_item(columns("Column K1"));
        project.settings.default_profit_percent = Percent(20.0);
        project.settings.default_waste_percent = Percent(0.0);

        let ctx = EstimationContext::default();
        let preview = project.preview_all(&ctx);
        let e = &preview.total;
        assert!(e.hpp > 0.0);
        assert!((e.rab - e.hpp * 1.2).abs() < 1e-6);

        // same figures as the strict run under the same settings
        let committed = project.estimate_all(&ctx).unwrap();
        assert!((committed.total.rab - e.rab).abs() < 1e-6);
        let labels: Vec<_> = preview.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Column K1", "Wall A"]);
    }

    #[test]
    fn test_preview_totals_unpriced_materials() {
        let mut project = EstimateProject::default();
        let mut unpriced = wall("Wall A");
        if let CalculationItem::BrickWall(w) = &mut unpriced {
            w.prices.sand_per_m3 = None;
        }
        project.add_item(unpriced);
        project.add_item(CalculationItem::Concrete(ConcreteWorkInput {
            label: "Column K2".to_string(),
            ..ConcreteWorkInput::default()
        }));

        let preview = project.preview_all(&EstimationContext::default());
        assert_eq!(preview.items.len(), 2);
        assert!(preview.total.missing_prices.iter().any(|m| m == "Sand"));
        assert_eq!(preview.total.base_quantity, 0.0);
    }
}
