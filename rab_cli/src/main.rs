//! # Rancang CLI
//!
//! JSON in, estimate out. Reads a work item (or a whole project) and prints
//! the computed figures as JSON on stdout.
//!
//! ```text
//! rab estimate wall.json
//! rab estimate wall.json --preview
//! rab --settings office.toml estimate project.json
//! rab convert 375 cement-50kg --to-market
//! rab grades
//! ```

mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use rab_core::calculations::CalculationItem;
use rab_core::file_io::read_document;
use rab_core::materials::{CatalogEntry, InMemoryCatalog};
use rab_core::units::Quantity;
use rab_core::{
    default_tables, load_settings, load_tables, CalcError, EstimateProject, EstimationContext,
    EstimationSettings,
};

#[derive(Parser)]
#[command(name = "rab")]
#[command(about = "Construction cost estimates (HPP/RAB) from JSON work items")]
struct Cli {
    /// Office settings (.toml or .json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Lookup tables replacing the built-in ones (.toml or .json)
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    /// Material price list (.toml or .json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a work item or a project file
    Estimate {
        file: PathBuf,

        /// Lenient preview: blank fields give zero figures instead of errors
        #[arg(long)]
        preview: bool,
    },

    /// Convert a quantity with a conversion preset
    Convert {
        value: f64,

        /// Preset id (e.g., "cement-50kg")
        preset: String,

        /// Convert from the base unit to the market unit
        #[arg(long)]
        to_market: bool,
    },

    /// List conversion presets
    Presets,

    /// List concrete grades and their mixes
    Grades,

    /// List rebar sizes and unit weights
    Rebar,
}

/// Price list file
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    materials: Vec<CatalogEntry>,
}

/// A project file carries `meta`; anything else is a single work item
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Project(EstimateProject),
    Item(CalculationItem),
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let ctx = build_context(&cli)?;

    match cli.command {
        Commands::Estimate { file, preview } => estimate(&ctx, &file, preview)?,

        Commands::Convert {
            value,
            preset,
            to_market,
        } => {
            let converter = ctx.converter();
            let rule = converter.preset(&preset)?;
            let result = if to_market {
                converter.to_market(&Quantity::new(value, rule.base_unit.clone()), &preset)?
            } else {
                converter.to_base(&Quantity::new(value, rule.market_unit.clone()), &preset)?
            };
            print_json(&result)?;
        }

        Commands::Presets => print_json(&ctx.tables.conversion_presets)?,

        Commands::Grades => {
            tracing::debug!(default = %ctx.tables.default_grade, "listing grades");
            print_json(&ctx.tables.concrete_grades)?;
        }

        Commands::Rebar => print_json(&ctx.tables.rebar_weights)?,
    }

    Ok(())
}

fn build_context(cli: &Cli) -> Result<EstimationContext> {
    let tables = match &cli.tables {
        Some(path) => Arc::new(load_tables(path)?),
        None => default_tables(),
    };
    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => EstimationSettings::default(),
    };
    settings
        .validate(&tables)
        .context("settings do not match the lookup tables")?;

    let ctx = EstimationContext::new(tables, settings);
    Ok(match &cli.catalog {
        Some(path) => {
            let file: CatalogFile = read_document(path)?;
            tracing::info!(
                path = %path.display(),
                materials = file.materials.len(),
                "catalog loaded"
            );
            ctx.with_catalog(file.materials.into_iter().collect::<InMemoryCatalog>())
        }
        None => ctx,
    })
}

fn estimate(ctx: &EstimationContext, path: &Path, preview: bool) -> Result<()> {
    let document: Document = read_document(path)
        .with_context(|| format!("reading work item from {}", path.display()))?;

    let result = match (document, preview) {
        (Document::Item(item), true) => return print_json(&item.preview(ctx)),
        (Document::Project(project), true) => return print_json(&project.preview_all(ctx)),
        (Document::Item(item), false) => item.commit(ctx).map(serde_json::to_value),
        (Document::Project(project), false) => {
            project.estimate_all(ctx).map(serde_json::to_value)
        }
    };

    match result {
        Ok(value) => print_json(&value?),
        Err(err @ CalcError::Validation { .. }) => {
            // issues go to stdout so callers can map them back to fields
            print_json(&err)?;
            bail!("{} in {}", err, path.display())
        }
        Err(err) => Err(err).with_context(|| format!("estimating {}", path.display())),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = ["rab", "estimate", "wall.json", "--preview", "--settings", "office.toml"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("office.toml")));
        match cli.command {
            Commands::Estimate { file, preview } => {
                assert_eq!(file, PathBuf::from("wall.json"));
                assert!(preview);
            }
            _ => panic!("expected estimate"),
        }
    }

    #[test]
    fn test_document_detection() {
        let item: Document =
            serde_json::from_str(r#"{ "type": "Concrete", "label": "Slab" }"#).unwrap();
        assert!(matches!(item, Document::Item(CalculationItem::Concrete(_))));

        let project = EstimateProject::new("Budi", "RAB-01", "CV Maju");
        let json = serde_json::to_string(&project).unwrap();
        let project: Document = serde_json::from_str(&json).unwrap();
        assert!(matches!(project, Document::Project(_)));
    }

    #[test]
    fn test_catalog_file() {
        let file: CatalogFile = serde_json::from_str(
            r#"{ "materials": [ { "name": "Cement", "unit": "sack", "price": 65000.0 } ] }"#,
        )
        .unwrap();
        let catalog: InMemoryCatalog = file.materials.into_iter().collect();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_project_preview_applies_project_settings() {
        use rab_core::calculations::ConcreteWorkInput;
        use rab_core::geometry::ShapeSpec;
        use rab_core::units::Percent;

        let mut project = EstimateProject::new("Budi", "RAB-01", "CV Maju");
        project.settings.default_profit_percent = Percent(25.0);
        project.add_item(CalculationItem::Concrete(ConcreteWorkInput {
            label: "Slab".to_string(),
            shape: ShapeSpec::RectangularPrism {
                length_m: 4.0,
                width_m: 3.0,
                height_m: 0.12,
            },
            ..Default::default()
        }));
        let json = serde_json::to_string(&project).unwrap();
        let Document::Project(project) = serde_json::from_str::<Document>(&json).unwrap() else {
            panic!("expected project");
        };

        let catalog: InMemoryCatalog = [("Cement", "sack", 70_000.0), ("Sand", "m3", 250_000.0)]
            .into_iter()
            .map(|(name, unit, price)| CatalogEntry {
                name: name.to_string(),
                unit: unit.to_string(),
                price,
                supplier: None,
            })
            .collect();
        let ctx = EstimationContext::default().with_catalog(catalog);
        let preview = project.preview_all(&ctx);
        let total = &preview.total;
        assert!(total.hpp > 0.0);
        assert!((total.rab - total.hpp * 1.25).abs() < 1e-6);
        assert_eq!(total.missing_prices, vec!["Gravel"]);
    }
}
