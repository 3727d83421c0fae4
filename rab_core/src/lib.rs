//! # rab_core - Construction Cost Estimation Engine
//!
//! `rab_core` turns entered work quantities into material and labor costs,
//! the cost price (HPP) and the billed price with profit (RAB). All inputs
//! and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: components read injected, immutable lookup tables
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types with per-field validation issues
//! - **Two tiers**: lenient `preview` for live forms, strict `commit` for bills
//!
//! ## Quick Start
//!
//! ```rust
//! use rab_core::calculations::{CalculationItem, ConcreteWorkInput};
//! use rab_core::geometry::ShapeSpec;
//! use rab_core::EstimationContext;
//!
//! let ctx = EstimationContext::default();
//! let slab = ConcreteWorkInput {
//!     label: "Slab".to_string(),
//!     shape: ShapeSpec::RectangularPrism { length_m: 4.0, width_m: 3.0, height_m: 0.12 },
//!     ..Default::default()
//! };
//!
//! // Blank prices and crew still preview
//! let preview = CalculationItem::Concrete(slab).preview(&ctx);
//! assert_eq!(preview.estimate().hpp, 0.0);
//! ```
//!
//! ## Modules
//!
//! - [`conversion`] - Market/base unit conversion
//! - [`geometry`] - Volumes, areas and brick coverage
//! - [`reinforcement`] - Footing rebar mats
//! - [`mix`] - Concrete grades and mortar ratios
//! - [`labor`] - Crew teams, duration and labor cost
//! - [`materials`] - Priced material lines and the catalog seam
//! - [`estimate`] - HPP/RAB aggregation and sub-work combination
//! - [`calculations`] - Work-item calculators
//! - [`project`] - Bill container
//! - [`tables`] - Lookup tables and hot reload
//! - [`settings`] - Office defaults
//! - [`file_io`] - Loading settings and tables from TOML or JSON
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod context;
pub mod conversion;
pub mod errors;
pub mod estimate;
pub mod file_io;
pub mod geometry;
pub mod labor;
pub mod materials;
pub mod mix;
pub mod project;
pub mod reinforcement;
pub mod settings;
pub mod tables;
pub mod units;

pub use context::EstimationContext;
pub use errors::{CalcError, CalcResult, FieldIssue, IssueKind};
pub use estimate::{EstimationResult, SubWorkMode};
pub use file_io::{load_settings, load_tables, save_settings};
pub use project::{EstimateProject, ProjectMetadata};
pub use settings::EstimationSettings;
pub use tables::{default_tables, LookupTables, TableStore};
