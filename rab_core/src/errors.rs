//! # Error Types
//!
//! Structured error types for rab_core. Every variant carries enough context
//! for a caller to point at the offending input, and the whole enum
//! serializes to JSON so a front end can render it without string parsing.
//!
//! ## Two tiers
//!
//! Component functions fail fast with a single kind (`InvalidDimensions`,
//! `UnknownGrade`, ...). Work-item `commit` runs collect every problem into a
//! [`ValidationReport`] and fail once with [`CalcError::Validation`], so all
//! offending fields can be highlighted together.
//!
//! ## Example
//!
//! ```rust
//! use rab_core::errors::{CalcError, CalcResult};
//!
//! fn validate_area(area_m2: f64) -> CalcResult<()> {
//!     if area_m2 <= 0.0 {
//!         return Err(CalcError::invalid_dimensions(
//!             "area_m2",
//!             area_m2.to_string(),
//!             "Area must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_area(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for rab_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for estimation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A geometric input is non-positive where a final result needs it positive
    #[error("Invalid dimension '{field}': {value} - {reason}")]
    InvalidDimensions {
        field: String,
        value: String,
        reason: String,
    },

    /// Conversion factor missing, zero, negative, or applied to the wrong unit
    #[error("Invalid conversion rule '{rule}': {reason}")]
    InvalidConversionRule { rule: String, reason: String },

    /// Mix grade or mortar ratio code not present in the lookup table
    #[error("Unknown mix grade: {code}")]
    UnknownGrade { code: String },

    /// Worker counts both zero, or a malformed tukang:pekerja ratio
    #[error("Invalid worker allocation: {reason}")]
    InvalidAllocation { reason: String },

    /// Negative waste percentage
    #[error("Invalid waste factor: {value} (must be >= 0)")]
    InvalidWasteFactor { value: String },

    /// Negative profit percentage
    #[error("Invalid profit factor: {value} (must be >= 0)")]
    InvalidProfitFactor { value: String },

    /// Negative or non-finite unit price
    #[error("Invalid price for {material}: {value} (must be >= 0)")]
    InvalidPrice { material: String, value: String },

    /// Material (catalog entry, rebar size) not found
    #[error("Material not found: {material_name}")]
    MaterialNotFound { material_name: String },

    /// One or more fields failed commit validation
    #[error("Validation failed: {} issue(s)", issues.len())]
    Validation { issues: Vec<FieldIssue> },

    /// Settings or table file could not be read or written
    #[error("Config error: {operation} on '{path}' - {reason}")]
    ConfigError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an InvalidDimensions error
    pub fn invalid_dimensions(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidDimensions {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConversionRule error
    pub fn invalid_conversion_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidConversionRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownGrade error
    pub fn unknown_grade(code: impl Into<String>) -> Self {
        CalcError::UnknownGrade { code: code.into() }
    }

    /// Create an InvalidAllocation error
    pub fn invalid_allocation(reason: impl Into<String>) -> Self {
        CalcError::InvalidAllocation { reason: reason.into() }
    }

    /// Create an InvalidPrice error
    pub fn invalid_price(material: impl Into<String>, value: f64) -> Self {
        CalcError::InvalidPrice {
            material: material.into(),
            value: value.to_string(),
        }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material_name: impl Into<String>) -> Self {
        CalcError::MaterialNotFound {
            material_name: material_name.into(),
        }
    }

    /// Create a ConfigError
    pub fn config_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::ConfigError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get the issue kind this error maps to, if it is a domain input error
    pub fn kind(&self) -> Option<IssueKind> {
        match self {
            CalcError::InvalidDimensions { .. } => Some(IssueKind::InvalidDimensions),
            CalcError::InvalidConversionRule { .. } => Some(IssueKind::InvalidConversionRule),
            CalcError::UnknownGrade { .. } => Some(IssueKind::UnknownGrade),
            CalcError::InvalidAllocation { .. } => Some(IssueKind::InvalidAllocation),
            CalcError::InvalidWasteFactor { .. } => Some(IssueKind::InvalidWasteFactor),
            CalcError::InvalidProfitFactor { .. } => Some(IssueKind::InvalidProfitFactor),
            CalcError::InvalidPrice { .. } => Some(IssueKind::InvalidPrice),
            CalcError::MaterialNotFound { .. } => Some(IssueKind::MaterialNotFound),
            _ => None,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidDimensions { .. } => "INVALID_DIMENSIONS",
            CalcError::InvalidConversionRule { .. } => "INVALID_CONVERSION_RULE",
            CalcError::UnknownGrade { .. } => "UNKNOWN_GRADE",
            CalcError::InvalidAllocation { .. } => "INVALID_ALLOCATION",
            CalcError::InvalidWasteFactor { .. } => "INVALID_WASTE_FACTOR",
            CalcError::InvalidProfitFactor { .. } => "INVALID_PROFIT_FACTOR",
            CalcError::InvalidPrice { .. } => "INVALID_PRICE",
            CalcError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            CalcError::Validation { .. } => "VALIDATION_FAILED",
            CalcError::ConfigError { .. } => "CONFIG_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// Field-level issues carried by a Validation error (empty otherwise)
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            CalcError::Validation { issues } => issues,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError { reason: e.to_string() }
    }
}

/// Kind of a field-level validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    InvalidDimensions,
    InvalidConversionRule,
    UnknownGrade,
    InvalidAllocation,
    InvalidWasteFactor,
    InvalidProfitFactor,
    InvalidPrice,
    MaterialNotFound,
}

/// A single offending input field.
///
/// ## JSON Example
///
/// ```json
/// {
///   "field": "wall_area_m2",
///   "value": "0",
///   "kind": "InvalidDimensions",
///   "message": "Wall area must be positive"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub value: String,
    pub kind: IssueKind,
    pub message: String,
}

/// Collects field issues during a commit validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue
    pub fn push(
        &mut self,
        field: impl Into<String>,
        value: impl ToString,
        kind: IssueKind,
        message: impl Into<String>,
    ) {
        self.issues.push(FieldIssue {
            field: field.into(),
            value: value.to_string(),
            kind,
            message: message.into(),
        });
    }

    /// Record `InvalidDimensions` unless `value > 0`
    pub fn require_positive(&mut self, field: &str, value: f64, message: &str) {
        if !(value > 0.0) {
            self.push(field, value, IssueKind::InvalidDimensions, message);
        }
    }

    /// Record `kind` unless `value >= 0`
    pub fn require_non_negative(
        &mut self,
        field: &str,
        value: f64,
        kind: IssueKind,
        message: &str,
    ) {
        if !(value >= 0.0) {
            self.push(field, value, kind, message);
        }
    }

    /// Record the error of a component call against `field`, passing the value through.
    pub fn check<T>(&mut self, field: &str, result: CalcResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(CalcError::Validation { issues }) => {
                self.issues.extend(issues);
                None
            }
            Err(e) => {
                let kind = e.kind().unwrap_or(IssueKind::InvalidDimensions);
                self.push(field, "", kind, e.to_string());
                None
            }
        }
    }

    /// Merge another report (e.g. from a nested spec) under a field prefix
    pub fn extend_prefixed(&mut self, prefix: &str, other: ValidationReport) {
        for mut issue in other.issues {
            issue.field = format!("{}.{}", prefix, issue.field);
            self.issues.push(issue);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(())` when no issues were recorded, `Err(Validation)` otherwise
    pub fn into_result(self) -> CalcResult<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(CalcError::Validation { issues: self.issues })
        }
    }
}
