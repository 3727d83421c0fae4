//! # Mix Ratio Resolution
//!
//! Maps a concrete grade code ("K-225") or a mortar ratio code ("1:4") to
//! fixed material proportions from the lookup tables.
//!
//! An explicitly requested code that is not in the table fails with
//! `UnknownGrade`; nothing is inferred. Only when no grade is given at all
//! does [`MixRatioResolver::resolve_concrete_or_default`] fall back to the
//! table's documented default grade.
//!
//! ## Mortar
//!
//! A mortar ratio `C:S` (cement parts : sand parts by volume) resolves to
//! fractions of the mortar volume:
//!
//! ```text
//! cement_fraction = C / (C + S)
//! sand_fraction   = 1 - cement_fraction
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rab_core::mix::{MixRatio, MixRatioResolver};
//! use rab_core::tables::default_tables;
//!
//! let resolver = MixRatioResolver::new(default_tables());
//! let mortar = resolver.resolve_mortar("1:4").unwrap();
//! assert!((mortar.cement_fraction - 0.2).abs() < 1e-12);
//!
//! match resolver.resolve("K-225").unwrap() {
//!     MixRatio::Concrete(mix) => assert_eq!(mix.cement_kg_per_m3, 375.0),
//!     MixRatio::Mortar(_) => unreachable!(),
//! }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::materials::concrete::normalize_grade_code;
use crate::materials::ConcreteMix;
use crate::tables::LookupTables;

/// Cement/sand split of a mortar, by volume
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MortarMix {
    pub cement_parts: u32,
    pub sand_parts: u32,
    pub cement_fraction: f64,
    pub sand_fraction: f64,
}

impl MortarMix {
    pub fn from_parts(cement_parts: u32, sand_parts: u32) -> Self {
        let cement = f64::from(cement_parts);
        let cement_fraction = if cement > 0.0 {
            cement / (cement + f64::from(sand_parts))
        } else {
            0.0
        };
        MortarMix {
            cement_parts,
            sand_parts,
            cement_fraction,
            sand_fraction: 1.0 - cement_fraction,
        }
    }

    /// Ratio code, e.g. "1:4"
    pub fn code(&self) -> String {
        format!("{}:{}", self.cement_parts, self.sand_parts)
    }
}

/// Resolved proportions for a grade or ratio code
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MixRatio {
    Concrete(ConcreteMix),
    Mortar(MortarMix),
}

/// Parse "C:S" into parts; `None` when malformed or without cement
pub fn parse_mortar_ratio(code: &str) -> Option<(u32, u32)> {
    let (c, s) = code.trim().split_once(':')?;
    let cement: u32 = c.trim().parse().ok()?;
    let sand: u32 = s.trim().parse().ok()?;
    if cement == 0 {
        return None;
    }
    Some((cement, sand))
}

/// Resolves codes against an injected table snapshot.
#[derive(Debug, Clone)]
pub struct MixRatioResolver {
    tables: Arc<LookupTables>,
}

impl MixRatioResolver {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        MixRatioResolver { tables }
    }

    /// Resolve either kind of code ("K-225" or "1:4")
    pub fn resolve(&self, code: &str) -> CalcResult<MixRatio> {
        if code.contains(':') {
            self.resolve_mortar(code).map(MixRatio::Mortar)
        } else {
            self.resolve_concrete(code).map(MixRatio::Concrete)
        }
    }

    /// Resolve a concrete grade code
    ///
    /// # Errors
    ///
    /// * `UnknownGrade` - code not in the grade table
    pub fn resolve_concrete(&self, code: &str) -> CalcResult<ConcreteMix> {
        let key = normalize_grade_code(code);
        self.tables
            .concrete_grades
            .get(&key)
            .copied()
            .ok_or_else(|| CalcError::unknown_grade(code))
    }

    /// Resolve a concrete grade, using the table default only when none is given.
    ///
    /// A blank string counts as "not given" (forgiving form input); any other
    /// unknown code is still an error.
    pub fn resolve_concrete_or_default(
        &self,
        code: Option<&str>,
    ) -> CalcResult<(String, ConcreteMix)> {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => Ok((normalize_grade_code(c), self.resolve_concrete(c)?)),
            None => {
                let default = &self.tables.default_grade;
                Ok((default.clone(), self.resolve_concrete(default)?))
            }
        }
    }

    /// Resolve a mortar ratio code
    ///
    /// # Errors
    ///
    /// * `UnknownGrade` - malformed, or not one of the accepted ratios
    pub fn resolve_mortar(&self, code: &str) -> CalcResult<MortarMix> {
        let (cement, sand) =
            parse_mortar_ratio(code).ok_or_else(|| CalcError::unknown_grade(code))?;
        let accepted = self
            .tables
            .mortar_ratios
            .iter()
            .filter_map(|r| parse_mortar_ratio(r))
            .any(|parts| parts == (cement, sand));
        if !accepted {
            return Err(CalcError::unknown_grade(code));
        }
        Ok(MortarMix::from_parts(cement, sand))
    }

    /// Grade codes ordered by cement content, weakest first
    pub fn concrete_codes(&self) -> Vec<String> {
        let mut grades: Vec<_> = self.tables.concrete_grades.iter().collect();
        grades.sort_by(|a, b| a.1.cement_kg_per_m3.total_cmp(&b.1.cement_kg_per_m3));
        grades.into_iter().map(|(code, _)| code.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::default_tables;

    fn resolver() -> MixRatioResolver {
        MixRatioResolver::new(default_tables())
    }

    #[test]
    fn test_resolve_k225() {
        let mix = resolver().resolve_concrete("K-225").unwrap();
        assert_eq!(mix.sand_m3_per_m3, 0.48);
        assert_eq!(mix.gravel_m3_per_m3, 0.68);
    }

    #[test]
    fn test_unknown_grade_is_error() {
        let err = resolver().resolve("K-999").unwrap_err();
        assert_eq!(err, CalcError::unknown_grade("K-999"));
        assert!(resolver().resolve("").is_err());
        assert!(resolver().resolve("1:9").is_err());
        assert!(resolver().resolve("0:0").is_err());
        assert!(resolver().resolve("a:b").is_err());
    }

    #[test]
    fn test_default_only_when_absent() {
        let r = resolver();
        let (code, mix) = r.resolve_concrete_or_default(None).unwrap();
        assert_eq!(code, "K-225");
        assert_eq!(mix.cement_kg_per_m3, 375.0);

        let (code, _) = r.resolve_concrete_or_default(Some("  ")).unwrap();
        assert_eq!(code, "K-225");

        let (code, _) = r.resolve_concrete_or_default(Some("k300")).unwrap();
        assert_eq!(code, "K-300");

        assert!(r.resolve_concrete_or_default(Some("K-999")).is_err());
    }

    #[test]
    fn test_mortar_fractions() {
        let m = resolver().resolve_mortar("1:4").unwrap();
        assert!((m.cement_fraction - 0.2).abs() < 1e-12);
        assert!((m.sand_fraction - 0.8).abs() < 1e-12);
        assert_eq!(m.code(), "1:4");

        let m = resolver().resolve_mortar(" 1 : 2 ").unwrap();
        assert!((m.cement_fraction - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_concrete_monotonic_through_resolver() {
        let r = resolver();
        let codes = r.concrete_codes();
        assert_eq!(codes.first().map(String::as_str), Some("K-100"));
        assert_eq!(codes.last().map(String::as_str), Some("K-350"));
        let mixes: Vec<_> = codes.iter().map(|c| r.resolve_concrete(c).unwrap()).collect();
        for pair in mixes.windows(2) {
            assert!(pair[1].cement_kg_per_m3 > pair[0].cement_kg_per_m3);
            assert!(pair[1].water_cement_ratio < pair[0].water_cement_ratio);
        }
    }

    #[test]
    fn test_custom_tables_injected() {
        let mut tables = (*default_tables()).clone();
        tables.mortar_ratios.push("1:10".to_string());
        let r = MixRatioResolver::new(Arc::new(tables));
        let m = r.resolve_mortar("1:10").unwrap();
        assert!((m.cement_fraction - 1.0 / 11.0).abs() < 1e-12);
        // builtin resolver still rejects it
        assert!(resolver().resolve_mortar("1:10").is_err());
    }

    #[test]
    fn test_parse_mortar_ratio() {
        assert_eq!(parse_mortar_ratio("1:4"), Some((1, 4)));
        assert_eq!(parse_mortar_ratio("0:4"), None);
        assert_eq!(parse_mortar_ratio("0:0"), None);
        assert_eq!(parse_mortar_ratio("1-4"), None);
        assert_eq!(parse_mortar_ratio("4294967296:1"), None);
    }

    #[test]
    fn test_extreme_parts_do_not_overflow() {
        let mix = MortarMix::from_parts(u32::MAX, 1);
        assert!(mix.cement_fraction > 0.999_999);
        assert!(mix.sand_fraction >= 0.0);

        let mix = MortarMix::from_parts(u32::MAX, u32::MAX);
        assert!((mix.cement_fraction - 0.5).abs() < 1e-12);
        assert_eq!(MortarMix::from_parts(0, 4).cement_fraction, 0.0);
    }

    #[test]
    fn test_custom_ratio_table_with_large_parts() {
        let mut tables = LookupTables::builtin();
        tables.mortar_ratios.push("4294967295:1".to_string());
        tables.validate().unwrap();
        let resolver = MixRatioResolver::new(Arc::new(tables));
        let mortar = resolver.resolve_mortar("4294967295:1").unwrap();
        assert_eq!(mortar.cement_parts, u32::MAX);

        let mut tables = LookupTables::builtin();
        tables.mortar_ratios.push("0:4".to_string());
        assert!(tables.validate().is_err());
    }
}
