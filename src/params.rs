//! Parameter metadata for pattern detectors
//!
//! Every builtin detector threshold is described by a [`ParamMeta`] with its
//! default and a search range, enabling:
//! - Grid search over thresholds
//! - Parameter documentation
//! - Building detectors from loosely typed settings
//!
//! # Example
//!
//! ```rust
//! use fno_analytics::params::ParameterizedDetector;
//! use fno_analytics::prelude::*;
//! use std::collections::HashMap;
//!
//! for param in HammerDetector::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("long_wick_factor", 2.5);
//! let hammer = HammerDetector::with_params(&params).unwrap();
//! assert_eq!(hammer.shape.long_wick_factor, 2.5);
//! ```

use std::collections::HashMap;

use crate::{check_factor, AnalyticsError, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Fraction in 0.0..=1.0, stored as [`Ratio`]
  Ratio,
  /// Non-negative multiplier applied to a body or wick (may exceed 1.0)
  Factor,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "long_wick_factor")
  pub name: &'static str,
  /// Parameter type (Ratio or Factor)
  pub param_type: ParamType,
  /// Default value
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  /// Create a new ParamMeta for a Ratio parameter
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  /// Create a new ParamMeta for a Factor parameter
  pub const fn factor(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Factor, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    if step <= 0.0 || !step.is_finite() {
      return vec![min];
    }
    let mut values = Vec::new();
    let mut i = 0u32;
    loop {
      let v = min + step * f64::from(i);
      if v > max + 1e-9 {
        break;
      }
      values.push(v);
      i += 1;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(AnalyticsError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ratio::new(value).map(|_| ()),
      ParamType::Factor => check_factor(self.name, value),
    }
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that support parameterization
///
/// Implementing this trait enables:
/// - Discovery of available parameters
/// - Creation of detectors with custom parameter values
/// - Grid search optimization
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  /// Returns the pattern name
  fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a non-negative factor from params with default fallback
pub fn get_factor(params: &HashMap<&str, f64>, key: &'static str, default: f64) -> Result<f64> {
  let value = params.get(key).copied().unwrap_or(default);
  check_factor(key, value)?;
  Ok(value)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_param_meta_ratio() {
    let meta = ParamMeta::ratio("test_ratio", 0.5, (0.3, 0.7, 0.1), "Test ratio parameter");

    assert_eq!(meta.name, "test_ratio");
    assert_eq!(meta.param_type, ParamType::Ratio);
    assert_eq!(meta.default, 0.5);
  }

  #[test]
  fn test_param_meta_factor() {
    let meta = ParamMeta::factor("test_factor", 2.0, (1.5, 3.0, 0.5), "Test factor parameter");

    assert_eq!(meta.param_type, ParamType::Factor);
    assert_eq!(meta.generate_grid(), vec![1.5, 2.0, 2.5, 3.0]);
  }

  #[test]
  fn test_generate_grid() {
    let meta = ParamMeta::ratio("test", 0.5, (0.3, 0.7, 0.2), "Test");

    let grid = meta.generate_grid();
    assert_eq!(grid.len(), 3);
    assert!((grid[0] - 0.3).abs() < 1e-9);
    assert!((grid[1] - 0.5).abs() < 1e-9);
    assert!((grid[2] - 0.7).abs() < 1e-9);
  }

  #[test]
  fn test_generate_grid_degenerate_step() {
    let meta = ParamMeta::ratio("test", 0.5, (0.5, 0.5, 0.0), "Test");
    assert_eq!(meta.generate_grid(), vec![0.5]);
  }

  #[test]
  fn test_validate_ratio() {
    let meta = ParamMeta::ratio("test", 0.5, (0.3, 0.7, 0.1), "Test");

    assert!(meta.validate(0.5).is_ok());
    assert!(meta.validate(0.3).is_ok());
    assert!(meta.validate(0.7).is_ok());
    assert!(meta.validate(0.2).is_err());
    assert!(meta.validate(0.8).is_err());
  }

  #[test]
  fn test_validate_factor() {
    let meta = ParamMeta::factor("test", 2.0, (1.5, 3.0, 0.5), "Test");

    assert!(meta.validate(2.0).is_ok());
    assert!(meta.validate(1.0).is_err());
    assert!(meta.validate(f64::NAN).is_err());
  }

  #[test]
  fn test_get_ratio_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 0.8);

    assert!((get_ratio(&params, "key1", 0.5).unwrap().get() - 0.8).abs() < f64::EPSILON);
    assert!((get_ratio(&params, "key2", 0.5).unwrap().get() - 0.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_get_factor_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 2.5);
    params.insert("bad", -1.0);

    assert_eq!(get_factor(&params, "key1", 2.0).unwrap(), 2.5);
    assert_eq!(get_factor(&params, "key2", 2.0).unwrap(), 2.0);
    assert!(get_factor(&params, "bad", 2.0).is_err());
  }

  #[test]
  fn test_defaults_sit_inside_their_ranges() {
    use crate::detectors::*;

    let all = [
      HammerDetector::param_meta(),
      DojiDetector::param_meta(),
      DragonflyDojiDetector::param_meta(),
      SpinningTopDetector::param_meta(),
      PiercingLineDetector::param_meta(),
      MorningStarDetector::param_meta(),
      ThreeWhiteSoldiersDetector::param_meta(),
    ];
    for meta in all.iter().flat_map(|m| m.iter()) {
      assert!(meta.validate(meta.default).is_ok(), "{} default out of range", meta.name);
    }
  }
}
