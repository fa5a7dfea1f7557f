//! Run-level configuration for the feature engine.

use serde::{Deserialize, Serialize};

/// Which reference-year population figure normalises every rate in a run.
///
/// Chosen once per run; the engine never picks a figure per call site.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PopulationBasis {
  Year2020,
  #[default]
  Year2021,
}

/// What to do with a negative daily delta caused by a counter revision.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DeltaPolicy {
  /// Negative deltas are signal and flow through unchanged.
  #[default]
  Propagate,
  /// Negative deltas are replaced with zero.
  ClampToZero,
}

impl DeltaPolicy {
  pub fn apply(self, delta: i64) -> i64 {
    match self {
      Self::Propagate => delta,
      Self::ClampToZero => delta.max(0),
    }
  }
}

/// Settings that affect computed values. Two runs with equal `RunConfig` over
/// equal inputs produce identical output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
  #[serde(default)]
  pub population_basis:  PopulationBasis,
  #[serde(default)]
  pub delta_policy:      DeltaPolicy,
  /// In append runs, recompute regions with an incomplete prior window from
  /// their full history instead of failing them.
  #[serde(default)]
  pub fallback_to_batch: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn propagate_keeps_negative_deltas() {
    assert_eq!(DeltaPolicy::Propagate.apply(-12), -12);
    assert_eq!(DeltaPolicy::default().apply(-1), -1);
  }

  #[test]
  fn clamp_zeroes_negative_deltas_only() {
    assert_eq!(DeltaPolicy::ClampToZero.apply(-12), 0);
    assert_eq!(DeltaPolicy::ClampToZero.apply(7), 7);
  }

  #[test]
  fn default_basis_is_2021() {
    assert_eq!(PopulationBasis::default(), PopulationBasis::Year2021);
  }
}
