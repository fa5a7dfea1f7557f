//! Risk classifier: a feature vector to a tier in 1..=4.
//!
//! Each metric is banded independently (strict `<` on every upper bound, so
//! a boundary value lands in the higher band), the bands are combined with
//! fixed weights, and the weighted score is truncated toward zero.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rolling::FeatureRecord;

pub const CASE_WEIGHT: f64 = 0.6;
pub const DEATH_WEIGHT: f64 = 0.3;
pub const VACCINATION_WEIGHT: f64 = 0.2;

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Integer risk tier; 1 is the lowest risk, 4 the highest.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
  pub const MIN: Tier = Tier(1);
  pub const MAX: Tier = Tier(4);

  pub fn new(value: u8) -> Option<Self> {
    (Self::MIN.0..=Self::MAX.0).contains(&value).then_some(Self(value))
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Tier {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Tier::new(value).ok_or_else(|| format!("tier out of range: {value}"))
  }
}

impl From<Tier> for u8 {
  fn from(tier: Tier) -> u8 { tier.0 }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Sub-scores ──────────────────────────────────────────────────────────────

/// Band for the trailing new-case rate per 100k.
pub fn case_subscore(rolling7_cases_per_100k: f64) -> u8 {
  match rolling7_cases_per_100k {
    v if v < 3.0 => 1,
    v if v < 10.0 => 2,
    v if v < 20.0 => 3,
    _ => 4,
  }
}

/// Band for the trailing new-death rate per 100k.
pub fn death_subscore(rolling7_deaths_per_100k: f64) -> u8 {
  match rolling7_deaths_per_100k {
    v if v < 0.1 => 1,
    v if v < 0.3 => 2,
    v if v < 0.6 => 3,
    _ => 4,
  }
}

fn first_dose_band(pct: f64) -> f64 {
  match pct {
    v if v < 40.0 => 2.0,
    v if v < 60.0 => 1.5,
    v if v < 90.0 => 1.0,
    _ => 0.5,
  }
}

fn fully_vaccinated_band(pct: f64) -> f64 {
  match pct {
    v if v < 20.0 => 2.0,
    v if v < 40.0 => 1.5,
    v if v < 60.0 => 1.0,
    _ => 0.5,
  }
}

/// Sum of the first-dose and full-vaccination bands; between 1.0 and 4.0.
pub fn vaccination_subscore(
  pct_at_least_one_dose: f64,
  pct_fully_vaccinated: f64,
) -> f64 {
  first_dose_band(pct_at_least_one_dose)
    + fully_vaccinated_band(pct_fully_vaccinated)
}

/// Truncating conversion; 3.999 is tier 3. Scores produced by
/// [`weighted_score`] always lie in `[1.1, 4.4]`.
pub fn tier_from_score(score: f64) -> Tier {
  // NaN casts to 0; keep the result inside the tier range regardless.
  let truncated = score.trunc().clamp(1.0, 4.0) as u8;
  Tier(truncated.max(Tier::MIN.0))
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Every intermediate value behind a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
  pub case_subscore:        u8,
  pub death_subscore:       u8,
  pub vaccination_subscore: f64,
  pub score:                f64,
  pub tier:                 Tier,
}

/// The four inputs the classifier reads. A [`FeatureRecord`] converts into
/// this; callers that only hold the windowed values can build it directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifyInput {
  pub rolling7_cases_per_100k:  f64,
  pub rolling7_deaths_per_100k: f64,
  pub pct_at_least_one_dose:    f64,
  pub pct_fully_vaccinated:     f64,
}

impl From<&FeatureRecord> for ClassifyInput {
  fn from(f: &FeatureRecord) -> Self {
    Self {
      rolling7_cases_per_100k:  f.rolling7_cases_per_100k,
      rolling7_deaths_per_100k: f.rolling7_deaths_per_100k,
      pct_at_least_one_dose:    f.pct_at_least_one_dose,
      pct_fully_vaccinated:     f.pct_fully_vaccinated,
    }
  }
}

pub fn weighted_score(case: u8, death: u8, vaccination: f64) -> f64 {
  CASE_WEIGHT * f64::from(case)
    + DEATH_WEIGHT * f64::from(death)
    + VACCINATION_WEIGHT * vaccination
}

pub fn breakdown(input: &ClassifyInput) -> RiskBreakdown {
  let case = case_subscore(input.rolling7_cases_per_100k);
  let death = death_subscore(input.rolling7_deaths_per_100k);
  let vaccination =
    vaccination_subscore(input.pct_at_least_one_dose, input.pct_fully_vaccinated);
  let score = weighted_score(case, death, vaccination);
  RiskBreakdown {
    case_subscore: case,
    death_subscore: death,
    vaccination_subscore: vaccination,
    score,
    tier: tier_from_score(score),
  }
}

/// Classify a complete feature vector. Pure and idempotent.
pub fn classify(features: &FeatureRecord) -> Tier {
  breakdown(&ClassifyInput::from(features)).tier
}
