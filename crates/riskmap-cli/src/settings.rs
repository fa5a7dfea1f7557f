//! Runtime settings: an optional TOML file layered under `RISKMAP_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use riskmap_core::config::{DeltaPolicy, PopulationBasis, RunConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  #[serde(default = "default_artifact_dir")]
  pub artifact_dir:      PathBuf,
  #[serde(default)]
  pub population_basis:  PopulationBasis,
  #[serde(default)]
  pub delta_policy:      DeltaPolicy,
  #[serde(default)]
  pub fallback_to_batch: bool,
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
}

fn default_store_path() -> PathBuf { PathBuf::from("riskmap.db") }

fn default_artifact_dir() -> PathBuf { PathBuf::from("artifacts") }

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

impl Settings {
  /// Read `path` if it exists, then apply `RISKMAP_*` overrides.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("RISKMAP").try_parsing(true))
      .build()
      .with_context(|| format!("failed to read config from {}", path.display()))?;

    let mut settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    settings.artifact_dir = expand_tilde(&settings.artifact_dir);
    Ok(settings)
  }

  pub fn run_config(&self) -> RunConfig {
    RunConfig {
      population_basis:  self.population_basis,
      delta_policy:      self.delta_policy,
      fallback_to_batch: self.fallback_to_batch,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
