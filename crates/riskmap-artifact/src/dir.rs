//! [`ArtifactDir`], the filesystem implementation of [`ArtifactStore`].

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use riskmap_core::{
  project::{DateArtifact, FacilityRiskRow, RegionRiskRow},
  series::{format_date, parse_date},
  store::ArtifactStore,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::{
  Error, Result,
  codec::{FACILITY_COLUMNS, REGION_COLUMNS, decode, encode},
  digest::artifact_digest,
};

const REGIONS: &str = "regions";
const FACILITIES: &str = "facilities";
const EXTENSION: &str = "csv";

/// A directory of per-date artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
  root: PathBuf,
}

impl ArtifactDir {
  /// Does no I/O; subdirectories are created on first write.
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  pub fn region_path(&self, date: NaiveDate) -> PathBuf {
    self.path_in(REGIONS, date)
  }

  pub fn facility_path(&self, date: NaiveDate) -> PathBuf {
    self.path_in(FACILITIES, date)
  }

  fn path_in(&self, kind: &str, date: NaiveDate) -> PathBuf {
    self
      .root
      .join(kind)
      .join(format!("{}.{EXTENSION}", format_date(date)))
  }

  /// Contents of a file, or `None` if it does not exist.
  async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::io(path)(e)),
    }
  }

  async fn read_rows<T: DeserializeOwned>(path: PathBuf) -> Result<Option<Vec<T>>> {
    let Some(bytes) = Self::read_optional(&path).await? else {
      return Ok(None);
    };
    decode(&bytes).map(Some).map_err(Error::csv(path))
  }

  /// Write through a sibling temp file and rename, so readers never see a
  /// partially written table.
  async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(Error::io(parent))?;
    }
    let tmp = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp, bytes).await.map_err(Error::io(&tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(Error::io(path))?;
    Ok(())
  }
}

impl ArtifactStore for ArtifactDir {
  type Error = Error;

  async fn write_artifact<'a>(&'a self, artifact: &'a DateArtifact) -> Result<String> {
    let region_path = self.region_path(artifact.date);
    let facility_path = self.facility_path(artifact.date);
    let regions =
      encode(&REGION_COLUMNS, &artifact.regions).map_err(Error::csv(&region_path))?;
    let facilities = encode(&FACILITY_COLUMNS, &artifact.facilities)
      .map_err(Error::csv(&facility_path))?;

    // The region file marks a date as present; it goes last.
    Self::write_file(&facility_path, &facilities).await?;
    Self::write_file(&region_path, &regions).await?;

    let digest = artifact_digest(&regions, &facilities);
    info!(
      date = %artifact.date,
      regions = artifact.regions.len(),
      facilities = artifact.facilities.len(),
      %digest,
      "artifact written"
    );
    Ok(digest)
  }

  async fn region_rows(&self, date: NaiveDate) -> Result<Option<Vec<RegionRiskRow>>> {
    Self::read_rows(self.region_path(date)).await
  }

  async fn facility_rows(
    &self,
    date: NaiveDate,
  ) -> Result<Option<Vec<FacilityRiskRow>>> {
    Self::read_rows(self.facility_path(date)).await
  }

  async fn digest(&self, date: NaiveDate) -> Result<Option<String>> {
    let regions = Self::read_optional(&self.region_path(date)).await?;
    let facilities = Self::read_optional(&self.facility_path(date)).await?;
    match (regions, facilities) {
      (Some(r), Some(f)) => Ok(Some(artifact_digest(&r, &f))),
      (None, None) => Ok(None),
      _ => Err(Error::Incomplete(format_date(date))),
    }
  }

  async fn list_dates(&self) -> Result<Vec<NaiveDate>> {
    let dir = self.root.join(REGIONS);
    let mut entries = match tokio::fs::read_dir(&dir).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(Error::io(&dir)(e)),
    };

    let mut dates = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(Error::io(&dir))? {
      let path = entry.path();
      if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        continue;
      }
      match path.file_stem().and_then(|s| s.to_str()).map(parse_date) {
        Some(Ok(date)) => dates.push(date),
        _ => debug!(path = %path.display(), "ignoring non-artifact file"),
      }
    }
    dates.sort_unstable();
    Ok(dates)
  }

  async fn latest_date(&self) -> Result<Option<NaiveDate>> {
    Ok(self.list_dates().await?.pop())
  }
}
