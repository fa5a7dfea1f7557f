//! [`SqliteStore`], the SQLite implementation of [`SeriesStore`].

use std::path::Path;

use chrono::NaiveDate;
use riskmap_core::{
  region::{Facility, Region, RegionId},
  series::DailyCounterRecord,
  store::SeriesStore,
};
use tracing::debug;

use crate::{
  Result,
  encode::{
    EncodedCounters, RawCounters, RawFacility, RawRegion, encode_count,
    encode_counters, encode_date,
  },
  schema::SCHEMA,
};

fn raw_counters(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCounters> {
  Ok(RawCounters {
    region_id:        row.get(0)?,
    date:             row.get(1)?,
    cases:            row.get(2)?,
    deaths:           row.get(3)?,
    first_dose:       row.get(4)?,
    fully_vaccinated: row.get(5)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Region catalog and cumulative series backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored counter rows across all regions.
  pub async fn counter_rows(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM daily_counters", [], |r| {
          r.get(0)
        })?)
      })
      .await?;
    Ok(usize::try_from(n).unwrap_or_default())
  }

  async fn query_counters(
    &self,
    sql: &'static str,
    region: &RegionId,
    through: Option<(NaiveDate, usize)>,
  ) -> Result<Vec<DailyCounterRecord>> {
    let region_str = region.as_str().to_owned();
    let bounds = through
      .map(|(date, limit)| -> Result<_> {
        Ok((encode_date(date), encode_count(limit as u64)?))
      })
      .transpose()?;

    let raws: Vec<RawCounters> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = match bounds {
          Some((date, limit)) => stmt
            .query_map(rusqlite::params![region_str, date, limit], raw_counters)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map(rusqlite::params![region_str], raw_counters)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCounters::into_record).collect()
  }
}

// ─── SeriesStore impl ────────────────────────────────────────────────────────

impl SeriesStore for SqliteStore {
  type Error = crate::Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn upsert_region(&self, region: Region) -> Result<()> {
    let p2020 = encode_count(region.population_2020)?;
    let p2021 = encode_count(region.population_2021)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO regions (region_id, name, code, population_2020, population_2021)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (region_id) DO UPDATE SET
             name            = excluded.name,
             code            = excluded.code,
             population_2020 = excluded.population_2020,
             population_2021 = excluded.population_2021",
          rusqlite::params![region.region_id.0, region.name, region.code, p2020, p2021],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn upsert_facility(&self, facility: Facility) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO facilities (
             facility_id, name, region_id, county_id, zip_code, latitude, longitude
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (facility_id) DO UPDATE SET
             name      = excluded.name,
             region_id = excluded.region_id,
             county_id = excluded.county_id,
             zip_code  = excluded.zip_code,
             latitude  = excluded.latitude,
             longitude = excluded.longitude",
          rusqlite::params![
            facility.facility_id.0,
            facility.name,
            facility.region_id.0,
            facility.county_id,
            facility.zip_code,
            facility.latitude,
            facility.longitude,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_regions(&self) -> Result<Vec<Region>> {
    let raws: Vec<RawRegion> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT region_id, name, code, population_2020, population_2021
           FROM regions ORDER BY region_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawRegion {
              region_id:       row.get(0)?,
              name:            row.get(1)?,
              code:            row.get(2)?,
              population_2020: row.get(3)?,
              population_2021: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRegion::into_region).collect()
  }

  async fn list_facilities(&self) -> Result<Vec<Facility>> {
    let raws: Vec<RawFacility> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT facility_id, name, region_id, county_id, zip_code, latitude, longitude
           FROM facilities ORDER BY facility_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawFacility {
              facility_id: row.get(0)?,
              name:        row.get(1)?,
              region_id:   row.get(2)?,
              county_id:   row.get(3)?,
              zip_code:    row.get(4)?,
              latitude:    row.get(5)?,
              longitude:   row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawFacility::into_facility).collect())
  }

  // ── Raw series ────────────────────────────────────────────────────────────

  async fn record_counters(&self, records: Vec<DailyCounterRecord>) -> Result<usize> {
    let rows: Vec<EncodedCounters> =
      records.iter().map(encode_counters).collect::<Result<_>>()?;

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO daily_counters (
               region_id, date, cases, deaths, first_dose, fully_vaccinated
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (region_id, date) DO UPDATE SET
               cases            = excluded.cases,
               deaths           = excluded.deaths,
               first_dose       = excluded.first_dose,
               fully_vaccinated = excluded.fully_vaccinated",
          )?;
          for (region_id, date, cases, deaths, first, full) in &rows {
            stmt.execute(rusqlite::params![region_id, date, cases, deaths, first, full])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    debug!(written, "counters recorded");
    Ok(written)
  }

  async fn region_history<'a>(
    &'a self,
    region: &'a RegionId,
  ) -> Result<Vec<DailyCounterRecord>> {
    const SQL: &str = "
      SELECT region_id, date, cases, deaths, first_dose, fully_vaccinated
      FROM daily_counters WHERE region_id = ?1 ORDER BY date";
    self.query_counters(SQL, region, None).await
  }

  async fn region_history_through<'a>(
    &'a self,
    region: &'a RegionId,
    through: NaiveDate,
    limit: usize,
  ) -> Result<Vec<DailyCounterRecord>> {
    const SQL: &str = "
      SELECT region_id, date, cases, deaths, first_dose, fully_vaccinated
      FROM daily_counters WHERE region_id = ?1 AND date <= ?2
      ORDER BY date DESC LIMIT ?3";
    let mut records = self
      .query_counters(SQL, region, Some((through, limit)))
      .await?;
    records.reverse();
    Ok(records)
  }
}
