//! SQL schema for the riskmap SQLite store.
//!
//! Executed once at connection startup. Every write is an upsert, so the
//! same feed can be imported any number of times.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS regions (
    region_id       TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    code            TEXT NOT NULL,
    population_2020 INTEGER NOT NULL CHECK (population_2020 >= 0),
    population_2021 INTEGER NOT NULL CHECK (population_2021 >= 0)
);

-- region_id is not a foreign key: facilities of unknown regions are kept
-- and projected with an absent tier.
CREATE TABLE IF NOT EXISTS facilities (
    facility_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    region_id   TEXT NOT NULL,
    county_id   TEXT,
    zip_code    TEXT,
    latitude    REAL,
    longitude   REAL
);

-- Cumulative counters; one row per (region, date).
CREATE TABLE IF NOT EXISTS daily_counters (
    region_id        TEXT NOT NULL,
    date             TEXT NOT NULL,   -- YYYY-MM-DD
    cases            INTEGER NOT NULL,
    deaths           INTEGER NOT NULL,
    first_dose       INTEGER NOT NULL DEFAULT 0,
    fully_vaccinated INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (region_id, date)
);

CREATE INDEX IF NOT EXISTS facilities_region_idx ON facilities(region_id);

PRAGMA user_version = 1;
";
