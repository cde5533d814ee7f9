// src/load/mod.rs
pub mod date_parser;
pub mod utils;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::{debug, info, warn};

use crate::model::{CaseRecord, CountryMetadata, PopulationField};
use utils::{clean_str, parse_count};

/// Cases file contents plus the number of rows that had to be skipped.
#[derive(Debug, Default)]
pub struct CaseLoad {
    pub records: Vec<CaseRecord>,
    /// Rows without a location or with an unparsable date.
    pub skipped_rows: usize,
}

/// Columns we need from the daily cases export; the rest are ignored.
#[derive(Debug, Deserialize)]
struct RawCaseRow {
    location: String,
    date: String,
    #[serde(default)]
    new_cases: Option<String>,
    #[serde(default)]
    total_cases: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMetadataRow {
    location: String,
    #[serde(default)]
    population: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReferenceRow {
    name: String,
}

/// The JSON metadata either comes as a plain array of rows or as an object
/// keyed by ISO code whose values are rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetadataDocument {
    Rows(Vec<CountryMetadata>),
    Keyed(BTreeMap<String, CountryMetadata>),
}

/// Load the per-country daily case file.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_cases<P: AsRef<Path>>(path: P) -> Result<CaseLoad> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open cases file: {:?}", path.as_ref()))?;
    let load = read_cases(BufReader::new(file))
        .with_context(|| format!("Failed to read cases file: {:?}", path.as_ref()))?;
    info!(
        records = load.records.len(),
        skipped = load.skipped_rows,
        "loaded case records"
    );
    Ok(load)
}

pub fn read_cases<R: Read>(reader: R) -> Result<CaseLoad> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut load = CaseLoad::default();
    for (idx, result) in rdr.deserialize::<RawCaseRow>().enumerate() {
        let raw = result.with_context(|| format!("CSV parse error at record {}", idx))?;

        let location = clean_str(&raw.location);
        if location.is_empty() {
            load.skipped_rows += 1;
            continue;
        }
        let Some(date) = date_parser::parse_iso_date(&clean_str(&raw.date)) else {
            debug!(location = %location, date = %raw.date, "unparsable date; skipping row");
            load.skipped_rows += 1;
            continue;
        };

        load.records.push(CaseRecord {
            location,
            date,
            new_cases: parse_count(raw.new_cases.as_deref()),
            total_cases: parse_count(raw.total_cases.as_deref()),
        });
    }

    if load.skipped_rows > 0 {
        warn!(skipped = load.skipped_rows, "skipped case rows without location or date");
    }
    Ok(load)
}

/// Load country metadata. `.json` files are read as JSON documents,
/// anything else as CSV.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<CountryMetadata>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open metadata file: {:?}", path))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let rows = if is_json {
        read_metadata_json(BufReader::new(file))
    } else {
        read_metadata_csv(BufReader::new(file))
    }
    .with_context(|| format!("Failed to read metadata file: {:?}", path))?;

    info!(rows = rows.len(), "loaded metadata rows");
    Ok(rows)
}

pub fn read_metadata_json<R: Read>(reader: R) -> Result<Vec<CountryMetadata>> {
    let doc: MetadataDocument =
        serde_json::from_reader(reader).context("metadata JSON has an unexpected layout")?;
    Ok(match doc {
        MetadataDocument::Rows(rows) => rows,
        MetadataDocument::Keyed(map) => map.into_values().collect(),
    })
}

pub fn read_metadata_csv<R: Read>(reader: R) -> Result<Vec<CountryMetadata>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize::<RawMetadataRow>().enumerate() {
        let raw = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let location = clean_str(&raw.location);
        if location.is_empty() {
            continue;
        }
        rows.push(CountryMetadata {
            location,
            population: parse_population_cell(raw.population.as_deref()),
        });
    }
    Ok(rows)
}

/// A CSV population cell holds a bare number or JSON text for the nested
/// encodings. Text that is not JSON is kept as an opaque string.
fn parse_population_cell(cell: Option<&str>) -> PopulationField {
    let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
        return PopulationField::Other(Value::Null);
    };
    serde_json::from_str(cell).unwrap_or_else(|_| PopulationField::Other(Value::String(cell.into())))
}

/// Load the country names used by the geographic reference (a CSV with a
/// `name` column).
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_reference_names<P: AsRef<Path>>(path: P) -> Result<BTreeSet<String>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open reference file: {:?}", path.as_ref()))?;
    let names = read_reference_names(BufReader::new(file))
        .with_context(|| format!("Failed to read reference file: {:?}", path.as_ref()))?;
    info!(names = names.len(), "loaded reference country names");
    Ok(names)
}

pub fn read_reference_names<R: Read>(reader: R) -> Result<BTreeSet<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut names = BTreeSet::new();
    for (idx, result) in rdr.deserialize::<RawReferenceRow>().enumerate() {
        let raw = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let name = clean_str(&raw.name);
        if !name.is_empty() {
            names.insert(name);
        }
    }
    Ok(names)
}
