// src/model.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One daily observation for a location, as read from the cases file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    pub location: String,
    pub date: NaiveDate,
    pub new_cases: Option<u64>,
    pub total_cases: Option<u64>,
}

/// Per-location maximum of the cumulative case count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedCases {
    pub location: String,
    pub total_cases: u64,
}

/// The population column comes in three encodings depending on the provider:
/// a bare number, a list (most recent value first) or a nested table with a
/// `total` column. Anything else lands in `Other`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PopulationField {
    Number(f64),
    List(Vec<Value>),
    Table(Map<String, Value>),
    Other(Value),
}

/// Metadata row before the population field has been resolved.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryMetadata {
    pub location: String,
    #[serde(default = "missing_population")]
    pub population: PopulationField,
}

fn missing_population() -> PopulationField {
    PopulationField::Other(Value::Null)
}

/// Metadata row with a resolved, strictly positive population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMetadata {
    pub location: String,
    pub population: f64,
}

/// A location that survived every filter: present in the metadata, the
/// aggregated cases and the study list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterRow {
    pub location: String,
    pub population: f64,
    pub total_cases: u64,
}

impl ScatterRow {
    pub fn cases_per_100k(&self) -> f64 {
        self.total_cases as f64 / self.population * 100_000.0
    }
}
