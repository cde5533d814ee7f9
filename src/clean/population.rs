// src/clean/population.rs

use serde_json::Value;
use std::collections::BTreeMap;

use super::{names::NameMap, retain_resolved, Stage};
use crate::model::{CountryMetadata, NormalizedMetadata, PopulationField};

impl PopulationField {
    /// First match wins: a bare number, then the head of a list, then the
    /// first value of a `total` column. Non-positive or non-finite values
    /// count as missing.
    pub fn resolve(&self) -> Option<f64> {
        let raw = match self {
            PopulationField::Number(n) => Some(*n),
            PopulationField::List(items) => items.first().and_then(Value::as_f64),
            PopulationField::Table(columns) => columns.get("total").and_then(first_value),
            PopulationField::Other(_) => None,
        };
        raw.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// A table column is normally an array; a single-row column may have been
/// flattened to a bare number.
fn first_value(column: &Value) -> Option<f64> {
    match column {
        Value::Array(items) => items.first().and_then(Value::as_f64),
        other => other.as_f64(),
    }
}

/// Resolve populations, reconcile location spellings and drop rows with no
/// usable population. When two rows land on the same location the first one
/// wins. Output is sorted by location.
pub fn normalize_metadata(rows: &[CountryMetadata], names: &NameMap) -> Vec<NormalizedMetadata> {
    let resolved = retain_resolved(Stage::Normalize, rows, |row| {
        row.population.resolve().map(|population| NormalizedMetadata {
            location: names.reconcile(&row.location),
            population,
        })
    });

    let mut by_location: BTreeMap<String, NormalizedMetadata> = BTreeMap::new();
    for row in resolved {
        by_location.entry(row.location.clone()).or_insert(row);
    }
    by_location.into_values().collect()
}
