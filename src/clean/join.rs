// src/clean/join.rs

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use super::{retain_resolved, Stage};
use crate::model::{AggregatedCases, NormalizedMetadata, ScatterRow};

/// Intersect the three location sets and inner-join metadata with the
/// aggregated cases. All inputs must already carry reconciled names; keys
/// are compared as exact strings. Output is sorted by location.
pub fn join_scatter(
    cases: &[AggregatedCases],
    metadata: &[NormalizedMetadata],
    study: &[String],
) -> Vec<ScatterRow> {
    let meta_locations: BTreeSet<&str> = metadata.iter().map(|m| m.location.as_str()).collect();
    let case_locations: BTreeSet<&str> = cases.iter().map(|c| c.location.as_str()).collect();
    let study_locations: BTreeSet<&str> = study.iter().map(String::as_str).collect();

    let valid: BTreeSet<&str> = meta_locations
        .iter()
        .filter(|loc| case_locations.contains(*loc) && study_locations.contains(*loc))
        .copied()
        .collect();
    debug!(
        metadata = meta_locations.len(),
        cases = case_locations.len(),
        study = study_locations.len(),
        valid = valid.len(),
        "intersected location sets"
    );

    let totals: BTreeMap<&str, u64> = cases
        .iter()
        .map(|c| (c.location.as_str(), c.total_cases))
        .collect();

    let mut rows = retain_resolved(
        Stage::Join,
        metadata
            .iter()
            .filter(|m| valid.contains(m.location.as_str())),
        |m| {
            totals.get(m.location.as_str()).map(|&total_cases| ScatterRow {
                location: m.location.clone(),
                population: m.population,
                total_cases,
            })
        },
    );
    rows.sort_by(|a, b| a.location.cmp(&b.location));
    rows
}

/// A location whose spelling has no match in the geographic reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMismatch {
    pub location: String,
    /// Whether the location is one of the study countries.
    pub in_study: bool,
}

/// Anti-join of `names` against the reference spellings. Study countries are
/// reported at warn level, everything else at debug; the pipeline carries on
/// either way.
pub fn find_name_mismatches<'a, I>(
    names: I,
    study: &'a [String],
    reference: &BTreeSet<String>,
) -> Vec<NameMismatch>
where
    I: IntoIterator<Item = &'a str>,
{
    let candidates: BTreeSet<&str> = names
        .into_iter()
        .chain(study.iter().map(String::as_str))
        .collect();

    let mismatches: Vec<NameMismatch> = candidates
        .into_iter()
        .filter(|name| !reference.contains(*name))
        .map(|name| NameMismatch {
            location: name.to_string(),
            in_study: study.iter().any(|s| s == name),
        })
        .collect();

    for m in &mismatches {
        if m.in_study {
            warn!(location = %m.location, "study country has no match in the geographic reference");
        } else {
            debug!(location = %m.location, "location has no match in the geographic reference");
        }
    }
    if !mismatches.is_empty() {
        warn!(
            unmatched = mismatches.len(),
            "locations missing from the geographic reference"
        );
    }
    mismatches
}
