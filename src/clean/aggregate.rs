// src/clean/aggregate.rs

use std::collections::BTreeMap;

use super::{names::NameMap, retain_resolved, Stage};
use crate::model::{AggregatedCases, CaseRecord};

/// Group by location and keep the largest cumulative count seen. Missing
/// values do not take part in the max; a location with nothing but missing
/// values is dropped. Output is sorted by location.
pub fn aggregate_max_total<'a, I>(records: I) -> Vec<AggregatedCases>
where
    I: IntoIterator<Item = &'a CaseRecord>,
{
    let mut groups: BTreeMap<&str, Option<u64>> = BTreeMap::new();
    for rec in records {
        let slot = groups.entry(rec.location.as_str()).or_insert(None);
        *slot = max_present(*slot, rec.total_cases);
    }

    retain_resolved(Stage::Aggregate, groups, |(location, total)| {
        total.map(|total_cases| AggregatedCases {
            location: location.to_string(),
            total_cases,
        })
    })
}

/// Rewrite locations to their reconciled spelling. Two source spellings
/// landing on the same name are merged with the same max rule.
pub fn merge_reconciled(rows: Vec<AggregatedCases>, names: &NameMap) -> Vec<AggregatedCases> {
    let mut merged: BTreeMap<String, u64> = BTreeMap::new();
    for row in rows {
        let slot = merged.entry(names.reconcile(&row.location)).or_insert(0);
        *slot = (*slot).max(row.total_cases);
    }
    merged
        .into_iter()
        .map(|(location, total_cases)| AggregatedCases {
            location,
            total_cases,
        })
        .collect()
}

fn max_present(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
