// src/clean/mod.rs
pub mod aggregate;
pub mod join;
pub mod names;
pub mod population;

pub use aggregate::{aggregate_max_total, merge_reconciled};
pub use join::{find_name_mismatches, join_scatter, NameMismatch};
pub use names::NameMap;
pub use population::normalize_metadata;

use tracing::debug;

/// Pipeline step that discards rows whose value could not be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Aggregate,
    Normalize,
    Join,
}

impl Stage {
    pub fn as_str(&self) -> &str {
        match self {
            Stage::Aggregate => "aggregate",
            Stage::Normalize => "normalize",
            Stage::Join => "join",
        }
    }
}

/// Map every item through `resolve` and keep only the ones that produced a
/// value. This is the one place rows get silently excluded for missing data.
pub fn retain_resolved<T, U, I, F>(stage: Stage, items: I, mut resolve: F) -> Vec<U>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Option<U>,
{
    let mut dropped = 0usize;
    let kept: Vec<U> = items
        .into_iter()
        .filter_map(|item| {
            let out = resolve(item);
            if out.is_none() {
                dropped += 1;
            }
            out
        })
        .collect();
    debug!(
        stage = stage.as_str(),
        kept = kept.len(),
        dropped,
        "dropped unresolved rows"
    );
    kept
}
