// src/clean/names.rs

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Source spelling → spelling used by the world boundary reference
/// (Natural Earth `name` column).
static DEFAULT_NAME_MAP: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    [
        ("England", "United Kingdom"),
        ("United States", "United States of America"),
        ("Czech Republic", "Czechia"),
        ("Democratic Republic of Congo", "Dem. Rep. Congo"),
        ("Cote d'Ivoire", "Côte d'Ivoire"),
        ("Bosnia and Herzegovina", "Bosnia and Herz."),
        ("Central African Republic", "Central African Rep."),
        ("South Sudan", "S. Sudan"),
        ("Dominican Republic", "Dominican Rep."),
        ("Eswatini", "eSwatini"),
        ("Equatorial Guinea", "Eq. Guinea"),
        ("Solomon Islands", "Solomon Is."),
        ("East Timor", "Timor-Leste"),
        ("Western Sahara", "W. Sahara"),
        ("Falkland Islands", "Falkland Is."),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
});

/// Built-in source → reference spelling table.
pub fn default_name_map() -> BTreeMap<String, String> {
    DEFAULT_NAME_MAP.clone()
}

/// Immutable country-name reconciliation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMap {
    entries: BTreeMap<String, String>,
}

impl NameMap {
    /// Build a map, rejecting chains (`a → b` with `b → c`), which would make
    /// reconciliation depend on how many times it is applied.
    pub fn new(entries: BTreeMap<String, String>) -> Result<Self> {
        for (from, to) in &entries {
            if let Some(next) = entries.get(to) {
                if next != to {
                    bail!(
                        "name map chains `{}` → `{}` → `{}`; map `{}` straight to its final spelling",
                        from,
                        to,
                        next,
                        from
                    );
                }
            }
        }
        Ok(Self { entries })
    }

    /// The mapped spelling, or the input unchanged.
    pub fn reconcile(&self, name: &str) -> String {
        self.entries
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Reconcile a list of names, dropping duplicates created by the mapping
    /// while keeping first-seen order.
    pub fn reconcile_names<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let mapped = self.reconcile(name);
            if !out.contains(&mapped) {
                out.push(mapped);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NameMap {
    fn default() -> Self {
        Self {
            entries: default_name_map(),
        }
    }
}
