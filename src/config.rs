// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use crate::clean::names::{default_name_map, NameMap};

/// Countries under study, in source spelling. Names are reconciled before use.
pub const DEFAULT_STUDY_COUNTRIES: [&str; 13] = [
    "Ireland",
    "England",
    "Germany",
    "France",
    "Italy",
    "Spain",
    "Sweden",
    "United States",
    "Brazil",
    "India",
    "Japan",
    "South Africa",
    "Australia",
];

/// Everything a run needs. Every key is optional in the YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StudyConfig {
    pub cases_path: PathBuf,
    pub metadata_path: PathBuf,
    /// CSV with a `name` column listing the reference country spellings.
    pub reference_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub study_countries: Vec<String>,
    pub name_map: BTreeMap<String, String>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            cases_path: PathBuf::from("data/cases.csv"),
            metadata_path: PathBuf::from("data/metadata.csv"),
            reference_path: None,
            output_dir: PathBuf::from("report"),
            study_countries: DEFAULT_STUDY_COUNTRIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            name_map: default_name_map(),
        }
    }
}

impl StudyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn names(&self) -> Result<NameMap> {
        NameMap::new(self.name_map.clone()).context("invalid name_map")
    }
}
