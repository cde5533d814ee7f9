// src/report/mod.rs
pub mod export;
pub mod regression;
pub mod summary;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::clean::{
    aggregate_max_total, find_name_mismatches, join_scatter, merge_reconciled,
    normalize_metadata, NameMap, NameMismatch,
};
use crate::model::{AggregatedCases, CaseRecord, CountryMetadata, ScatterRow};
use export::write_parquet;
use regression::{fit_log_log, LogLogFit};

/// Shown in place of the scatter plot when no country survives the join.
pub const EMPTY_SCATTER_NOTICE: &str =
    "No study country has both a known population and a case total; the population vs. cases plot is omitted.";

/// Days covered by the trailing mean, the current day included.
const ROLLING_WINDOW_DAYS: i64 = 7;

/// One day of new cases for a study country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub location: String,
    pub date: NaiveDate,
    pub new_cases: Option<u64>,
    /// Mean of the present `new_cases` values in the trailing window.
    pub new_cases_7d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScatterSection {
    Rows {
        rows: Vec<ScatterRow>,
        fit: Option<LogLogFit>,
    },
    Placeholder(String),
}

impl ScatterSection {
    fn from_rows(rows: Vec<ScatterRow>) -> Self {
        if rows.is_empty() {
            warn!("scatter dataset is empty; emitting placeholder");
            return ScatterSection::Placeholder(EMPTY_SCATTER_NOTICE.to_string());
        }
        let fit = fit_log_log(&rows);
        ScatterSection::Rows { rows, fit }
    }

    pub fn rows(&self) -> &[ScatterRow] {
        match self {
            ScatterSection::Rows { rows, .. } => rows,
            ScatterSection::Placeholder(_) => &[],
        }
    }
}

/// Everything the presentation layer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Aggregated totals for every location the map can draw.
    pub choropleth: Vec<AggregatedCases>,
    /// Study-country totals, largest first.
    pub bar: Vec<AggregatedCases>,
    pub scatter: ScatterSection,
    pub timeseries: Vec<TimeSeriesPoint>,
    /// Empty when no geographic reference was supplied.
    pub mismatches: Vec<NameMismatch>,
}

impl Report {
    /// Run reconciliation, aggregation, normalization and the join, and
    /// shape the results for each chart.
    pub fn build(
        cases: &[CaseRecord],
        metadata: &[CountryMetadata],
        study_countries: &[String],
        names: &NameMap,
        reference: Option<&BTreeSet<String>>,
    ) -> Self {
        let study = names.reconcile_names(study_countries);
        let aggregated = merge_reconciled(aggregate_max_total(cases), names);
        let normalized = normalize_metadata(metadata, names);
        info!(
            aggregated = aggregated.len(),
            normalized = normalized.len(),
            study = study.len(),
            "cleaned inputs"
        );

        let (choropleth, mismatches) = match reference {
            Some(reference) => {
                let mismatches = find_name_mismatches(
                    aggregated.iter().map(|a| a.location.as_str()),
                    &study,
                    reference,
                );
                let drawable = aggregated
                    .iter()
                    .filter(|a| reference.contains(&a.location))
                    .cloned()
                    .collect();
                (drawable, mismatches)
            }
            None => (aggregated.clone(), Vec::new()),
        };

        let mut bar: Vec<AggregatedCases> = aggregated
            .iter()
            .filter(|a| study.contains(&a.location))
            .cloned()
            .collect();
        bar.sort_by(|a, b| {
            b.total_cases
                .cmp(&a.total_cases)
                .then_with(|| a.location.cmp(&b.location))
        });

        let scatter = ScatterSection::from_rows(join_scatter(&aggregated, &normalized, &study));
        let timeseries = build_timeseries(cases, &study, names);

        Report {
            choropleth,
            bar,
            scatter,
            timeseries,
            mismatches,
        }
    }

    /// Write each dataset as Parquet under `dir`. The scatter file is only
    /// written when there is something to plot; a placeholder removes any
    /// scatter file left by an earlier run.
    pub fn export(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = vec![
            write_parquet(dir, "choropleth", &self.choropleth)?,
            write_parquet(dir, "bar", &self.bar)?,
        ];
        match &self.scatter {
            ScatterSection::Rows { rows, .. } => {
                written.push(write_parquet(dir, "scatter", rows)?);
            }
            ScatterSection::Placeholder(_) => {
                let stale = dir.join("scatter.parquet");
                if stale.exists() {
                    fs::remove_file(&stale)
                        .with_context(|| format!("removing stale `{}`", stale.display()))?;
                    info!(path = %stale.display(), "removed stale scatter dataset");
                }
            }
        }
        written.push(write_parquet(dir, "timeseries", &self.timeseries)?);
        Ok(written)
    }
}

/// Daily new cases for the study countries, sorted by location then date.
/// If reconciliation folds two spellings onto one day, the first present
/// value wins.
fn build_timeseries(cases: &[CaseRecord], study: &[String], names: &NameMap) -> Vec<TimeSeriesPoint> {
    let mut days: BTreeMap<(String, NaiveDate), Option<u64>> = BTreeMap::new();
    for rec in cases {
        let location = names.reconcile(&rec.location);
        if !study.contains(&location) {
            continue;
        }
        let slot = days.entry((location, rec.date)).or_insert(None);
        if slot.is_none() {
            *slot = rec.new_cases;
        }
    }

    let mut points: Vec<TimeSeriesPoint> = days
        .into_iter()
        .map(|((location, date), new_cases)| TimeSeriesPoint {
            location,
            date,
            new_cases,
            new_cases_7d: None,
        })
        .collect();
    fill_trailing_mean(&mut points);
    points
}

/// `points` must be sorted by location then date.
fn fill_trailing_mean(points: &mut [TimeSeriesPoint]) {
    let window = Duration::days(ROLLING_WINDOW_DAYS - 1);
    for i in 0..points.len() {
        let (location, end) = (points[i].location.clone(), points[i].date);
        let start = end - window;
        let (mut sum, mut n) = (0f64, 0u32);
        for p in points[..=i]
            .iter()
            .rev()
            .take_while(|p| p.location == location && p.date >= start)
        {
            if let Some(v) = p.new_cases {
                sum += v as f64;
                n += 1;
            }
        }
        points[i].new_cases_7d = (n > 0).then(|| sum / n as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PopulationField;
    use tempfile::tempdir;

    fn rec(location: &str, date: &str, new: Option<u64>, total: Option<u64>) -> CaseRecord {
        CaseRecord {
            location: location.into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            new_cases: new,
            total_cases: total,
        }
    }

    fn meta(location: &str, population: f64) -> CountryMetadata {
        CountryMetadata {
            location: location.into(),
            population: PopulationField::Number(population),
        }
    }

    fn study(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_every_dataset() {
        let cases = vec![
            rec("Ireland", "2021-01-01", Some(10), Some(100)),
            rec("Ireland", "2021-06-01", Some(20), Some(500)),
            rec("England", "2021-01-01", Some(30), Some(900)),
            rec("Germany", "2021-01-01", None, None),
            rec("World", "2021-01-01", Some(1), Some(10_000)),
        ];
        let metadata = vec![
            meta("Ireland", 5e6),
            meta("United Kingdom", 67e6),
            meta("Germany", 83e6),
        ];
        let reference: BTreeSet<String> = ["Ireland", "United Kingdom", "Germany"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = Report::build(
            &cases,
            &metadata,
            &study(&["Ireland", "England", "Germany"]),
            &NameMap::default(),
            Some(&reference),
        );

        let map: Vec<&str> = report.choropleth.iter().map(|a| a.location.as_str()).collect();
        assert_eq!(map, vec!["Ireland", "United Kingdom"]);

        let bar: Vec<(&str, u64)> = report
            .bar
            .iter()
            .map(|a| (a.location.as_str(), a.total_cases))
            .collect();
        assert_eq!(bar, vec![("United Kingdom", 900), ("Ireland", 500)]);

        let scatter: Vec<&str> = report
            .scatter
            .rows()
            .iter()
            .map(|r| r.location.as_str())
            .collect();
        assert_eq!(scatter, vec!["Ireland", "United Kingdom"]);
        assert!(matches!(report.scatter, ScatterSection::Rows { fit: Some(_), .. }));

        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].location, "World");

        assert_eq!(report.timeseries.len(), 4);
        assert!(report.timeseries.iter().all(|p| p.location != "World"));
    }

    #[test]
    fn empty_join_yields_placeholder_and_no_scatter_file() -> Result<()> {
        let cases = vec![rec("Ireland", "2021-01-01", Some(1), Some(100))];
        let metadata = vec![meta("France", 67e6)];
        let report = Report::build(
            &cases,
            &metadata,
            &study(&["Ireland", "France"]),
            &NameMap::default(),
            None,
        );
        assert_eq!(
            report.scatter,
            ScatterSection::Placeholder(EMPTY_SCATTER_NOTICE.to_string())
        );
        assert!(report.scatter.rows().is_empty());
        assert!(report.mismatches.is_empty());

        let dir = tempdir()?;
        let written = report.export(dir.path())?;
        assert_eq!(written.len(), 3);
        assert!(!dir.path().join("scatter.parquet").exists());
        assert!(dir.path().join("timeseries.parquet").exists());
        Ok(())
    }

    #[test]
    fn trailing_mean_skips_missing_and_resets_per_location() {
        let cases = vec![
            rec("Ireland", "2021-01-01", Some(10), None),
            rec("Ireland", "2021-01-02", None, None),
            rec("Ireland", "2021-01-03", Some(20), None),
            rec("Ireland", "2021-01-10", Some(40), None),
            rec("Spain", "2021-01-03", None, None),
            rec("Spain", "2021-01-04", Some(6), None),
        ];
        let points = build_timeseries(&cases, &study(&["Ireland", "Spain"]), &NameMap::default());
        let means: Vec<Option<f64>> = points.iter().map(|p| p.new_cases_7d).collect();
        assert_eq!(
            means,
            vec![
                Some(10.0),
                Some(10.0),
                Some(15.0),
                Some(40.0),
                None,
                Some(6.0)
            ]
        );
    }

    #[test]
    fn empty_export_removes_scatter_from_previous_run() -> Result<()> {
        let dir = tempdir()?;
        let cases = vec![rec("Ireland", "2021-01-01", Some(1), Some(100))];

        let full = Report::build(
            &cases,
            &[meta("Ireland", 5e6)],
            &study(&["Ireland"]),
            &NameMap::default(),
            None,
        );
        assert_eq!(full.scatter.rows().len(), 1);
        full.export(dir.path())?;
        assert!(dir.path().join("scatter.parquet").exists());

        let empty = Report::build(
            &cases,
            &[meta("France", 67e6)],
            &study(&["Ireland"]),
            &NameMap::default(),
            None,
        );
        assert!(matches!(empty.scatter, ScatterSection::Placeholder(_)));
        let written = empty.export(dir.path())?;
        assert_eq!(written.len(), 3);
        assert!(!dir.path().join("scatter.parquet").exists());
        Ok(())
    }

    #[test]
    fn trailing_mean_handles_counts_near_u64_max() {
        let cases = vec![
            rec("Ireland", "2021-01-01", Some(10_000_000_000_000_000_000), None),
            rec("Ireland", "2021-01-02", Some(10_000_000_000_000_000_000), None),
        ];
        let points = build_timeseries(&cases, &study(&["Ireland"]), &NameMap::default());
        let mean = points[1].new_cases_7d.unwrap();
        assert!((mean - 1e19).abs() / 1e19 < 1e-12);
    }

    #[test]
    fn timeseries_prefers_first_present_value_on_merged_days() {
        let cases = vec![
            rec("England", "2021-01-01", None, None),
            rec("United Kingdom", "2021-01-01", Some(8), None),
            rec("England", "2021-01-01", Some(99), None),
        ];
        let points = build_timeseries(&cases, &study(&["United Kingdom"]), &NameMap::default());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].new_cases, Some(8));
    }
}
