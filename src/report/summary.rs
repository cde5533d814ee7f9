// src/report/summary.rs

use prettytable::{format, Cell, Row, Table};
use std::fmt;

use super::{Report, ScatterSection};
use crate::model::ScatterRow;

/// Box-drawn table of the joined study countries.
pub fn summary_table(rows: &[ScatterRow]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.add_row(Row::new(vec![
        Cell::new("Location").style_spec("bFg"),
        Cell::new("Population").style_spec("bFg"),
        Cell::new("Total Cases").style_spec("bFg"),
        Cell::new("Cases / 100k").style_spec("bFg"),
    ]));

    for row in rows {
        table.add_row(Row::new(vec![
            Cell::new(&row.location),
            Cell::new(&format!("{:.0}", row.population)).style_spec("r"),
            Cell::new(&row.total_cases.to_string()).style_spec("r"),
            Cell::new(&format!("{:.1}", row.cases_per_100k())).style_spec("r"),
        ]));
    }
    table
}

/// Plain-text report body: the summary table (or the placeholder notice),
/// the fitted line and the reference diagnostics.
pub fn render(report: &Report) -> String {
    Rendered(report).to_string()
}

struct Rendered<'a>(&'a Report);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        match &report.scatter {
            ScatterSection::Placeholder(notice) => writeln!(f, "{}", notice)?,
            ScatterSection::Rows { rows, fit } => {
                writeln!(f, "--- Study countries ---")?;
                write!(f, "{}", summary_table(rows))?;
                match fit {
                    Some(fit) => writeln!(
                        f,
                        "log10(cases) = {:.3} * log10(population) {:+.3}  (r² = {:.3}, n = {})",
                        fit.slope, fit.intercept, fit.r_squared, fit.points
                    )?,
                    None => writeln!(f, "Not enough distinct points for a log-log fit.")?,
                }
            }
        }

        writeln!(
            f,
            "Datasets: {} map rows, {} bar rows, {} time-series points",
            report.choropleth.len(),
            report.bar.len(),
            report.timeseries.len()
        )?;

        if !report.mismatches.is_empty() {
            writeln!(
                f,
                "{} locations have no match in the geographic reference",
                report.mismatches.len()
            )?;
            let names: Vec<&str> = report
                .mismatches
                .iter()
                .filter(|m| m.in_study)
                .map(|m| m.location.as_str())
                .collect();
            if !names.is_empty() {
                writeln!(f, "Unmatched study countries: {}", names.join(", "))?;
            }
        }
        Ok(())
    }
}
