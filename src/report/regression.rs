// src/report/regression.rs

use serde::Serialize;

use crate::model::ScatterRow;

/// Least-squares line through (log10 population, log10 total cases).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogLogFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Points used; rows with zero cases have no logarithm and are skipped.
    pub points: usize,
}

impl LogLogFit {
    /// Predicted total cases for a population.
    pub fn predict(&self, population: f64) -> f64 {
        10f64.powf(self.intercept + self.slope * population.log10())
    }
}

pub fn fit_log_log(rows: &[ScatterRow]) -> Option<LogLogFit> {
    let pts: Vec<(f64, f64)> = rows
        .iter()
        .filter(|r| r.total_cases > 0 && r.population > 0.0)
        .map(|r| (r.population.log10(), (r.total_cases as f64).log10()))
        .collect();
    if pts.len() < 2 {
        return None;
    }

    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = pts.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = pts.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let syy: f64 = pts.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    // a flat response is fitted exactly
    let r_squared = if syy == 0.0 { 1.0 } else { (sxy * sxy) / (sxx * syy) };

    Some(LogLogFit {
        slope,
        intercept,
        r_squared,
        points: pts.len(),
    })
}
