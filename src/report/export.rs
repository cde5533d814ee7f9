// src/report/export.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Date32Array, Float64Array, StringArray, UInt64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::Datelike;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

use super::TimeSeriesPoint;
use crate::model::{AggregatedCases, ScatterRow};

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A row type that can be written as one Arrow record batch.
/// - Defines the schema and how a slice of rows becomes columns.
pub trait ExportRow: Sized {
    /// Arrow schema for this row type
    fn schema() -> Schema;
    /// Convert rows into column arrays matching the schema
    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef>;
}

impl ExportRow for AggregatedCases {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("location", DataType::Utf8, false),
            Field::new("total_cases", DataType::UInt64, false),
        ])
    }

    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.location.as_str()),
            )),
            Arc::new(UInt64Array::from_iter_values(
                rows.iter().map(|r| r.total_cases),
            )),
        ]
    }
}

impl ExportRow for ScatterRow {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("location", DataType::Utf8, false),
            Field::new("population", DataType::Float64, false),
            Field::new("total_cases", DataType::UInt64, false),
            Field::new("cases_per_100k", DataType::Float64, false),
        ])
    }

    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.location.as_str()),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.population),
            )),
            Arc::new(UInt64Array::from_iter_values(
                rows.iter().map(|r| r.total_cases),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(ScatterRow::cases_per_100k),
            )),
        ]
    }
}

impl ExportRow for TimeSeriesPoint {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("location", DataType::Utf8, false),
            Field::new("date", DataType::Date32, false),
            Field::new("new_cases", DataType::UInt64, true),
            Field::new("new_cases_7d", DataType::Float64, true),
        ])
    }

    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.location.as_str()),
            )),
            Arc::new(Date32Array::from_iter_values(
                rows.iter()
                    .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
            )),
            Arc::new(UInt64Array::from(
                rows.iter().map(|r| r.new_cases).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.new_cases_7d).collect::<Vec<_>>(),
            )),
        ]
    }
}

/// Write `rows` to `<dir>/<stem>.parquet` (Snappy). The file is written under
/// a `.tmp` name and renamed once closed.
pub fn write_parquet<R: ExportRow>(dir: &Path, stem: &str, rows: &[R]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("could not create `{}`", dir.display()))?;

    let schema = Arc::new(R::schema());
    let batch = RecordBatch::try_new(schema.clone(), R::to_arrays(rows))
        .with_context(|| format!("building `{}` record batch", stem))?;

    let final_path = dir.join(format!("{}.parquet", stem));
    let tmp = dir.join(format!("{}.parquet.tmp", stem));
    let file =
        File::create(&tmp).with_context(|| format!("creating `{}`", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, Some(props))
        .with_context(|| format!("creating Arrow writer for `{}`", stem))?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    fs::rename(&tmp, &final_path)
        .with_context(|| format!("renaming into `{}`", final_path.display()))?;

    info!(path = %final_path.display(), rows = rows.len(), "wrote dataset");
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use chrono::NaiveDate;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    fn read_back(path: &Path) -> Result<Vec<RecordBatch>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(1024)
            .build()?;
        Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    #[test]
    fn writes_scatter_rows() -> Result<()> {
        let dir = tempdir()?;
        let rows = vec![
            ScatterRow {
                location: "Germany".into(),
                population: 83e6,
                total_cases: 830_000,
            },
            ScatterRow {
                location: "Ireland".into(),
                population: 5e6,
                total_cases: 500,
            },
        ];
        let path = write_parquet(dir.path(), "scatter", &rows)?;
        assert_eq!(path, dir.path().join("scatter.parquet"));
        assert!(!dir.path().join("scatter.parquet.tmp").exists());

        let batches = read_back(&path)?;
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 2);
        let per_100k = batches[0]
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!((per_100k.value(0) - 1000.0).abs() < 1e-9);
        assert!((per_100k.value(1) - 10.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn writes_time_series_with_nulls_and_dates() -> Result<()> {
        let dir = tempdir()?;
        let rows = vec![
            TimeSeriesPoint {
                location: "Ireland".into(),
                date: NaiveDate::from_ymd_opt(1970, 1, 2).unwrap(),
                new_cases: Some(3),
                new_cases_7d: Some(3.0),
            },
            TimeSeriesPoint {
                location: "Ireland".into(),
                date: NaiveDate::from_ymd_opt(1970, 1, 3).unwrap(),
                new_cases: None,
                new_cases_7d: Some(3.0),
            },
        ];
        let path = write_parquet(dir.path(), "timeseries", &rows)?;
        let batches = read_back(&path)?;
        let batch = &batches[0];

        let dates = batch
            .column(1)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.value(0), 1);
        assert_eq!(dates.value(1), 2);

        let new_cases = batch
            .column(2)
            .as_any()
            .downcast_ref::<UInt64Array>()
            .unwrap();
        assert_eq!(new_cases.value(0), 3);
        assert!(new_cases.is_null(1));
        Ok(())
    }

    #[test]
    fn writes_empty_dataset() -> Result<()> {
        let dir = tempdir()?;
        let path = write_parquet::<AggregatedCases>(dir.path(), "bar", &[])?;
        let rows: usize = read_back(&path)?.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 0);
        Ok(())
    }
}
