// src/dataset/write.rs

use arrow::{
    array::{ArrayRef, BooleanArray, Date32Array, Float64Array, StringArray, TimestampMicrosecondArray},
    record_batch::RecordBatch,
};
use chrono::Datelike;
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, instrument};

use crate::dataset::{Column, Dataset};
use crate::error::{PipelineError, Result};
use crate::process::record::{FieldValue, ValueKind};
use crate::schema::{arrow::TIMESTAMP_TZ, build_arrow_schema};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
pub(crate) const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn mismatch(column: &Column, value: &FieldValue) -> String {
    format!(
        "column `{}` is {:?} but holds a {:?} value",
        column.name,
        column.kind,
        value.kind()
    )
}

/// Build the Arrow array for column `idx` of `dataset`.
fn column_array(dataset: &Dataset, idx: usize) -> std::result::Result<ArrayRef, String> {
    let column = &dataset.columns()[idx];
    let cells = dataset.rows().iter().map(|r| r.cells[idx].as_ref());

    let array: ArrayRef = match column.kind {
        ValueKind::Timestamp => {
            let values = cells
                .map(|c| match c {
                    None => Ok(None),
                    Some(FieldValue::Timestamp(ts)) => Ok(Some(ts.timestamp_micros())),
                    Some(other) => Err(mismatch(column, other)),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Arc::new(TimestampMicrosecondArray::from(values).with_timezone(TIMESTAMP_TZ))
        }
        ValueKind::Date => {
            let values = cells
                .map(|c| match c {
                    None => Ok(None),
                    Some(FieldValue::Date(d)) => Ok(Some(d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)),
                    Some(other) => Err(mismatch(column, other)),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Arc::new(Date32Array::from(values))
        }
        ValueKind::Float => {
            let values = cells
                .map(|c| match c {
                    None => Ok(None),
                    Some(FieldValue::Float(f)) => Ok(Some(*f)),
                    Some(other) => Err(mismatch(column, other)),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Arc::new(Float64Array::from(values))
        }
        ValueKind::Boolean => {
            let values = cells
                .map(|c| match c {
                    None => Ok(None),
                    Some(FieldValue::Boolean(b)) => Ok(Some(*b)),
                    Some(other) => Err(mismatch(column, other)),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Arc::new(BooleanArray::from(values))
        }
        ValueKind::Text => {
            let values = cells
                .map(|c| match c {
                    None => Ok(None),
                    Some(FieldValue::Text(s)) => Ok(Some(s.as_str())),
                    Some(other) => Err(mismatch(column, other)),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Arc::new(StringArray::from(values))
        }
    };
    Ok(array)
}

/// Convert the dataset into a single RecordBatch.
pub fn to_record_batch(dataset: &Dataset) -> std::result::Result<RecordBatch, String> {
    let schema = build_arrow_schema(dataset.columns());

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(dataset.columns().len() + 1);
    let names: Vec<&str> = dataset.rows().iter().map(|r| r.incident_name.as_str()).collect();
    arrays.push(Arc::new(StringArray::from(names)));
    for idx in 0..dataset.columns().len() {
        arrays.push(column_array(dataset, idx)?);
    }

    RecordBatch::try_new(schema, arrays).map_err(|e| e.to_string())
}

/// Write `dataset` to `path` as one Parquet file, replacing any existing file.
///
/// Data goes to a hidden sibling first and is renamed into place once the
/// writer has closed, so a failure never leaves a partial artifact at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), rows = dataset.num_rows()))]
pub fn write_dataset<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<u64> {
    let path = path.as_ref();
    let batch = to_record_batch(dataset).map_err(|e| PipelineError::output(path, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset.parquet".to_string());
    let tmp_path: PathBuf = path.with_file_name(format!(".{file_name}.tmp"));

    let result = write_parquet_file(&batch, &tmp_path).and_then(|()| {
        fs::rename(&tmp_path, path).map_err(|e| PipelineError::io(path, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result?;

    let bytes = fs::metadata(path).map_err(|e| PipelineError::io(path, e))?.len();
    info!(bytes, columns = batch.num_columns(), "dataset written");
    Ok(bytes)
}

fn write_parquet_file(batch: &RecordBatch, output_path: &Path) -> Result<()> {
    let file = File::create(output_path).map_err(|e| PipelineError::io(output_path, e))?;

    let level = BrotliLevel::try_new(5).map_err(|e| PipelineError::output(output_path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(level))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| PipelineError::output(output_path, e))?;
    if batch.num_rows() > 0 {
        writer
            .write(batch)
            .map_err(|e| PipelineError::output(output_path, e))?;
    }
    writer
        .close()
        .map_err(|e| PipelineError::output(output_path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetRow;
    use crate::error::ErrorKind;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn overwrites_existing_artifact() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("all_incidents.parquet");
        fs::write(&path, b"stale bytes")?;

        let bytes = write_dataset(&Dataset::assemble(Vec::new()), &path)?;
        assert!(bytes > 0);
        assert_eq!(&fs::read(&path)?[..4], b"PAR1");
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn unwritable_location_is_io_error() {
        let err = write_dataset(
            &Dataset::assemble(Vec::new()),
            "/no/such/dir/all_incidents.parquet",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let ds = Dataset::from_parts(
            vec![Column {
                name: "lat".into(),
                kind: ValueKind::Float,
            }],
            vec![DatasetRow {
                incident_name: "Oak Fire".into(),
                cells: vec![Some(FieldValue::Text("north".into()))],
            }],
        );
        let err = to_record_batch(&ds).unwrap_err();
        assert!(err.contains("`lat`"));
    }
}
