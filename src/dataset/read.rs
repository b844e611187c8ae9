// src/dataset/read.rs

use arrow::{
    array::{Array, BooleanArray, Date32Array, Float64Array, StringArray, TimestampMicrosecondArray},
    record_batch::RecordBatch,
};
use chrono::{DateTime, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};
use tracing::{debug, instrument};

use crate::dataset::{write::EPOCH_DAYS_FROM_CE, Column, Dataset, DatasetRow, INCIDENT_NAME};
use crate::error::{PipelineError, Result};
use crate::process::record::{FieldValue, ValueKind};
use crate::schema::map_from_arrow_type;

fn downcast<'a, T: 'static>(batch: &'a RecordBatch, idx: usize) -> std::result::Result<&'a T, String> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| format!("column {idx} has unexpected array type"))
}

fn cell(batch: &RecordBatch, idx: usize, kind: ValueKind, row: usize) -> std::result::Result<Option<FieldValue>, String> {
    if batch.column(idx).is_null(row) {
        return Ok(None);
    }
    let value = match kind {
        ValueKind::Timestamp => {
            let micros = downcast::<TimestampMicrosecondArray>(batch, idx)?.value(row);
            let ts = DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| format!("timestamp {micros} out of range"))?;
            FieldValue::Timestamp(ts)
        }
        ValueKind::Date => {
            let days = downcast::<Date32Array>(batch, idx)?.value(row);
            let date = NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
                .ok_or_else(|| format!("date {days} out of range"))?;
            FieldValue::Date(date)
        }
        ValueKind::Float => FieldValue::Float(downcast::<Float64Array>(batch, idx)?.value(row)),
        ValueKind::Boolean => FieldValue::Boolean(downcast::<BooleanArray>(batch, idx)?.value(row)),
        ValueKind::Text => FieldValue::Text(downcast::<StringArray>(batch, idx)?.value(row).to_string()),
    };
    Ok(Some(value))
}

/// Read a dataset previously written by `write_dataset`.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| PipelineError::output(path, e))?;

    // 1) schema → columns
    let schema = builder.schema().clone();
    let mut fields = schema.fields().iter();
    match fields.next() {
        Some(f) if f.name() == INCIDENT_NAME => {}
        _ => return Err(PipelineError::output(path, "first column is not incident_name")),
    }
    let columns = fields
        .map(|f| {
            map_from_arrow_type(f.data_type())
                .map(|kind| Column {
                    name: f.name().clone(),
                    kind,
                })
                .ok_or_else(|| {
                    PipelineError::output(path, format!("column `{}` has unsupported type {}", f.name(), f.data_type()))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    // 2) batches → rows
    let reader = builder.build().map_err(|e| PipelineError::output(path, e))?;
    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| PipelineError::output(path, e))?;
        let names = downcast::<StringArray>(&batch, 0).map_err(|e| PipelineError::output(path, e))?;
        for row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .enumerate()
                .map(|(i, col)| cell(&batch, i + 1, col.kind, row))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| PipelineError::output(path, e))?;
            rows.push(DatasetRow {
                incident_name: names.value(row).to_string(),
                cells,
            });
        }
    }

    debug!(rows = rows.len(), columns = columns.len(), "dataset read");
    Ok(Dataset::from_parts(columns, rows))
}
