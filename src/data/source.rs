use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, FixedSizeListArray, Float32Array, Float64Array, LargeListArray, ListArray,
};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::cdf::{epoch, CdfFile};
use super::model::{Grid, Timestamp};

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// A file the loader can pull named variables out of.
pub trait Source {
    /// The named epoch variable as calendar time.
    fn times(&self, name: &str) -> Result<Vec<Timestamp>>;

    /// A variable holding one value per record.
    fn column(&self, name: &str) -> Result<Vec<f64>>;

    /// A variable holding a vector per record (one grid row per record).
    fn grid(&self, name: &str) -> Result<Grid>;
}

/// Open a source by extension.
///
/// Supported formats:
/// * `.cdf`          – Common Data Format, read natively
/// * `.parquet`/`.pq` – tabular export, one column per variable
pub fn open_source(path: &Path) -> Result<Box<dyn Source>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "cdf" => {
            let cdf = CdfFile::open(path).context("opening CDF file")?;
            let (version, release) = cdf.version();
            log::debug!(
                "{}: CDF {version}.{release}, {:?}, variables {:?}",
                path.display(),
                cdf.encoding(),
                cdf.variable_names().collect::<Vec<_>>()
            );
            Ok(Box::new(cdf))
        }
        "parquet" | "pq" => Ok(Box::new(ParquetSource::open(path)?)),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CDF
// ---------------------------------------------------------------------------

impl Source for CdfFile {
    fn times(&self, name: &str) -> Result<Vec<Timestamp>> {
        Ok(self.variable(name)?.to_datetimes()?)
    }

    fn column(&self, name: &str) -> Result<Vec<f64>> {
        let var = self.variable(name)?;
        if var.record_len() != 1 {
            bail!("'{name}' has {} values per record, expected 1", var.record_len());
        }
        Ok(var.as_real()?.to_vec())
    }

    fn grid(&self, name: &str) -> Result<Grid> {
        let var = self.variable(name)?;
        let values = var.as_real()?.to_vec();
        Grid::new(var.num_records, var.record_len(), values)
            .with_context(|| format!("'{name}' does not fill whole records"))
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// A Parquet export of the instrument variables.
///
/// Expected schema:
/// - time column: `Timestamp(_)`, `Int64` (TT2000 nanoseconds) or
///   `Float64` (CDF_EPOCH milliseconds)
/// - scalar variables: any numeric column
/// - per-record vectors: `List`, `LargeList` or `FixedSizeList` of floats
pub struct ParquetSource {
    batch: RecordBatch,
}

impl ParquetSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).context("opening parquet file")?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
        let schema = builder.schema().clone();
        let reader = builder.build().context("building parquet reader")?;
        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("reading parquet record batch")?;
        let batch = concat_batches(&schema, &batches).context("joining record batches")?;
        Ok(ParquetSource { batch })
    }

    fn array(&self, name: &str) -> Result<&Arc<dyn Array>> {
        self.batch
            .column_by_name(name)
            .with_context(|| format!("Parquet file missing '{name}' column"))
    }
}

impl Source for ParquetSource {
    fn times(&self, name: &str) -> Result<Vec<Timestamp>> {
        let col = self.array(name)?;
        let converted: Option<Vec<Timestamp>> = match col.data_type() {
            DataType::Timestamp(_, _) => {
                let nanos = cast(col, &DataType::Timestamp(TimeUnit::Nanosecond, None))?;
                let nanos = cast(&nanos, &DataType::Int64)?;
                nanos
                    .as_primitive::<Int64Type>()
                    .iter()
                    .map(|v| {
                        let ns = v?;
                        DateTime::from_timestamp(
                            ns.div_euclid(1_000_000_000),
                            ns.rem_euclid(1_000_000_000) as u32,
                        )
                        .map(|dt| dt.naive_utc())
                    })
                    .collect()
            }
            DataType::Int64 => col
                .as_primitive::<Int64Type>()
                .iter()
                .map(|v| epoch::tt2000_to_datetime(v?))
                .collect(),
            DataType::Float64 => col
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| epoch::epoch_to_datetime(v?))
                .collect(),
            other => bail!("'{name}' has type {other:?}, expected a timestamp"),
        };
        converted.with_context(|| format!("'{name}' holds null or out-of-range times"))
    }

    fn column(&self, name: &str) -> Result<Vec<f64>> {
        let col = self.array(name)?;
        let as_f64 = cast(col, &DataType::Float64)
            .with_context(|| format!("'{name}' is not numeric"))?;
        Ok(as_f64
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    fn grid(&self, name: &str) -> Result<Grid> {
        let col = self.array(name)?;
        let rows = col.len();
        let mut values = Vec::new();
        let mut cols = None;
        for row in 0..rows {
            let list = extract_f64_list(col, row)
                .with_context(|| format!("Row {row}: failed to read '{name}'"))?;
            match cols {
                None => cols = Some(list.len()),
                Some(n) if n != list.len() => {
                    bail!("Row {row}: '{name}' has {} values, earlier rows {n}", list.len())
                }
                Some(_) => {}
            }
            values.extend(list);
        }
        Grid::new(rows, cols.unwrap_or(0), values).context("ragged list column")
    }
}

/// Extract a `Vec<f64>` from a list column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        DataType::FixedSizeList(_, _) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<FixedSizeListArray>()
                .context("expected FixedSizeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected a list column, got {other:?}"),
    };

    // The inner array can be Float64 or Float32
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = open_source(Path::new("swis_day1.txt")).err().unwrap();
        assert!(format!("{err:#}").contains("Unsupported file extension: .txt"));
    }

    #[test]
    fn missing_cdf_reports_io_error() {
        let err = open_source(Path::new("/nonexistent/swis_day1.cdf")).err().unwrap();
        assert!(format!("{err:#}").starts_with("opening CDF file"));
    }
}
