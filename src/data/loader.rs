use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};

use super::model::{Grid, Timestamp};
use super::source::open_source;

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Variables to pull out of every input file.
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    /// Epoch variable giving one timestamp per record.
    pub time: String,
    /// Variables with one value per record.
    pub columns: Vec<String>,
    /// Variables with a vector per record.
    pub grids: Vec<GridRequest>,
}

/// One 2-D variable to load.
#[derive(Debug, Clone)]
pub struct GridRequest {
    pub name: String,
    /// Rows must match the file's timestamps one to one.
    pub per_record: bool,
}

impl LoadRequest {
    pub fn new(time: &str) -> Self {
        LoadRequest { time: time.to_string(), ..Default::default() }
    }

    pub fn column(mut self, name: &str) -> Self {
        self.columns.push(name.to_string());
        self
    }

    /// A grid with one row per timestamp; files where the counts differ are skipped.
    pub fn grid(mut self, name: &str) -> Self {
        self.grids.push(GridRequest { name: name.to_string(), per_record: true });
        self
    }

    /// A grid whose row count is not tied to the timestamps, such as a
    /// non-record-varying energy table.
    pub fn grid_any_rows(mut self, name: &str) -> Self {
        self.grids.push(GridRequest { name: name.to_string(), per_record: false });
        self
    }
}

/// Everything read from a file list, concatenated in list order.
#[derive(Debug, Clone, Default)]
pub struct LoadedSeries {
    pub times: Vec<Timestamp>,
    pub columns: BTreeMap<String, Vec<f64>>,
    pub grids: BTreeMap<String, Grid>,
    /// One `could not read <path>: <error>` line per skipped file.
    pub warnings: Vec<String>,
    pub files_read: usize,
}

impl LoadedSeries {
    /// Accumulated values of a column; empty if no file contributed.
    pub fn column(&self, name: &str) -> &[f64] {
        self.columns.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn grid(&self, name: &str) -> Option<&Grid> {
        self.grids.get(name)
    }

    /// Append one file's contribution. Nothing is appended on error.
    fn extend(&mut self, part: LoadedSeries) -> Result<()> {
        for (name, grid) in &part.grids {
            if let Some(existing) = self.grids.get(name) {
                if !existing.can_append(grid) {
                    bail!(
                        "'{name}' has {} values per record, earlier files {}",
                        grid.cols,
                        existing.cols
                    );
                }
            }
        }
        self.times.extend(part.times);
        for (name, values) in part.columns {
            self.columns.entry(name).or_default().extend(values);
        }
        for (name, grid) in part.grids {
            match self.grids.get_mut(&name) {
                Some(existing) => existing.append(grid),
                None => {
                    self.grids.insert(name, grid);
                }
            }
        }
        self.files_read += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read `request` from every file in order and concatenate the results.
///
/// A file that cannot be opened, lacks a requested variable or has
/// mismatched lengths is skipped as a whole; a warning is logged and kept
/// in [`LoadedSeries::warnings`], and the remaining files are still read.
/// Samples are neither sorted nor de-duplicated.
pub fn load_series<P: AsRef<Path>>(paths: &[P], request: &LoadRequest) -> LoadedSeries {
    let mut out = LoadedSeries::default();
    for name in &request.columns {
        out.columns.entry(name.clone()).or_default();
    }

    for path in paths {
        let path = path.as_ref();
        let result = read_file(path, request).and_then(|part| out.extend(part));
        match result {
            Ok(()) => log::info!("Loaded {}", path.display()),
            Err(e) => {
                let message = format!("could not read {}: {e:#}", path.display());
                log::warn!("{message}");
                out.warnings.push(message);
            }
        }
    }
    out
}

/// Convenience for a single file (the spectrogram case).
pub fn load_file(path: &Path, request: &LoadRequest) -> LoadedSeries {
    load_series(&[path], request)
}

// The source (and with it any file handle) is dropped on return.
fn read_file(path: &Path, request: &LoadRequest) -> Result<LoadedSeries> {
    let source = open_source(path)?;
    let times = source.times(&request.time)?;

    let mut part = LoadedSeries { times, ..Default::default() };
    for name in &request.columns {
        let values = source.column(name)?;
        if values.len() != part.times.len() {
            bail!(
                "'{name}' has {} records but '{}' has {}",
                values.len(),
                request.time,
                part.times.len()
            );
        }
        part.columns.insert(name.clone(), values);
    }
    for GridRequest { name, per_record } in &request.grids {
        let grid = source.grid(name)?;
        if *per_record && grid.rows != part.times.len() {
            bail!(
                "'{name}' has {} records but '{}' has {}",
                grid.rows,
                request.time,
                part.times.len()
            );
        }
        part.grids.insert(name.clone(), grid);
    }
    Ok(part)
}
