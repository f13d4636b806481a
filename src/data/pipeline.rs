use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::clean::{clean, clean_grid};
use super::filter::filter_valid;
use super::loader::{load_file, load_series, LoadRequest};
use super::model::{Spectrogram, TimeSeries};
use super::products::{
    build_spectrogram, integrate_rows, observation_date_from_filename, observation_period,
};
use crate::config::VariableNames;

// ---------------------------------------------------------------------------
// Plasma parameters (BLK)
// ---------------------------------------------------------------------------

/// Density, temperature and speed, each cleaned and filtered on its own.
#[derive(Debug, Clone, Default)]
pub struct PlasmaParameters {
    pub density: TimeSeries,
    pub temperature: TimeSeries,
    pub velocity: TimeSeries,
    pub files_read: usize,
    pub warnings: Vec<String>,
}

pub fn plasma_parameters(
    paths: &[PathBuf],
    vars: &VariableNames,
    threshold: f64,
) -> PlasmaParameters {
    let request = LoadRequest::new(&vars.time)
        .column(&vars.density)
        .column(&vars.temperature)
        .column(&vars.velocity);
    let loaded = load_series(paths, &request);

    let series = |name: &str| filter_valid(&loaded.times, &clean(loaded.column(name), threshold));
    PlasmaParameters {
        density: series(&vars.density),
        temperature: series(&vars.temperature),
        velocity: series(&vars.velocity),
        files_read: loaded.files_read,
        warnings: loaded.warnings.clone(),
    }
}

// ---------------------------------------------------------------------------
// Integrated flux (TH2)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct IntegratedFlux {
    pub series: TimeSeries,
    /// First and last day of the loaded times.
    pub period: Option<(NaiveDate, NaiveDate)>,
    pub files_read: usize,
    pub warnings: Vec<String>,
}

pub fn integrated_flux(paths: &[PathBuf], vars: &VariableNames, threshold: f64) -> IntegratedFlux {
    let request = LoadRequest::new(&vars.time).grid(&vars.flux);
    let loaded = load_series(paths, &request);

    // Every contributing file has one flux row per timestamp.
    let totals = loaded
        .grid(&vars.flux)
        .map(|g| integrate_rows(&clean_grid(g, threshold)))
        .unwrap_or_default();

    IntegratedFlux {
        series: filter_valid(&loaded.times, &clean(&totals, threshold)),
        period: observation_period(&loaded.times),
        files_read: loaded.files_read,
        warnings: loaded.warnings,
    }
}

// ---------------------------------------------------------------------------
// Energy spectrogram (one TH2 file)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct EnergySpectrogram {
    pub spectrogram: Option<Spectrogram>,
    /// From the file name, else the first timestamp.
    pub date: Option<NaiveDate>,
    pub warnings: Vec<String>,
}

pub fn energy_spectrogram(path: &Path, vars: &VariableNames, threshold: f64) -> EnergySpectrogram {
    let request = LoadRequest::new(&vars.time)
        .grid_any_rows(&vars.energy)
        .grid_any_rows(&vars.flux);
    let loaded = load_file(path, &request);

    let spectrogram = match (loaded.grid(&vars.energy), loaded.grid(&vars.flux)) {
        (Some(energy), Some(flux)) => build_spectrogram(&loaded.times, energy, flux, threshold),
        _ => None,
    };
    let date = observation_date_from_filename(path)
        .or_else(|| loaded.times.first().map(|t| t.date()));

    EnergySpectrogram { spectrogram, date, warnings: loaded.warnings }
}
