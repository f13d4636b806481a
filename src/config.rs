use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::clean::FILL_THRESHOLD;

/// Optional override file, looked up in the working directory.
pub const CONFIG_FILE: &str = "swis-plot.json";

// ---------------------------------------------------------------------------
// Variable names
// ---------------------------------------------------------------------------

/// Names of the variables read from the SWIS files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableNames {
    pub time: String,
    pub density: String,
    pub temperature: String,
    pub velocity: String,
    pub energy: String,
    pub flux: String,
}

impl Default for VariableNames {
    fn default() -> Self {
        Self {
            time: "epoch_for_cdf_mod".into(),
            density: "proton_density".into(),
            temperature: "proton_thermal".into(),
            velocity: "proton_bulk_speed".into(),
            energy: "energy_center_mod".into(),
            flux: "integrated_flux_mod".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Which files to read and how to treat their values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// BLK files for the plasma parameter view, in plotting order.
    pub blk_files: Vec<PathBuf>,
    /// TH2 files for the integrated flux view, in plotting order.
    pub th2_files: Vec<PathBuf>,
    /// Single TH2 file for the spectrogram view.
    pub spectrogram_file: PathBuf,
    pub variables: VariableNames,
    /// Samples with a larger magnitude are fill values.
    pub fill_threshold: f64,
    /// Upper y limit of the integrated flux plot.
    pub flux_y_max: f64,
}

impl Default for Config {
    fn default() -> Self {
        let days = ["20250522", "20250523", "20250524"];
        Self {
            blk_files: days.iter().map(|d| sample_path("BLK", d)).collect(),
            th2_files: days.iter().map(|d| sample_path("TH2", d)).collect(),
            spectrogram_file: sample_path("TH2", days[0]),
            variables: VariableNames::default(),
            fill_threshold: FILL_THRESHOLD,
            flux_y_max: 3e9,
        }
    }
}

/// Where `generate_sample` writes the file for one product and day.
pub fn sample_path(product: &str, day: &str) -> PathBuf {
    PathBuf::from("data").join(format!("AL1_ASW91_L2_{product}_{day}_UNP_9999_999999_V02.cdf"))
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).context("reading config file")?;
        serde_json::from_str(&text).context("parsing config JSON")
    }

    /// The override file if present and valid, else the built-in defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No {} found, using built-in file list", path.display());
            return Self::default();
        }
        match Self::from_json_file(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Ignoring {}: {e:#}", path.display());
                Self::default()
            }
        }
    }
}
