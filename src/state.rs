use eframe::egui::TextureHandle;

use crate::color::ColorMap;
use crate::config::Config;
use crate::data::pipeline::{
    energy_spectrogram, integrated_flux, plasma_parameters, EnergySpectrogram, IntegratedFlux,
    PlasmaParameters,
};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    PlasmaParameters,
    IntegratedFlux,
    EnergySpectrogram,
}

impl View {
    pub const ALL: [View; 3] =
        [View::PlasmaParameters, View::IntegratedFlux, View::EnergySpectrogram];

    pub fn label(self) -> &'static str {
        match self {
            View::PlasmaParameters => "Plasma Parameters",
            View::IntegratedFlux => "Integrated Flux",
            View::EnergySpectrogram => "Energy Spectrogram",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything the viewer draws, prepared once at start-up.
pub struct AppState {
    pub view: View,

    pub plasma: PlasmaParameters,
    pub flux: IntegratedFlux,
    pub spectrogram: EnergySpectrogram,

    /// Colour map over the spectrogram's finite value range.
    pub color_map: Option<ColorMap>,

    /// Spectrogram image, uploaded on first draw.
    pub spectrogram_texture: Option<TextureHandle>,

    /// Fixed y limit of the integrated flux plot.
    pub flux_y_max: f64,
}

impl AppState {
    /// Run every pipeline against the configured files.
    pub fn prepare(config: &Config) -> Self {
        let vars = &config.variables;
        let threshold = config.fill_threshold;

        let plasma = plasma_parameters(&config.blk_files, vars, threshold);
        log::info!(
            "Plasma parameters: {} density, {} temperature, {} velocity samples from {} files",
            plasma.density.len(),
            plasma.temperature.len(),
            plasma.velocity.len(),
            plasma.files_read
        );

        let flux = integrated_flux(&config.th2_files, vars, threshold);
        log::info!(
            "Integrated flux: {} samples from {} files",
            flux.series.len(),
            flux.files_read
        );

        let spectrogram = energy_spectrogram(&config.spectrogram_file, vars, threshold);
        let color_map = spectrogram
            .spectrogram
            .as_ref()
            .and_then(|s| s.value_range())
            .map(|(lo, hi)| ColorMap::inferno(lo, hi));

        Self {
            view: View::default(),
            plasma,
            flux,
            spectrogram,
            color_map,
            spectrogram_texture: None,
            flux_y_max: config.flux_y_max,
        }
    }

    /// Warnings from every view, in load order.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.plasma
            .warnings
            .iter()
            .chain(&self.flux.warnings)
            .chain(&self.spectrogram.warnings)
            .map(String::as_str)
    }
}
