use eframe::egui;

use crate::state::{AppState, View};
use crate::ui::{panels, plot, spectrogram};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SwisPlotApp {
    pub state: AppState,
}

impl SwisPlotApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for SwisPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: view selector ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: unreadable files ----
        if self.state.warnings().next().is_some() {
            egui::TopBottomPanel::bottom("warnings")
                .resizable(true)
                .show(ctx, |ui| {
                    panels::warnings_panel(ui, &self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            View::PlasmaParameters => plot::plasma_parameters(ui, &self.state.plasma),
            View::IntegratedFlux => {
                plot::integrated_flux(ui, &self.state.flux, self.state.flux_y_max)
            }
            View::EnergySpectrogram => spectrogram::energy_spectrogram(ui, &mut self.state),
        });
    }
}
