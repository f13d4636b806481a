use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the view selector and load summary.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        for view in View::ALL {
            ui.selectable_value(&mut state.view, view, view.label());
        }

        ui.separator();

        let summary = match state.view {
            View::PlasmaParameters => format!("{} BLK files loaded", state.plasma.files_read),
            View::IntegratedFlux => format!("{} TH2 files loaded", state.flux.files_read),
            View::EnergySpectrogram => match &state.spectrogram.spectrogram {
                Some(s) => format!(
                    "{} timestamps × {} energy bins",
                    s.times.len(),
                    s.energies.len()
                ),
                None => "no spectrogram".to_string(),
            },
        };
        ui.label(summary);

        let n_warnings = state.warnings().count();
        if n_warnings > 0 {
            ui.separator();
            ui.label(RichText::new(format!("{n_warnings} file(s) skipped")).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// List every `could not read …` line.
pub fn warnings_panel(ui: &mut Ui, state: &AppState) {
    ui.strong("Warnings");
    ScrollArea::vertical()
        .max_height(120.0)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            for line in state.warnings() {
                ui.label(RichText::new(format!("⚠ {line}")).color(Color32::RED));
            }
        });
}
