use std::path::Path;

use eframe::egui;
use swis_plot::app::SwisPlotApp;
use swis_plot::config::{Config, CONFIG_FILE};
use swis_plot::state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = Config::load_or_default(Path::new(CONFIG_FILE));
    let state = AppState::prepare(&config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SWIS Plot – Plasma Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(SwisPlotApp::new(state)))),
    )
}
