use eframe::egui::{Color32, Ui, Vec2b};
use egui_plot::{GridMark, Line, Plot, PlotPoint, PlotPoints};

use crate::color;
use crate::data::model::{from_plot_seconds, TimeSeries};
use crate::data::pipeline::{IntegratedFlux, PlasmaParameters};

/// Tick label format for multi-day time axes.
pub const DAY_TIME_FORMAT: &str = "%m-%d %H:%M";

/// Format a plot x coordinate (Unix seconds) as a UTC time label.
pub fn format_time(seconds: f64, fmt: &str) -> String {
    from_plot_seconds(seconds)
        .map(|t| t.format(fmt).to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Plasma parameters: three stacked plots with a shared time axis
// ---------------------------------------------------------------------------

pub fn plasma_parameters(ui: &mut Ui, plasma: &PlasmaParameters) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("SWIS BLK – Plasma Parameters vs Time");
    });

    let panels = [
        ("Proton Number Density", "Density (cm⁻³)", &plasma.density, color::DENSITY),
        ("Proton Thermal Temperature", "Temperature (eV)", &plasma.temperature, color::TEMPERATURE),
        ("Proton Bulk Velocity", "Velocity (km/s)", &plasma.velocity, color::VELOCITY),
    ];
    let spacing = ui.spacing().item_spacing.y;
    let height = ((ui.available_height() - 3.0 * (spacing + 18.0)) / 3.0).max(80.0);

    let n_panels = panels.len();
    for (i, (title, y_label, series, color)) in panels.into_iter().enumerate() {
        let last = i + 1 == n_panels;
        ui.label(title);
        time_series_plot(title, y_label, series)
            .height(height)
            .link_axis("plasma_time", Vec2b::new(true, false))
            .link_cursor("plasma_time", Vec2b::new(true, false))
            .x_axis_label(if last { "Time (UTC)" } else { "" })
            .show(ui, |plot_ui| draw_series(plot_ui, title, series, color, 1.5));
    }
}

// ---------------------------------------------------------------------------
// Integrated flux
// ---------------------------------------------------------------------------

pub fn integrated_flux(ui: &mut Ui, flux: &IntegratedFlux, y_max: f64) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("SWIS TH2 – Integrated Ion Flux vs Time");
        if let Some((start, end)) = flux.period {
            ui.label(format!(
                "Observation Period: {} to {}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ));
        }
    });

    let name = "Integrated flux";
    time_series_plot(name, "Integrated Flux [particles/cm²/s/sr]", &flux.series)
        .x_axis_label("Time (UTC)")
        .include_y(0.0)
        .include_y(y_max)
        .show(ui, |plot_ui| {
            draw_series(plot_ui, name, &flux.series, color::INTEGRATED_FLUX, 1.3)
        });
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A time-axis plot; an empty series gets a unit y range so the note has room.
fn time_series_plot(id: &str, y_label: &str, series: &TimeSeries) -> Plot<'static> {
    let mut plot = Plot::new(id)
        .y_axis_label(y_label)
        .x_axis_formatter(|mark: GridMark, _range| format_time(mark.value, DAY_TIME_FORMAT))
        .label_formatter(|name, value: &PlotPoint| {
            let t = format_time(value.x, "%Y-%m-%d %H:%M:%S");
            if name.is_empty() {
                format!("{t}\n{:.4}", value.y)
            } else {
                format!("{name}\n{t}\n{:.4}", value.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if series.is_empty() {
        plot = plot.show_background(true).include_y(0.0).include_y(1.0);
    }
    plot
}

fn draw_series(
    plot_ui: &mut egui_plot::PlotUi,
    name: &str,
    series: &TimeSeries,
    color: Color32,
    width: f32,
) {
    if series.is_empty() {
        let center = plot_ui.plot_bounds().center();
        plot_ui.text(egui_plot::Text::new(center, "no valid samples").color(Color32::GRAY));
        return;
    }
    let points: PlotPoints = series.plot_points().into();
    plot_ui.line(Line::new(points).name(name).color(color).width(width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_labels_are_utc() {
        // 2025-05-22T06:30:00Z
        assert_eq!(format_time(1_747_895_400.0, DAY_TIME_FORMAT), "05-22 06:30");
        assert_eq!(format_time(1_747_895_400.0, "%H:%M"), "06:30");
        assert_eq!(format_time(f64::NAN, "%H:%M"), "");
    }
}
