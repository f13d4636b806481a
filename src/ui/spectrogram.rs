use eframe::egui::{
    self, Align2, Color32, ColorImage, FontId, Rect, Sense, TextureOptions, Ui, Vec2,
};
use egui_plot::{GridMark, Plot, PlotImage, PlotPoint};

use crate::color::ColorMap;
use crate::data::model::{plot_seconds, Spectrogram};
use crate::state::AppState;
use crate::ui::plot::format_time;

const COLOR_BAR_WIDTH: f32 = 18.0;
const COLOR_BAR_STEPS: usize = 64;

// ---------------------------------------------------------------------------
// Image layout
// ---------------------------------------------------------------------------

/// Axis extent of the image in plot coordinates: `(x0, x1, y0, y1)` from the
/// first and last timestamp and energy bin.
pub fn extent(s: &Spectrogram) -> Option<(f64, f64, f64, f64)> {
    let t0 = plot_seconds(s.times.first()?);
    let t1 = plot_seconds(s.times.last()?);
    let e0 = *s.energies.first()?;
    let e1 = *s.energies.last()?;
    Some((t0, t1, e0, e1))
}

/// Pixel size and RGBA bytes for the spectrogram, origin at the lower left.
///
/// Image rows run top-down, so the highest energy goes first. A descending
/// axis is flipped so the image always grows up and to the right.
pub fn spectrogram_pixels(s: &Spectrogram, cmap: &ColorMap) -> ([usize; 2], Vec<u8>) {
    let rows = s.grid.rows;
    let cols = s.grid.cols;
    let energy_descends = matches!(
        (s.energies.first(), s.energies.last()),
        (Some(a), Some(b)) if b < a
    );
    let time_descends = matches!(
        (s.times.first(), s.times.last()),
        (Some(a), Some(b)) if b < a
    );

    let mut rgba = Vec::with_capacity(rows * cols * 4);
    for py in 0..rows {
        let r = if energy_descends { py } else { rows - 1 - py };
        for px in 0..cols {
            let c = if time_descends { cols - 1 - px } else { px };
            rgba.extend_from_slice(&cmap.color_for(s.grid.get(r, c)).to_srgba_unmultiplied());
        }
    }
    ([cols, rows], rgba)
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

pub fn energy_spectrogram(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("Log-scaled Flux Spectrogram from TH2");
        if let Some(date) = state.spectrogram.date {
            ui.label(format!("Date: {}", date.format("%Y-%m-%d")));
        }
    });

    let (Some(s), Some(cmap)) = (&state.spectrogram.spectrogram, &state.color_map) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No spectrogram data");
        });
        return;
    };
    let Some((x0, x1, y0, y1)) = extent(s) else {
        ui.label("No spectrogram data");
        return;
    };

    let texture = state.spectrogram_texture.get_or_insert_with(|| {
        let (size, rgba) = spectrogram_pixels(s, cmap);
        log::debug!("Uploading {}×{} spectrogram texture", size[0], size[1]);
        ui.ctx().load_texture(
            "spectrogram",
            ColorImage::from_rgba_unmultiplied(size, &rgba),
            TextureOptions::NEAREST,
        )
    });

    let center = PlotPoint::new((x0 + x1) / 2.0, (y0 + y1) / 2.0);
    let size = Vec2::new(span(x0, x1) as f32, span(y0, y1) as f32);
    let image = PlotImage::new(texture.id(), center, size);

    ui.horizontal(|ui: &mut Ui| {
        let plot_width = (ui.available_width() - COLOR_BAR_WIDTH - 70.0).max(100.0);
        Plot::new("spectrogram")
            .width(plot_width)
            .height(ui.available_height())
            .x_axis_label("Time (UTC)")
            .y_axis_label("Energy (keV)")
            .x_axis_formatter(|mark: GridMark, _range| format_time(mark.value, "%H:%M"))
            .label_formatter(|_name, value: &PlotPoint| {
                format!("{}\n{:.2} keV", format_time(value.x, "%H:%M:%S"), value.y)
            })
            .show_grid(false)
            .show(ui, |plot_ui| plot_ui.image(image));

        color_bar(ui, cmap);
    });
}

/// Plot extent for one axis; a single sample still gets unit width.
fn span(a: f64, b: f64) -> f64 {
    let d = (b - a).abs();
    if d > 0.0 { d } else { 1.0 }
}

/// Vertical gradient with min/max labels.
fn color_bar(ui: &mut Ui, cmap: &ColorMap) {
    let height = (ui.available_height() - 40.0).max(60.0);
    let (rect, _) =
        ui.allocate_exact_size(Vec2::new(COLOR_BAR_WIDTH + 60.0, height), Sense::hover());
    let bar = Rect::from_min_size(
        rect.min + Vec2::new(0.0, 12.0),
        Vec2::new(COLOR_BAR_WIDTH, height - 24.0),
    );
    let painter = ui.painter();

    let step = bar.height() / COLOR_BAR_STEPS as f32;
    for i in 0..COLOR_BAR_STEPS {
        let t = 1.0 - (i as f64 + 0.5) / COLOR_BAR_STEPS as f64;
        let slice = Rect::from_min_size(
            bar.min + Vec2::new(0.0, i as f32 * step),
            Vec2::new(bar.width(), step + 0.5),
        );
        painter.rect_filled(slice, 0.0, cmap.color_at(t));
    }

    let text_color = ui.visuals().text_color();
    let font = FontId::proportional(11.0);
    let (lo, hi) = cmap.range();
    painter.text(
        bar.right_top() + Vec2::new(4.0, 0.0),
        Align2::LEFT_CENTER,
        format!("{hi:.1}"),
        font.clone(),
        text_color,
    );
    painter.text(
        bar.right_bottom() + Vec2::new(4.0, 0.0),
        Align2::LEFT_CENTER,
        format!("{lo:.1}"),
        font.clone(),
        text_color,
    );
    painter.text(
        bar.center_top() - Vec2::new(0.0, 2.0),
        Align2::CENTER_BOTTOM,
        "log₁₀(Flux)",
        font,
        text_color,
    );
    painter.rect_stroke(
        bar,
        0.0,
        egui::Stroke::new(1.0, Color32::GRAY),
        egui::StrokeKind::Outside,
    );
}
