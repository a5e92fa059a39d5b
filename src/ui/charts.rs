use std::f32::consts::{FRAC_PI_2, TAU};
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, Pos2, RichText, Sense, Shape, Stroke, Ui};
use egui_plot::{Bar, BarChart, GridMark, Plot};

use volumen_dashboard::data::aggregate::{Granularity, Share};
use volumen_dashboard::data::normalize::format_volume;

use crate::color::accent;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;

/// Axis formatter that prints `labels[i]` at integer position `i` and
/// nothing in between.
fn label_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let rounded = mark.value.round();
        if (mark.value - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Chart 1: volume over time
// ---------------------------------------------------------------------------

pub fn volume_chart(ui: &mut Ui, state: &AppState) {
    let series = &state.report.time_series;
    let suffix = match state.granularity {
        Granularity::Daily => "per day",
        Granularity::Monthly => "per month",
    };
    ui.strong(format!("Volume {suffix}"));

    let color = accent(state.config.palette);
    let bars: Vec<Bar> = series
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            Bar::new(i as f64, bucket.volume)
                .name(&bucket.label)
                .fill(color)
        })
        .collect();
    let labels: Vec<String> = series.iter().map(|b| b.label.clone()).collect();

    Plot::new("volume_over_time")
        .height(CHART_HEIGHT)
        .x_axis_formatter(label_formatter(labels))
        .y_axis_label("VOLUMEN")
        .allow_drag(true)
        .allow_zoom(true)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color).width(0.8));
        });
}

// ---------------------------------------------------------------------------
// Chart 2: sector shares
// ---------------------------------------------------------------------------

/// Fill one pie slice. egui only tessellates convex polygons, so the slice
/// is drawn as wedges of at most a quarter turn.
fn draw_slice(painter: &egui::Painter, center: Pos2, radius: f32, start: f32, sweep: f32, color: Color32) {
    const SEGMENTS: usize = 16;
    let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / pieces as f32;

    for p in 0..pieces {
        let a0 = start + step * p as f32;
        let mut points = Vec::with_capacity(SEGMENTS + 2);
        points.push(center);
        for s in 0..=SEGMENTS {
            let a = a0 + step * s as f32 / SEGMENTS as f32;
            points.push(center + radius * egui::vec2(a.cos(), a.sin()));
        }
        painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
    }
}

pub fn sector_pie(ui: &mut Ui, state: &AppState) {
    ui.strong("Share by sector (volume)");

    let shares: Vec<&Share> = state
        .report
        .sector_shares
        .iter()
        .filter(|s| s.percent > 0.0)
        .collect();
    if shares.is_empty() {
        ui.label("No positive volume to distribute.");
        return;
    }

    let color_of = |category: &str| {
        state
            .sector_colors
            .as_ref()
            .map_or(Color32::GRAY, |cm| cm.color_for(category))
    };

    ui.horizontal(|ui: &mut Ui| {
        let side = CHART_HEIGHT.min(ui.available_width() * 0.6);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(side, side), Sense::hover());
        let painter = ui.painter_at(rect);
        let radius = side / 2.0 - 4.0;

        // Start at twelve o'clock, clockwise.
        let mut angle = -FRAC_PI_2;
        for share in &shares {
            let sweep = (share.percent / 100.0) as f32 * TAU;
            draw_slice(&painter, rect.center(), radius, angle, sweep, color_of(&share.category));
            angle += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for share in &shares {
                ui.horizontal(|ui: &mut Ui| {
                    let (swatch, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), Sense::hover());
                    ui.painter().rect_filled(swatch, 2.0, color_of(&share.category));
                    let name = if share.category.is_empty() { "(blank)" } else { share.category.as_str() };
                    ui.label(format!("{name}  {:.1}%", share.percent))
                        .on_hover_text(format_volume(share.volume));
                });
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Chart 3: department ranking
// ---------------------------------------------------------------------------

/// Horizontal bars, smallest at the bottom, largest at the top.
pub fn department_ranking(ui: &mut Ui, state: &AppState) {
    ui.strong("Volume by department");

    let ranking = &state.report.department_ranking;
    let color = accent(state.config.palette);
    let bars: Vec<Bar> = ranking
        .iter()
        .enumerate()
        .map(|(i, total)| {
            Bar::new(i as f64, total.volume)
                .name(&total.category)
                .fill(color)
        })
        .collect();
    let labels: Vec<String> = ranking.iter().map(|t| t.category.clone()).collect();

    // Room for every department label.
    let height = (ranking.len() as f32 * 24.0).clamp(160.0, 640.0);

    Plot::new("department_ranking")
        .height(height)
        .y_axis_formatter(label_formatter(labels))
        .x_axis_label("VOLUMEN")
        .allow_drag(true)
        .allow_zoom(true)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color).width(0.7).horizontal());
        });
}

/// Shown instead of the charts when the filter matches nothing.
pub fn no_data(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.label(RichText::new("No data for the selected filters.").italics());
    });
}
