use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use volumen_dashboard::data::aggregate::Granularity;
use volumen_dashboard::data::model::{CategoryColumn, Dataset};
use volumen_dashboard::data::normalize::format_volume;
use volumen_dashboard::data::period::RelativePeriod;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Filters: period, granularity, product, department
// ---------------------------------------------------------------------------

/// Period and category filters. Every change re-runs the report.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // Own a handle to the dataset; the widgets below mutate `state`.
    let Some(dataset) = state.dataset.clone() else {
        ui.label("Open a volume source to start.");
        return;
    };
    if dataset.is_empty() {
        ui.label("The source has no rows left after normalization.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            time_filters(ui, state);
            ui.separator();
            category_filter(ui, state, &dataset, CategoryColumn::Product, "2. Product");
            category_filter(ui, state, &dataset, CategoryColumn::Department, "3. Department");
        });
}

fn time_filters(ui: &mut Ui, state: &mut AppState) {
    ui.strong("1. Analysis period");

    let mut period = state.period;
    egui::ComboBox::from_id_salt("period")
        .selected_text(period.label())
        .show_ui(ui, |ui: &mut Ui| {
            for p in RelativePeriod::ALL {
                ui.selectable_value(&mut period, p, p.label());
            }
        });
    if period != state.period {
        state.set_period(period);
    }

    let mut start = state.filter.start_date();
    let mut end = state.filter.end_date();
    egui::Grid::new("date_bounds")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("From");
            ui.add(DatePickerButton::new(&mut start).id_salt("start_date"));
            ui.end_row();
            ui.label("To");
            ui.add(DatePickerButton::new(&mut end).id_salt("end_date"));
            ui.end_row();
        });
    if start != state.filter.start_date() {
        state.set_start_date(start);
    } else if end != state.filter.end_date() {
        state.set_end_date(end);
    }

    ui.add_space(4.0);
    let mut granularity = state.granularity;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Granularity");
        ui.radio_value(&mut granularity, Granularity::Daily, "Daily");
        ui.radio_value(&mut granularity, Granularity::Monthly, "Monthly");
    });
    if granularity != state.granularity {
        state.set_granularity(granularity);
    }
}

/// Collapsible multi-select for one categorical column.
fn category_filter(
    ui: &mut Ui,
    state: &mut AppState,
    dataset: &Dataset,
    column: CategoryColumn,
    title: &str,
) {
    let all_values = dataset.distinct(column);

    let n_selected = state.selection(column).map_or(0, |s| s.len());
    let header_text = format!("{title}  ({n_selected}/{})", all_values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(column.source_name())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(column);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(column);
                }
            });

            if state.selection(column).is_some_and(|s| s.is_empty()) {
                ui.weak("Nothing selected: no restriction");
            }

            for val in all_values {
                let mut checked = state.selection(column).is_some_and(|s| s.contains(val));
                if ui.checkbox(&mut checked, val.as_str()).changed() {
                    state.set_selected(column, val, checked);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// File menu plus a one-line summary of the loaded source.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} rows loaded, {} visible, volume {}",
                state.config.source.path.display(),
                ds.len(),
                state.report.rows.len(),
                format_volume(state.report.total_volume)
            ));
        }

        if let Some(notice) = &state.notice {
            ui.separator();
            ui.label(RichText::new(notice).color(Color32::YELLOW));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open volume data")
        .add_filter("Supported files", &["xlsx", "xlsm", "xls", "ods", "csv", "json", "parquet", "pq"])
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.open_path(path);
    }
}
