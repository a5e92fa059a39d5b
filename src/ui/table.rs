use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use volumen_dashboard::data::model::REQUIRED_COLUMNS;
use volumen_dashboard::data::normalize::format_volume;

use crate::state::AppState;
use crate::ui::charts;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Raw data view of the filtered rows
// ---------------------------------------------------------------------------

pub fn data_table(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let rows = &state.report.rows;
    if rows.is_empty() {
        charts::no_data(ui);
        return;
    }

    ui.label(format!("{} rows", rows.len()));

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(90.0))
        .columns(Column::auto().at_least(80.0), 3)
        .column(Column::remainder().at_least(100.0))
        .header(20.0, |mut header| {
            for name in REQUIRED_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let rec = &dataset.records[rows[row.index()]];
                row.col(|ui: &mut Ui| {
                    ui.label(rec.date.format("%Y-%m-%d").to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.product.as_str());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.department.as_str());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.sector.as_str());
                });
                row.col(|ui: &mut Ui| match rec.volume {
                    Some(v) => {
                        ui.label(format_volume(v));
                    }
                    None => {
                        ui.label(RichText::new("missing").weak().italics());
                    }
                });
            });
        });
}
