use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use volumen_dashboard::config::DashboardConfig;

use crate::state::{AppState, Tab};
use crate::ui::{charts, images, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    /// Build the app and load the configured source once.
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = AppState::new(config);
        state.load();
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            tab_bar(ui, &mut self.state);
            ui.separator();

            match self.state.tab {
                Tab::Volume => volume_tab(ui, &self.state),
                Tab::Data => table::data_table(ui, &self.state),
                Tab::Report(i) => match self.state.config.report_images.get(i) {
                    Some(image) => images::report_image(ui, image),
                    None => self.state.tab = Tab::Volume,
                },
            }
        });
    }
}

fn tab_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.tab, Tab::Volume, "Volume");
        ui.selectable_value(&mut state.tab, Tab::Data, "Data");
        for (i, image) in state.config.report_images.iter().enumerate() {
            ui.selectable_value(&mut state.tab, Tab::Report(i), image.title.as_str());
        }
    });
}

fn volume_tab(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| match &state.status_message {
            Some(msg) => {
                ui.label(RichText::new(msg).color(Color32::RED).heading());
            }
            None => {
                ui.heading("Open a file to view volumes  (File → Open…)");
            }
        });
        return;
    }
    if state.report.is_empty() {
        charts::no_data(ui);
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |cols| {
                charts::volume_chart(&mut cols[0], state);
                charts::sector_pie(&mut cols[1], state);
            });
            ui.separator();
            charts::department_ranking(ui, state);
        });
}
