mod app;
mod color;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use app::DashboardApp;
use eframe::egui;
use volumen_dashboard::config::{DashboardConfig, CONFIG_FILE};

fn main() -> eframe::Result {
    env_logger::init();

    let config_path = Path::new(CONFIG_FILE);
    let mut config = DashboardConfig::load_or_default(config_path);
    // First run: leave an editable config next to the data.
    if !config_path.exists() {
        match config.save(config_path) {
            Ok(()) => log::info!("Wrote default configuration to {}", config_path.display()),
            Err(e) => log::warn!("Could not write default configuration: {e:#}"),
        }
    }
    // An explicit path on the command line wins over the config file.
    if let Some(path) = std::env::args_os().nth(1) {
        config.source.path = PathBuf::from(path);
    }
    log::info!("Data source: {}", config.source.path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Volume Dashboard",
        options,
        Box::new(move |cc| {
            // Install image loaders so the report tabs can show png/jpg files.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(config)))
        }),
    )
}
