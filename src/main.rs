mod app;
mod state;
mod ui;

use app::TabulaApp;
use eframe::egui;
use rusty_tabula::config::PipelineConfig;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match PipelineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Ignoring configuration: {e:#}");
            PipelineConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Tabula – Data Workbench",
        options,
        Box::new(|_cc| Ok(Box::new(TabulaApp::new(config)))),
    )
}
