mod app;
mod color;
mod state;
mod ui;

use app::RustyWaterfallApp;
use clap::Parser;
use eframe::egui;
use rusty_waterfall::config::{ChartConfig, LaunchArgs};
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = LaunchArgs::parse();
    let config = match &args.config {
        Some(path) => ChartConfig::load(path)?,
        None => ChartConfig::default(),
    };

    let mut state = AppState::new(config);
    if let Some(path) = &args.data {
        ui::panels::open_data(&mut state, path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Waterfall",
        options,
        Box::new(|_cc| Ok(Box::new(RustyWaterfallApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
