use anyhow::Context;
use coffee_dash::app::CoffeeDashApp;
use coffee_dash::config::DashboardConfig;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env().context("reading dashboard configuration")?;
    log::info!("Reading sales data from {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Coffee Shop Sales Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(CoffeeDashApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard: {e}"))
}
