//! GUI module - dashboard window components

mod app;
mod chart_viewer;
mod control_panel;

pub use app::DashboardApp;
pub use chart_viewer::{kpi_cards, ChartViewer, KpiCard, SECTIONS};
pub use control_panel::{ControlPanel, ControlPanelAction, SourceSelection};

use crate::config::AppConfig;

/// Open the dashboard window; returns when it is closed.
pub fn run_dashboard(config: AppConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1500.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Canada Immigration Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Canada Immigration Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
}
