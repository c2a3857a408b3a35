//! Dashboard Main Application
//! Control panel on the left, KPI cards and charts in the centre. The
//! pipeline runs on a background thread and reports back over a channel.

use crate::charts::HtmlExporter;
use crate::config::AppConfig;
use crate::data::DataLoader;
use crate::gui::control_panel::SourceSelection;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::pipeline;
use crate::stats::ImmigrationSummary;
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use tracing::{error, info};

/// Message from the loader thread.
enum LoadResult {
    Progress(String),
    Complete {
        summary: Box<ImmigrationSummary>,
        records: usize,
        sheets: Vec<String>,
    },
    Error(String),
}

pub struct DashboardApp {
    config: AppConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    /// Set once a workbook was picked in the file dialog.
    picked_source: bool,
}

impl DashboardApp {
    /// Starts loading the configured source right away.
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let selection = SourceSelection {
            path: Some(config.source.path.clone()),
            sheet: config.source.sheet.clone(),
        };
        let mut app = Self {
            config,
            control_panel: ControlPanel::new(selection),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
            picked_source: false,
        };
        app.start_loading();
        app
    }

    fn handle_browse_source(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Workbooks", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.control_panel.selection.path = Some(path);
            // A new workbook gets its sheet list from the loader thread.
            self.control_panel.sheets.clear();
            self.picked_source = true;
            self.start_loading();
        }
    }

    /// Run the pipeline for the current selection in a background thread.
    fn start_loading(&mut self) {
        let Some(path) = self.control_panel.selection.path.clone() else {
            self.control_panel.set_status("No file selected");
            return;
        };

        let mut config = self.config.clone();
        config.source.path = path.clone();
        if self.control_panel.selection.sheet.is_some() {
            config.source.sheet = self.control_panel.selection.sheet.clone();
        }
        config.analysis = config.analysis.for_dashboard();

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.control_panel.busy = true;
        self.control_panel
            .set_status(format!("Loading {}...", path.display()));

        let picked = self.picked_source;
        thread::spawn(move || Self::run_pipeline(tx, path, config, picked));
    }

    /// Called on the loader thread.
    fn run_pipeline(tx: Sender<LoadResult>, path: PathBuf, mut config: AppConfig, picked: bool) {
        let sheets = if DataLoader::is_workbook(&path) {
            match DataLoader::sheet_names(&path) {
                Ok(sheets) => sheets,
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                    return;
                }
            }
        } else {
            Vec::new()
        };

        config.source.sheet = choose_sheet(config.source.sheet.as_deref(), &sheets, picked);

        let _ = tx.send(LoadResult::Progress("Normalizing and aggregating...".to_string()));

        match pipeline::run(&config) {
            Ok(analysis) => {
                let _ = tx.send(LoadResult::Complete {
                    records: analysis.records.len(),
                    summary: Box::new(analysis.summary),
                    sheets,
                });
            }
            Err(e) => {
                let _ = tx.send(LoadResult::Error(e.to_string()));
            }
        }
    }

    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        let mut keep_receiver = true;

        while let Ok(result) = rx.try_recv() {
            match result {
                LoadResult::Progress(status) => self.control_panel.set_status(status),
                LoadResult::Complete {
                    summary,
                    records,
                    sheets,
                } => {
                    info!(records, "dashboard data ready");
                    self.control_panel.update_sheets(sheets);
                    self.chart_viewer
                        .set_summary(*summary, self.config.analysis.for_dashboard());
                    self.control_panel.has_data = true;
                    self.control_panel
                        .set_status(format!("Loaded {records} records"));
                    self.finish_loading();
                    keep_receiver = false;
                }
                LoadResult::Error(message) => {
                    error!(%message, "dashboard load failed");
                    self.chart_viewer.clear();
                    self.control_panel.has_data = false;
                    self.control_panel.set_status(format!("Error: {message}"));
                    self.finish_loading();
                    keep_receiver = false;
                }
            }
        }

        if keep_receiver {
            self.load_rx = Some(rx);
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.busy = false;
    }

    /// Write the HTML pages for the current data into a picked folder.
    fn handle_export(&mut self) {
        let (Some(summary), Some(renderer)) = (
            self.chart_viewer.summary(),
            self.chart_viewer.renderer(&self.config.theme),
        ) else {
            self.control_panel.set_status("No charts to export");
            return;
        };
        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.export.out_dir)
            .pick_folder()
        else {
            return;
        };

        let renderer = renderer.with_width(self.config.export.width);
        let result = HtmlExporter::new(renderer, summary, &dir)
            .with_png(self.config.export.png)
            .export_all();

        let status = match result {
            Ok(report) => format!("Exported {} files to {}", report.file_count(), dir.display()),
            Err(e) => {
                error!(error = %e, "dashboard export failed");
                format!("Error: {e}")
            }
        };
        self.control_panel.set_status(status);
    }
}

/// Sheet to read. A workbook picked in the file dialog falls back to its
/// first sheet; the configured source keeps its sheet so a missing one fails.
fn choose_sheet(configured: Option<&str>, sheets: &[String], picked: bool) -> Option<String> {
    match configured {
        Some(sheet) if !picked || sheets.is_empty() || sheets.iter().any(|s| s == sheet) => {
            Some(sheet.to_string())
        }
        _ => sheets.first().cloned(),
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseSource => self.handle_browse_source(),
                        ControlPanelAction::Reload => {
                            if !self.is_loading {
                                self.start_loading();
                            }
                        }
                        ControlPanelAction::ExportCharts => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let panel = &self.control_panel;
            self.chart_viewer
                .show(ui, &self.config.theme, |kind| panel.is_visible(kind));
        });
    }
}
