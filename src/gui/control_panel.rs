//! Control Panel Widget
//! Left side panel: data source, sheet selection, reload and export.

use crate::charts::ChartKind;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Source the dashboard reads from.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SourceSelection {
    pub path: Option<PathBuf>,
    pub sheet: Option<String>,
}

/// Left side control panel with source selection and status.
pub struct ControlPanel {
    pub selection: SourceSelection,
    pub sheets: Vec<String>,
    /// Charts shown in the viewer.
    pub visible: Vec<(ChartKind, bool)>,
    pub busy: bool,
    pub has_data: bool,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            selection: SourceSelection::default(),
            sheets: Vec::new(),
            visible: ChartKind::ALL.iter().map(|k| (*k, true)).collect(),
            busy: false,
            has_data: false,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new(selection: SourceSelection) -> Self {
        Self {
            selection,
            ..Self::default()
        }
    }

    /// Replace the sheet list; keeps the current sheet when still present.
    pub fn update_sheets(&mut self, sheets: Vec<String>) {
        let keep = self
            .selection
            .sheet
            .as_ref()
            .is_some_and(|s| sheets.contains(s));
        if !keep {
            self.selection.sheet = sheets.first().cloned();
        }
        self.sheets = sheets;
    }

    pub fn is_visible(&self, kind: ChartKind) -> bool {
        self.visible
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, shown)| *shown)
            .unwrap_or(true)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("Canada Immigration")
                    .size(22.0)
                    .color(Color32::from_rgb(200, 16, 46)),
            );
            ui.label(RichText::new("Dashboard").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        ui.label(RichText::new("Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let name = self
                        .selection
                        .path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());
                    let name_color = if self.selection.path.is_some() {
                        ui.visuals().strong_text_color()
                    } else {
                        Color32::GRAY
                    };
                    ui.label(RichText::new(name).size(12.0).color(name_color));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add_enabled(!self.busy, egui::Button::new("Browse")).clicked() {
                            action = ControlPanelAction::BrowseSource;
                        }
                    });
                });
            });

        if !self.sheets.is_empty() {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.add_sized([60.0, 20.0], egui::Label::new("Sheet:"));
                let selected = self.selection.sheet.clone().unwrap_or_default();
                ComboBox::from_id_salt("sheet")
                    .width(200.0)
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for sheet in &self.sheets {
                            let current = self.selection.sheet.as_ref() == Some(sheet);
                            if ui.selectable_label(current, sheet).clicked() && !current {
                                self.selection.sheet = Some(sheet.clone());
                                action = ControlPanelAction::Reload;
                            }
                        }
                    });
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.label(RichText::new("Charts").size(14.0).strong());
        ui.add_space(5.0);
        for (kind, shown) in self.visible.iter_mut() {
            ui.checkbox(shown, kind.file_stem());
        }
        ui.horizontal(|ui| {
            if ui.small_button("Show All").clicked() {
                self.visible.iter_mut().for_each(|(_, v)| *v = true);
            }
            if ui.small_button("Hide All").clicked() {
                self.visible.iter_mut().for_each(|(_, v)| *v = false);
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            let can_reload = !self.busy && self.selection.path.is_some();
            ui.add_enabled_ui(can_reload, |ui| {
                let button = egui::Button::new(RichText::new("Reload").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Reload;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(!self.busy && self.has_data, |ui| {
                let button = egui::Button::new(RichText::new("Export HTML").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportCharts;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.label(RichText::new("Status").size(14.0).strong());
        ui.add_space(5.0);
        if self.busy {
            ui.add(egui::Spinner::new());
        }
        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.has_data && !self.busy {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by the control panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseSource,
    Reload,
    ExportCharts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_list_keeps_known_selection() {
        let mut panel = ControlPanel::new(SourceSelection {
            path: None,
            sheet: Some("Regions".to_string()),
        });
        panel.update_sheets(vec!["Notes".to_string(), "Regions".to_string()]);
        assert_eq!(panel.selection.sheet.as_deref(), Some("Regions"));

        panel.update_sheets(vec!["Canada by Citizenship".to_string()]);
        assert_eq!(panel.selection.sheet.as_deref(), Some("Canada by Citizenship"));
    }

    #[test]
    fn every_chart_starts_visible() {
        let panel = ControlPanel::default();
        assert!(ChartKind::ALL.iter().all(|k| panel.is_visible(*k)));
    }
}
