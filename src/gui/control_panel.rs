//! Control Panel Widget
//! Left side panel: data folder selection, reload, load status and the
//! report export button. Emits actions for the app to execute.

use egui::{Color32, RichText};
use std::path::PathBuf;

/// Actions the panel requests from the application.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFolder,
    Reload,
    ExportReport,
}

/// What the panel shows about the current load.
#[derive(Debug, Clone, Default)]
pub struct LoadStatus {
    pub message: String,
    pub is_error: bool,
    pub file_count: usize,
    pub row_count: usize,
    pub from_cache: bool,
}

pub struct ControlPanel {
    pub folder: Option<PathBuf>,
    pub status: LoadStatus,
    pub is_loading: bool,
    pub is_exporting: bool,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self {
            folder: None,
            status: LoadStatus::default(),
            is_loading: false,
            is_exporting: false,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.heading("PitchScope");
        ui.separator();

        ui.label(RichText::new("Data folder").strong());
        match &self.folder {
            Some(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                ui.label(RichText::new(name).size(12.0))
                    .on_hover_text(path.display().to_string());
            }
            None => {
                ui.label(RichText::new("not selected").weak().size(12.0));
            }
        }

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.is_loading, egui::Button::new("Browse..."))
                .clicked()
            {
                action = ControlPanelAction::BrowseFolder;
            }
            let can_reload = self.folder.is_some() && !self.is_loading;
            if ui
                .add_enabled(can_reload, egui::Button::new("Reload"))
                .clicked()
            {
                action = ControlPanelAction::Reload;
            }
        });

        ui.add_space(8.0);
        ui.separator();

        if self.is_loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading CSV files...");
            });
        } else if !self.status.message.is_empty() {
            let color = if self.status.is_error {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::from_rgb(40, 167, 69)
            };
            ui.label(RichText::new(&self.status.message).color(color).size(12.0));
            if self.status.row_count > 0 {
                let source = if self.status.from_cache { " (cached)" } else { "" };
                ui.label(
                    RichText::new(format!(
                        "{} files, {} pitches{source}",
                        self.status.file_count, self.status.row_count
                    ))
                    .weak()
                    .size(12.0),
                );
            }
        }

        ui.add_space(8.0);
        ui.separator();

        let can_export = self.status.row_count > 0 && !self.is_loading && !self.is_exporting;
        if ui
            .add_enabled(can_export, egui::Button::new("Export report (PPTX)"))
            .clicked()
        {
            action = ControlPanelAction::ExportReport;
        }
        if self.is_exporting {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Rendering report...");
            });
        }

        action
    }
}
