//! PitchScope Main Application
//! Main window with control panel and tabbed dashboard. CSV loading and
//! report export run on background threads.

use crate::charts::{ChartPalette, StaticChartRenderer};
use crate::config::{DashboardConfig, UiState};
use crate::data::schema::DataCategory;
use crate::data::{self, DataLoader, LoadOutcome};
use crate::gui::control_panel::{ControlPanel, ControlPanelAction, LoadStatus};
use crate::gui::dashboard::{CompareView, Dashboard, TabViewModel};
use crate::report::ReportExporter;
use crate::stats;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{info, warn};

/// CSV loading result from the background thread. The loader travels with
/// the job so its fingerprint cache survives across loads.
enum LoadResult {
    Progress(String),
    Complete {
        loader: DataLoader,
        config: DashboardConfig,
        table: Option<DataFrame>,
        file_count: usize,
        from_cache: bool,
    },
    Error {
        loader: DataLoader,
        message: String,
    },
}

/// Report export result from the background thread.
enum ExportResult {
    Done(PathBuf),
    Error(String),
}

/// Main application window.
pub struct PitchScopeApp {
    loader: Option<DataLoader>,
    control_panel: ControlPanel,
    dashboard: Dashboard,

    config: DashboardConfig,
    palette: ChartPalette,
    ui_state: UiState,

    /// Loaded table with derived flag and outcome columns.
    table: Option<DataFrame>,
    views: Vec<TabViewModel>,
    compare: CompareView,
    views_dirty: bool,

    load_rx: Option<Receiver<LoadResult>>,
    export_rx: Option<Receiver<ExportResult>>,
}

impl PitchScopeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = DashboardConfig::default();
        let palette = ChartPalette::from_config(&config);
        let ui_state = UiState::restore();

        let mut app = Self {
            loader: Some(DataLoader::new()),
            control_panel: ControlPanel::new(),
            dashboard: Dashboard::new(),
            config,
            palette,
            ui_state,
            table: None,
            views: Vec::new(),
            compare: CompareView::default(),
            views_dirty: false,
            load_rx: None,
            export_rx: None,
        };

        // Pick up where the last session left off.
        if let Some(folder) = app.ui_state.last_folder.clone() {
            if folder.is_dir() {
                app.control_panel.folder = Some(folder.clone());
                app.start_load(folder, false);
            }
        }
        app
    }

    fn handle_browse_folder(&mut self) {
        if self.load_rx.is_some() {
            return; // Already loading
        }
        if let Some(path) = rfd::FileDialog::new().pick_folder() {
            self.control_panel.folder = Some(path.clone());
            self.ui_state.last_folder = Some(path.clone());
            if let Err(e) = self.ui_state.persist() {
                warn!("failed to persist window state: {e}");
            }
            self.start_load(path, true);
        }
    }

    fn handle_reload(&mut self) {
        if self.load_rx.is_some() {
            return;
        }
        if let Some(folder) = self.control_panel.folder.clone() {
            self.start_load(folder, true);
        }
    }

    /// Kick off a folder load on a background thread. `invalidate` forces a
    /// re-read even when the directory fingerprint matches the cache.
    fn start_load(&mut self, folder: PathBuf, invalidate: bool) {
        let Some(mut loader) = self.loader.take() else {
            return;
        };
        if invalidate {
            loader.invalidate();
        }

        self.control_panel.is_loading = true;
        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading CSV files...".to_string()));

            let config = match DashboardConfig::load_from_dir(&folder) {
                Ok(config) => config,
                Err(e) => {
                    warn!("config load failed, using defaults: {e}");
                    DashboardConfig::default()
                }
            };

            let outcome = match loader.load_dir(&folder) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let _ = tx.send(LoadResult::Error {
                        loader,
                        message: e.to_string(),
                    });
                    return;
                }
            };

            match outcome {
                LoadOutcome::NoData => {
                    let _ = tx.send(LoadResult::Complete {
                        loader,
                        config,
                        table: None,
                        file_count: 0,
                        from_cache: false,
                    });
                }
                LoadOutcome::Loaded {
                    df,
                    file_count,
                    from_cache,
                } => {
                    let _ = tx.send(LoadResult::Progress("Deriving pitch flags...".to_string()));
                    match data::derive_columns(&df, &config.outcome_rules) {
                        Ok(table) => {
                            let _ = tx.send(LoadResult::Complete {
                                loader,
                                config,
                                table: Some(table),
                                file_count,
                                from_cache,
                            });
                        }
                        Err(e) => {
                            let _ = tx.send(LoadResult::Error {
                                loader,
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        });
    }

    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        // Drain until the terminal message, the channel runs dry, or the
        // worker is found dead (sender dropped without a final message).
        let done = loop {
            match rx.try_recv() {
                Ok(LoadResult::Progress(status)) => {
                    self.control_panel.status.message = status;
                    self.control_panel.status.is_error = false;
                }
                Ok(LoadResult::Complete {
                    loader,
                    config,
                    table,
                    file_count,
                    from_cache,
                }) => {
                    self.loader = Some(loader);
                    self.palette = ChartPalette::from_config(&config);
                    self.config = config;
                    self.control_panel.is_loading = false;

                    match table {
                        Some(table) => {
                            info!(rows = table.height(), files = file_count, "folder loaded");
                            self.control_panel.status = LoadStatus {
                                message: "Loaded".to_string(),
                                is_error: false,
                                file_count,
                                row_count: table.height(),
                                from_cache,
                            };
                            self.table = Some(table);
                        }
                        None => {
                            self.control_panel.status = LoadStatus {
                                message: "No CSV files in folder".to_string(),
                                ..Default::default()
                            };
                            self.table = None;
                        }
                    }
                    self.views_dirty = true;
                    break true;
                }
                Ok(LoadResult::Error { loader, message }) => {
                    warn!("load failed: {message}");
                    self.loader = Some(loader);
                    self.control_panel.is_loading = false;
                    self.control_panel.status = LoadStatus {
                        message: format!("Error: {message}"),
                        is_error: true,
                        ..Default::default()
                    };
                    self.table = None;
                    self.views_dirty = true;
                    break true;
                }
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => {
                    warn!("load worker terminated unexpectedly");
                    // The loader died with the worker; start fresh so the
                    // next browse/reload still works.
                    self.loader.get_or_insert_with(DataLoader::new);
                    self.control_panel.is_loading = false;
                    self.control_panel.status = LoadStatus {
                        message: "Error: load worker terminated unexpectedly".to_string(),
                        is_error: true,
                        ..Default::default()
                    };
                    break true;
                }
            }
        };

        if !done {
            self.load_rx = Some(rx);
        }
    }

    /// Recompute every tab's view model from the derived table. Categories
    /// are independent, so they aggregate in parallel.
    fn rebuild_views(&mut self) {
        self.views_dirty = false;

        let Some(table) = &self.table else {
            self.views = Vec::new();
            self.compare = CompareView::default();
            return;
        };

        let jobs: Vec<(DataCategory, crate::data::PitchFilter)> = DataCategory::ALL
            .iter()
            .zip(self.dashboard.filters.iter())
            .map(|(c, f)| (*c, f.clone()))
            .collect();
        let config = &self.config;

        self.views = jobs
            .par_iter()
            .map(|(category, filter)| {
                let subset = data::filter::by_category(table, category.tag())
                    .unwrap_or_else(|_| table.clear());
                TabViewModel::build(*category, &subset, filter, config)
            })
            .collect();

        self.compare = self.build_compare_view(table);
    }

    fn build_compare_view(&self, table: &DataFrame) -> CompareView {
        let pitchers = data::filter::pitcher_choices(table);
        let (left, right) = (&self.dashboard.compare_left, &self.dashboard.compare_right);
        let result = if !left.is_empty() && !right.is_empty() {
            let left_speeds = stats::speeds_for_pitcher(table, left);
            let right_speeds = stats::speeds_for_pitcher(table, right);
            Some(stats::compare_velocities(
                left,
                &left_speeds,
                right,
                &right_speeds,
            ))
        } else {
            None
        };
        CompareView { pitchers, result }
    }

    /// Render the current visual charts to PNGs and pack them into a PPTX on
    /// a background thread, then open the result.
    fn handle_export_report(&mut self) {
        if self.export_rx.is_some() {
            return;
        }

        // Export the active tab if it has data, else the first tab that does.
        let view = self
            .dashboard
            .active_category()
            .and_then(|c| self.views.iter().find(|v| v.category == c && v.rows > 0))
            .or_else(|| self.views.iter().find(|v| v.rows > 0));
        let Some(view) = view.cloned() else {
            self.control_panel.status.message = "Nothing to export".to_string();
            self.control_panel.status.is_error = true;
            return;
        };

        let output_path = match rfd::FileDialog::new()
            .add_filter("PowerPoint", &["pptx"])
            .set_file_name("pitchscope_report.pptx")
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        self.control_panel.is_exporting = true;
        let (tx, rx) = channel();
        self.export_rx = Some(rx);

        let palette = self.config.palette.clone();
        let zone = self.config.strike_zone.clone();
        let title = format!(
            "PitchScope Report - {} - {}",
            view.category.label(),
            chrono::Local::now().format("%Y-%m-%d")
        );

        thread::spawn(move || {
            let (width, height) = (1400u32, 1000u32);
            let render = || -> Result<Vec<Vec<u8>>, String> {
                Ok(vec![
                    StaticChartRenderer::render_movement_png(
                        &view.movement,
                        &palette,
                        width,
                        height,
                        "Movement",
                    )
                    .map_err(|e| e.to_string())?,
                    StaticChartRenderer::render_location_png(
                        &view.location,
                        &zone,
                        &palette,
                        width,
                        height,
                        "Plate location",
                    )
                    .map_err(|e| e.to_string())?,
                    StaticChartRenderer::render_usage_png(
                        &view.summary,
                        &palette,
                        width,
                        height,
                        "Usage",
                    )
                    .map_err(|e| e.to_string())?,
                ])
            };

            let result = render().and_then(|images| {
                ReportExporter::export(&images, &output_path, &title)
                    .map_err(|e| e.to_string())
            });

            match result {
                Ok(()) => {
                    let _ = tx.send(ExportResult::Done(output_path));
                }
                Err(message) => {
                    let _ = tx.send(ExportResult::Error(message));
                }
            }
        });
    }

    fn check_export_results(&mut self) {
        let Some(rx) = self.export_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(ExportResult::Done(path)) => {
                info!(path = %path.display(), "report exported");
                self.control_panel.is_exporting = false;
                self.control_panel.status.message =
                    format!("Report saved: {}", path.display());
                self.control_panel.status.is_error = false;
                if let Err(e) = open::that(&path) {
                    warn!("could not open report: {e}");
                }
            }
            Ok(ExportResult::Error(message)) => {
                warn!("export failed: {message}");
                self.control_panel.is_exporting = false;
                self.control_panel.status.message = format!("Export error: {message}");
                self.control_panel.status.is_error = true;
            }
            Err(TryRecvError::Empty) => {
                self.export_rx = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                warn!("export worker terminated unexpectedly");
                self.control_panel.is_exporting = false;
                self.control_panel.status.message =
                    "Export worker terminated unexpectedly".to_string();
                self.control_panel.status.is_error = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_app() -> PitchScopeApp {
        let config = DashboardConfig::default();
        let palette = ChartPalette::from_config(&config);
        PitchScopeApp {
            loader: Some(DataLoader::new()),
            control_panel: ControlPanel::new(),
            dashboard: Dashboard::new(),
            config,
            palette,
            ui_state: UiState::default(),
            table: None,
            views: Vec::new(),
            compare: CompareView::default(),
            views_dirty: false,
            load_rx: None,
            export_rx: None,
        }
    }

    #[test]
    fn dead_load_worker_resets_panel_and_loader() {
        let mut app = bare_app();
        let (tx, rx) = channel::<LoadResult>();
        app.load_rx = Some(rx);
        app.loader = None;
        app.control_panel.is_loading = true;

        // Worker dies without sending a terminal message.
        drop(tx);
        app.check_load_results();

        assert!(app.load_rx.is_none());
        assert!(!app.control_panel.is_loading);
        assert!(app.control_panel.status.is_error);
        // A fresh loader means browse/reload still works afterward.
        assert!(app.loader.is_some());
    }

    #[test]
    fn load_completion_is_not_mistaken_for_a_dead_worker() {
        let mut app = bare_app();
        let (tx, rx) = channel::<LoadResult>();
        app.load_rx = Some(rx);
        app.loader = None;
        app.control_panel.is_loading = true;

        // Terminal message followed by the sender dropping, as in a normal
        // worker exit; the empty-folder completion must win.
        tx.send(LoadResult::Complete {
            loader: DataLoader::new(),
            config: DashboardConfig::default(),
            table: None,
            file_count: 0,
            from_cache: false,
        })
        .unwrap();
        drop(tx);
        app.check_load_results();

        assert!(app.load_rx.is_none());
        assert!(!app.control_panel.is_loading);
        assert!(!app.control_panel.status.is_error);
        assert_eq!(app.control_panel.status.message, "No CSV files in folder");
        assert!(app.loader.is_some());
    }

    #[test]
    fn dead_export_worker_resets_export_state() {
        let mut app = bare_app();
        let (tx, rx) = channel::<ExportResult>();
        app.export_rx = Some(rx);
        app.control_panel.is_exporting = true;

        drop(tx);
        app.check_export_results();

        assert!(app.export_rx.is_none());
        assert!(!app.control_panel.is_exporting);
        assert!(app.control_panel.status.is_error);
    }

    #[test]
    fn pending_channels_stay_armed() {
        let mut app = bare_app();
        let (load_tx, load_rx) = channel::<LoadResult>();
        let (export_tx, export_rx) = channel::<ExportResult>();
        app.load_rx = Some(load_rx);
        app.export_rx = Some(export_rx);

        app.check_load_results();
        app.check_export_results();

        // Workers are still alive and silent; keep polling them.
        assert!(app.load_rx.is_some());
        assert!(app.export_rx.is_some());
        drop(load_tx);
        drop(export_tx);
    }
}

impl eframe::App for PitchScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();
        self.check_export_results();

        if self.load_rx.is_some() || self.export_rx.is_some() {
            ctx.request_repaint();
        }

        if self.views_dirty {
            self.rebuild_views();
        }

        egui::SidePanel::left("control_panel")
            .min_width(220.0)
            .max_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);
                    match action {
                        ControlPanelAction::BrowseFolder => self.handle_browse_folder(),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::ExportReport => self.handle_export_report(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let changed = self.dashboard.show(
                    ui,
                    &self.views,
                    &self.compare,
                    &self.config,
                    &self.palette,
                );
                if changed {
                    self.views_dirty = true;
                }
            });
        });
    }
}
