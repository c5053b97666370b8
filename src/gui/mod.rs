//! GUI module - main window, control panel and dashboard

pub mod app;
pub mod control_panel;
pub mod dashboard;

pub use app::PitchScopeApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use dashboard::{Dashboard, TabViewModel};
