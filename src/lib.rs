//! PitchScope - pitch tracking CSV dashboard
//!
//! Loads a folder of pitch-tracking CSV exports, normalizes the drifting
//! headers and encodings into one canonical table, derives per-pitch flags
//! and outcome labels, and serves filtered per-pitch-type aggregates to an
//! egui dashboard with movement and location charts, pitcher comparison,
//! and PPTX report export.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod report;
pub mod stats;
