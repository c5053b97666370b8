//! PitchScope - pitch tracking CSV dashboard
//!
//! Desktop viewer for pitch-tracking CSV exports: per-pitch-type stats,
//! movement and location charts, pitcher comparison, PPTX report export.

use anyhow::Context;
use pitchscope::gui::PitchScopeApp;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("PitchScope starting up");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("PitchScope"),
        ..Default::default()
    };

    eframe::run_native(
        "PitchScope",
        options,
        Box::new(|cc| Ok(Box::new(PitchScopeApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start application: {e}"))
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pitchscope=info,warn")),
        )
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
