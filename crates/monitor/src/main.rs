//! Driver Fatigue Monitor - Main Entry Point

use monitor::{init_logging, run, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load()?;
    if let Some(path) = std::env::args().nth(1) {
        settings.replay.path = path.into();
    }

    init_logging(&settings.log);

    info!("=== Driver Fatigue Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Replaying landmarks from {}", settings.replay.path.display());

    let summary = run(settings).await?;
    info!(
        "Processed {} frames ({} faces, {} skipped), peak status {}",
        summary.frames, summary.faces, summary.skipped_faces, summary.peak_status
    );

    Ok(())
}
