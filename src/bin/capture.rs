//! Capture process: plays camera frames through the motion tracker and sends
//! the resulting control vectors to the game.

use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use gesture_arena::app::{init_tracing, shutdown_signal};
use gesture_arena::capture::{CapturePipeline, PgmDirectorySource};
use gesture_arena::config::Config;
use gesture_arena::net::ControlSender;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level, config.log_json);

    info!(
        frames = %config.frame_dir.display(),
        device = %config.capture_device,
        target = %config.control_target,
        "Starting capture"
    );

    let source = PgmDirectorySource::open(&config.frame_dir)?;
    let sender = ControlSender::connect(config.control_target, config.capture_device.clone()).await?;
    let pipeline = CapturePipeline::new(source, sender)
        .mirror(config.capture_mirror)
        .pace(Duration::from_millis(config.capture_interval_ms));

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let frames = pipeline.run(stop_rx).await?;
    info!(frames, "Capture finished");
    Ok(())
}
