//! Gesture Arena game process
//!
//! Receives control datagrams on UDP and runs the arena until the player is
//! hit or the process is told to stop.

use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use gesture_arena::app::{init_tracing, shutdown_signal, AppState};
use gesture_arena::config::Config;
use gesture_arena::game::Simulation;
use gesture_arena::net::InputServer;
use gesture_arena::render::{FixedScreen, JsonLinesSink, RenderBoundary, RenderSink, TracingSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level, config.log_json);

    info!("Starting Gesture Arena");
    info!(
        input = %config.input_addr,
        left = %config.left_device,
        right = %config.right_device,
        "Controller devices"
    );

    let state = AppState::new(config.clone());
    let (left, right) = state.register_controllers();

    let mut server = InputServer::bind(config.input_addr, state.devices.clone())
        .await?
        .spawn()?;

    let screen = FixedScreen::from_cells(config.screen_width, config.screen_height);
    let mut sink: Box<dyn RenderSink> = match &config.snapshot_path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            info!(path = %path.display(), "Writing snapshots");
            Box::new(JsonLinesSink::new(BufWriter::new(file), screen.screen_size()))
        }
        None => Box::new(TracingSink::new()),
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let mut simulation = Simulation::new(config.simulation.clone(), left, right);
    let score = simulation.run(&screen, sink.as_mut(), stop_rx).await;

    let updates = server.shutdown().await;
    info!(score, ticks = simulation.state().tick, updates = ?updates, "Shutdown complete");
    println!("Final score: {score}");
    Ok(())
}
