mod bus;
mod catalog;
mod config;
mod executor;
mod gateway;
mod queue;

use catalog::ActionCatalog;
use config::{AgentConfig, RobotVariant};
use executor::ActionExecutor;
use gateway::{DeviceGateway, JsonRpcGateway, MotionCommand, MotionGateway};
use std::sync::Arc;
use tokio::sync::mpsc;

use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AgentConfig::from_env();
    info!("Robot agent starting: {}", config.robot_id);
    info!("  variant: {:?}", config.variant);
    info!("  delivery listener: {}", config.listen_addr);

    let (catalog, gateway): (Arc<ActionCatalog>, Arc<dyn DeviceGateway>) = match config.variant {
        RobotVariant::Humanoid => {
            info!("  control daemon: {}", config.rpc_endpoint);
            (
                Arc::new(ActionCatalog::humanoid()),
                Arc::new(JsonRpcGateway::new(
                    config.rpc_endpoint.clone(),
                    config.robot_id.clone(),
                )?),
            )
        }
        RobotVariant::Quadruped => {
            let (motion_tx, motion_rx) = mpsc::channel(32);
            spawn_motion_bridge(motion_rx);
            (
                Arc::new(ActionCatalog::quadruped()),
                Arc::new(MotionGateway::new(motion_tx)),
            )
        }
    };
    info!("Catalog loaded: {} actions", catalog.len());

    let executor = ActionExecutor::new(catalog, gateway, config.executor.clone());
    executor.start().await;

    // Delivery loop: the co-located bus client forwards each pub/sub payload
    // over loopback, one JSON document per line
    let listener_executor = executor.clone();
    let listen_addr = config.listen_addr.clone();
    let listener = tokio::spawn(async move {
        if let Err(e) = bus::run_listener(&listen_addr, listener_executor).await {
            error!("Delivery listener failed: {:#}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    listener.abort();
    executor.shutdown().await;
    Ok(())
}

/// Bridge task owning the outbound side of the quadruped's motion-control
/// connection. The platform's motion-service client attaches here; until one
/// is wired in, commands are traced so dry runs are observable.
fn spawn_motion_bridge(mut rx: mpsc::Receiver<MotionCommand>) {
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                MotionCommand::Velocity { x, y, yaw_rate } => {
                    info!("[motion] velocity x={} y={} yaw_rate={}", x, y, yaw_rate);
                }
                MotionCommand::Pose {
                    x_shift, height, ..
                } => {
                    info!("[motion] pose x_shift={} height={}", x_shift, height);
                }
                MotionCommand::RunMotionFile { file } => {
                    info!("[motion] run motion file '{}'", file);
                }
            }
        }
        debug!("Motion bridge channel closed");
    });
}
