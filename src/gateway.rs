//! Device gateway abstraction over the robot's motion backend
//!
//! A gateway call only *triggers* an action and returns within a short
//! transport timeout; pacing out the action's nominal duration is the
//! executor's job. Two backends exist: the humanoid's local JSON-RPC control
//! daemon and the quadruped's motion-control bridge fed by typed publishes.

use crate::catalog::{ActionDefinition, DeviceCommand};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Upper bound on any single transport call
const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(2);

/// Boundary over the physical execution mechanism
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Trigger the action on the device. Returns once the command is handed
    /// to the transport, not when the motion finishes.
    async fn execute(&self, definition: &ActionDefinition) -> Result<()>;

    /// Tell the device to halt whatever it is doing.
    async fn stop(&self) -> Result<()>;

    /// Human-readable backend name for logs
    fn name(&self) -> &'static str;
}

/// Gateway for the humanoid's loopback control daemon (JSON-RPC 2.0)
pub struct JsonRpcGateway {
    client: reqwest::Client,
    endpoint: String,
    device_id: String,
}

impl JsonRpcGateway {
    pub fn new(endpoint: impl Into<String>, device_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TRANSPORT_TIMEOUT)
            .build()
            .context("failed to build RPC client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            device_id: device_id.into(),
        })
    }

    fn rpc_body(&self, code: &str, group: &str) -> serde_json::Value {
        serde_json::json!({
            "id": self.device_id,
            "jsonrpc": "2.0",
            "method": "RunAction",
            "params": [code, group],
        })
    }

    async fn run_action(&self, code: &str, group: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("deviceid", &self.device_id)
            .json(&self.rpc_body(code, group))
            .send()
            .await
            .with_context(|| format!("RunAction({}, {}) request failed", code, group))?;

        response
            .error_for_status()
            .with_context(|| format!("RunAction({}, {}) rejected by daemon", code, group))?;

        debug!("RunAction({}, {}) accepted", code, group);
        Ok(())
    }

    async fn dispatch(&self, command: &DeviceCommand) -> Result<()> {
        match command {
            DeviceCommand::RunAction { code, group } => self.run_action(code, group).await,
            DeviceCommand::Sequence(steps) => {
                for step in steps {
                    Box::pin(self.dispatch(step)).await?;
                }
                Ok(())
            }
            other => Err(anyhow!(
                "command {:?} not supported by the RunAction daemon",
                other
            )),
        }
    }
}

#[async_trait]
impl DeviceGateway for JsonRpcGateway {
    async fn execute(&self, definition: &ActionDefinition) -> Result<()> {
        info!("Dispatching '{}' to control daemon", definition.name);
        self.dispatch(&definition.command).await
    }

    async fn stop(&self) -> Result<()> {
        // The daemon has no cancel primitive; the closest halt is the
        // neutral-posture slot.
        info!("Requesting neutral posture from control daemon");
        self.run_action("0", "1").await
    }

    fn name(&self) -> &'static str {
        "json-rpc"
    }
}

/// Typed messages published to the quadruped's motion-control bridge
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCommand {
    Velocity { x: f32, y: f32, yaw_rate: f32 },
    Pose {
        x_shift: f32,
        height: f32,
        roll: f32,
        pitch: f32,
        yaw: f32,
        run_time_ms: u32,
    },
    RunMotionFile { file: String },
}

impl MotionCommand {
    /// Stable stance the device settles into after a halt
    pub fn neutral_pose() -> Self {
        MotionCommand::Pose {
            x_shift: -0.6,
            height: -10.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            run_time_ms: 500,
        }
    }
}

/// Gateway for the quadruped: publishes typed motion commands to the bridge
/// task that owns the actual motion-service connection.
pub struct MotionGateway {
    tx: mpsc::Sender<MotionCommand>,
}

impl MotionGateway {
    pub fn new(tx: mpsc::Sender<MotionCommand>) -> Self {
        Self { tx }
    }

    async fn publish(&self, command: MotionCommand) -> Result<()> {
        tokio::time::timeout(TRANSPORT_TIMEOUT, self.tx.send(command))
            .await
            .map_err(|_| anyhow!("motion bridge publish timed out"))?
            .map_err(|_| anyhow!("motion bridge channel closed"))
    }

    async fn dispatch(&self, command: &DeviceCommand) -> Result<()> {
        match command {
            DeviceCommand::Velocity { x, y, yaw_rate } => {
                self.publish(MotionCommand::Velocity {
                    x: *x,
                    y: *y,
                    yaw_rate: *yaw_rate,
                })
                .await
            }
            DeviceCommand::MotionFile { file } => {
                self.publish(MotionCommand::RunMotionFile {
                    file: (*file).to_string(),
                })
                .await
            }
            DeviceCommand::Sequence(steps) => {
                for step in steps {
                    Box::pin(self.dispatch(step)).await?;
                }
                Ok(())
            }
            other => Err(anyhow!(
                "command {:?} not supported by the motion bridge",
                other
            )),
        }
    }
}

#[async_trait]
impl DeviceGateway for MotionGateway {
    async fn execute(&self, definition: &ActionDefinition) -> Result<()> {
        info!("Dispatching '{}' to motion bridge", definition.name);
        self.dispatch(&definition.command).await
    }

    async fn stop(&self) -> Result<()> {
        info!("Publishing halt to motion bridge");
        self.publish(MotionCommand::Velocity {
            x: 0.0,
            y: 0.0,
            yaw_rate: 0.0,
        })
        .await?;
        self.publish(MotionCommand::neutral_pose()).await
    }

    fn name(&self) -> &'static str {
        "motion-bridge"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionCatalog;

    #[test]
    fn test_rpc_body_shape() {
        let gateway = JsonRpcGateway::new("http://127.0.0.1:9030/", "robot_1").unwrap();
        let body = gateway.rpc_body("9", "1");
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "RunAction");
        assert_eq!(body["params"], serde_json::json!(["9", "1"]));
        assert_eq!(body["id"], "robot_1");
    }

    #[tokio::test]
    async fn test_motion_gateway_velocity_publish() {
        let (tx, mut rx) = mpsc::channel(8);
        let gateway = MotionGateway::new(tx);
        let catalog = ActionCatalog::quadruped();

        gateway
            .execute(catalog.lookup("go_forward").unwrap())
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            MotionCommand::Velocity { x: 5.0, y: 0.0, yaw_rate: 0.0 }
        );
    }

    #[tokio::test]
    async fn test_motion_gateway_named_motion_publish() {
        let (tx, mut rx) = mpsc::channel(8);
        let gateway = MotionGateway::new(tx);
        let catalog = ActionCatalog::quadruped();

        gateway.execute(catalog.lookup("bow").unwrap()).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            MotionCommand::RunMotionFile { file: "bow.d6ac".into() }
        );
    }

    #[tokio::test]
    async fn test_motion_gateway_composite_publishes_each_step() {
        let (tx, mut rx) = mpsc::channel(8);
        let gateway = MotionGateway::new(tx);
        let definition = ActionDefinition {
            name: "greet",
            display_name: "Greet",
            duration: Duration::from_secs(7),
            command: DeviceCommand::Sequence(vec![
                DeviceCommand::MotionFile { file: "bow.d6ac" },
                DeviceCommand::MotionFile { file: "wave.d6ac" },
            ]),
        };

        gateway.execute(&definition).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            MotionCommand::RunMotionFile { file: "bow.d6ac".into() }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            MotionCommand::RunMotionFile { file: "wave.d6ac".into() }
        );
    }

    #[tokio::test]
    async fn test_motion_gateway_stop_halts_and_settles() {
        let (tx, mut rx) = mpsc::channel(8);
        let gateway = MotionGateway::new(tx);

        gateway.stop().await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            MotionCommand::Velocity { x: 0.0, y: 0.0, yaw_rate: 0.0 }
        );
        assert_eq!(rx.recv().await.unwrap(), MotionCommand::neutral_pose());
    }

    #[tokio::test]
    async fn test_motion_gateway_closed_channel_is_an_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let gateway = MotionGateway::new(tx);
        let catalog = ActionCatalog::quadruped();

        let result = gateway.execute(catalog.lookup("bow").unwrap()).await;
        assert!(result.is_err());
    }
}
