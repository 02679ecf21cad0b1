//! Inbound action delivery
//!
//! The upstream pub/sub client (one per robot) forwards each message payload
//! over a loopback connection, one JSON document per line. Payloads carry the
//! action name under `toolName`; anything malformed is logged and dropped so
//! a bad message can never take the delivery loop down.

use crate::executor::ActionExecutor;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Wire shape of a delivered action message
#[derive(Debug, Deserialize)]
struct ActionMessage {
    #[serde(rename = "toolName")]
    tool_name: Option<String>,
}

/// Parse one delivered payload and hand the action name to the executor.
pub async fn handle_payload(executor: &ActionExecutor, payload: &str) {
    let message: ActionMessage = match serde_json::from_str(payload) {
        Ok(message) => message,
        Err(e) => {
            error!("Invalid JSON payload: {}", e);
            return;
        }
    };

    let Some(name) = message.tool_name else {
        warn!("No action specified in the payload");
        return;
    };

    match executor.submit(&name).await {
        Ok(Some(id)) => info!("Queued '{}' as {}", name, id),
        Ok(None) => info!("Routed '{}' to immediate stop", name),
        Err(e) => warn!("Submission rejected: {}", e),
    }
}

/// Accept loopback connections from the bus client and feed each line-framed
/// payload into the executor.
pub async fn run_listener(addr: &str, executor: Arc<ActionExecutor>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind delivery listener on {}", addr))?;
    info!("Delivery listener on {}", addr);

    loop {
        let (socket, peer) = listener.accept().await?;
        debug!("Bus client connected: {}", peer);

        let executor = executor.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(socket).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => handle_payload(&executor, &line).await,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Read error from {}: {}", peer, e);
                        break;
                    }
                }
            }
            debug!("Bus client disconnected: {}", peer);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionCatalog, ActionDefinition};
    use crate::executor::ExecutorConfig;
    use crate::gateway::DeviceGateway;
    use async_trait::async_trait;

    struct NullGateway;

    #[async_trait]
    impl DeviceGateway for NullGateway {
        async fn execute(&self, _definition: &ActionDefinition) -> Result<()> {
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "null"
        }
    }

    fn executor() -> Arc<ActionExecutor> {
        // Not started: submissions just accumulate in the queue
        ActionExecutor::new(
            Arc::new(ActionCatalog::humanoid()),
            Arc::new(NullGateway),
            ExecutorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_valid_payload_queues_action() {
        let executor = executor();
        handle_payload(&executor, r#"{"toolName": "wave"}"#).await;

        let status = executor.status().await;
        assert_eq!(status.queue.len(), 1);
        assert_eq!(status.queue[0].name, "wave");
    }

    #[tokio::test]
    async fn test_unknown_action_is_dropped() {
        let executor = executor();
        handle_payload(&executor, r#"{"toolName": "spin"}"#).await;
        assert!(executor.status().await.queue.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_dropped() {
        let executor = executor();
        handle_payload(&executor, "not json at all").await;
        handle_payload(&executor, r#"{"toolName": 42}"#).await;
        assert!(executor.status().await.queue.is_empty());
    }

    #[tokio::test]
    async fn test_missing_field_is_dropped() {
        let executor = executor();
        handle_payload(&executor, r#"{"message": "hello"}"#).await;
        assert!(executor.status().await.queue.is_empty());
    }

    #[tokio::test]
    async fn test_stop_payload_flushes_queue() {
        let executor = executor();
        handle_payload(&executor, r#"{"toolName": "wave"}"#).await;
        handle_payload(&executor, r#"{"toolName": "stop"}"#).await;
        assert!(executor.status().await.queue.is_empty());
    }
}
