//! Agent configuration
//!
//! Plain config structs with defaults, overridable from the environment at
//! startup. The variant decides which catalog/gateway pair the process runs.

use crate::executor::ExecutorConfig;
use std::time::Duration;

/// Which robot this agent is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotVariant {
    /// Humanoid driven through the local RunAction daemon
    #[default]
    Humanoid,
    /// Quadruped driven through the motion-control bridge
    Quadruped,
}

impl RobotVariant {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "humanoid" => Some(RobotVariant::Humanoid),
            "quadruped" | "dog" => Some(RobotVariant::Quadruped),
            _ => None,
        }
    }
}

/// Top-level agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Robot identity, also used as the RPC device id
    pub robot_id: String,
    pub variant: RobotVariant,
    /// Loopback endpoint of the humanoid control daemon
    pub rpc_endpoint: String,
    /// Loopback listener the bus client delivers action messages to
    pub listen_addr: String,
    pub executor: ExecutorConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            robot_id: "robot_1".into(),
            variant: RobotVariant::default(),
            rpc_endpoint: "http://127.0.0.1:9030/".into(),
            listen_addr: "127.0.0.1:7070".into(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Defaults overridden by `ROBOT_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(id) = std::env::var("ROBOT_ID") {
            config.robot_id = id;
        }
        if let Ok(variant) = std::env::var("ROBOT_VARIANT") {
            if let Some(parsed) = RobotVariant::parse(&variant) {
                config.variant = parsed;
            }
        }
        if let Ok(endpoint) = std::env::var("ROBOT_RPC_ENDPOINT") {
            config.rpc_endpoint = endpoint;
        }
        if let Ok(addr) = std::env::var("ROBOT_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Ok(recovery) = std::env::var("ROBOT_STOP_RECOVERY") {
            config.executor.post_stop_recovery_action = if recovery.is_empty() {
                None
            } else {
                Some(recovery)
            };
        }

        config
    }
}

/// Pacing constants shared by both variants
pub const QUEUE_POLL: Duration = Duration::from_secs(1);
pub const INTERRUPT_POLL: Duration = Duration::from_millis(100);
pub const INTER_ACTION_PAUSE: Duration = Duration::from_millis(500);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parse() {
        assert_eq!(RobotVariant::parse("humanoid"), Some(RobotVariant::Humanoid));
        assert_eq!(RobotVariant::parse("Quadruped"), Some(RobotVariant::Quadruped));
        assert_eq!(RobotVariant::parse("dog"), Some(RobotVariant::Quadruped));
        assert_eq!(RobotVariant::parse("hexapod"), None);
    }

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.variant, RobotVariant::Humanoid);
        assert_eq!(
            config.executor.post_stop_recovery_action.as_deref(),
            Some("stand")
        );
    }
}
