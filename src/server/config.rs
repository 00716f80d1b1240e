//! Server configuration types

use helpdesk_core::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub coordinator: CoordinatorAppConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

/// Socket behaviour shared by caller, supervisor and relay channels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// Bound on a single outbound delivery
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// Close a socket that stayed silent this long
    #[serde(default = "default_heartbeat_timeout_secs")]
    pub heartbeat_timeout_secs: u64,
    /// Outbound queue length per connection
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

fn default_send_timeout_ms() -> u64 {
    helpdesk_core::DEFAULT_SEND_TIMEOUT_MS
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_heartbeat_timeout_secs() -> u64 {
    60
}

fn default_channel_capacity() -> usize {
    64
}

fn default_max_message_bytes() -> usize {
    64 * 1024
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            ping_interval_secs: default_ping_interval_secs(),
            heartbeat_timeout_secs: default_heartbeat_timeout_secs(),
            channel_capacity: default_channel_capacity(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl WebSocketConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs.max(1))
    }
}

/// Coordinator configuration (exposed to TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorAppConfig {
    #[serde(default = "default_matcher_timeout_ms")]
    pub matcher_timeout_ms: u64,
    /// Resolve ids that are substrings of a tracked id (or the reverse)
    #[serde(default = "default_true")]
    pub lenient_id_matching: bool,
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default)]
    pub escalation_notice: Option<String>,
    #[serde(default)]
    pub escalation_failure_notice: Option<String>,
    #[serde(default)]
    pub supervisor_answer_prefix: Option<String>,
}

fn default_matcher_timeout_ms() -> u64 {
    2_000
}

fn default_true() -> bool {
    true
}

impl Default for CoordinatorAppConfig {
    fn default() -> Self {
        Self {
            matcher_timeout_ms: default_matcher_timeout_ms(),
            lenient_id_matching: true,
            greeting: None,
            escalation_notice: None,
            escalation_failure_notice: None,
            supervisor_answer_prefix: None,
        }
    }
}

impl CoordinatorAppConfig {
    /// Build the core settings, keeping built-in texts where none are configured
    pub fn to_core(&self) -> CoordinatorConfig {
        let defaults = CoordinatorConfig::default();
        CoordinatorConfig {
            matcher_timeout: Duration::from_millis(self.matcher_timeout_ms),
            lenient_id_matching: self.lenient_id_matching,
            greeting: self.greeting.clone().unwrap_or(defaults.greeting),
            escalation_notice: self
                .escalation_notice
                .clone()
                .unwrap_or(defaults.escalation_notice),
            escalation_failure_notice: self
                .escalation_failure_notice
                .clone()
                .unwrap_or(defaults.escalation_failure_notice),
            supervisor_answer_prefix: self
                .supervisor_answer_prefix
                .clone()
                .unwrap_or(defaults.supervisor_answer_prefix),
        }
    }
}

/// Knowledge base source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    pub path: String,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: "knowledge_base.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_defaults_keep_builtin_texts() {
        let core = CoordinatorAppConfig::default().to_core();
        assert_eq!(core.supervisor_answer_prefix, "[Supervisor Answer]: ");
        assert!(core.lenient_id_matching);
        assert_eq!(core.matcher_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_coordinator_overrides() {
        let config = CoordinatorAppConfig {
            lenient_id_matching: false,
            greeting: Some("Hello".to_string()),
            ..CoordinatorAppConfig::default()
        };
        let core = config.to_core();
        assert_eq!(core.greeting, "Hello");
        assert!(!core.lenient_id_matching);
    }
}
