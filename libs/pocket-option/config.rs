//! Client settings (YAML) and account credentials (environment)

use crate::client::{DEFAULT_ORIGIN, DEFAULT_URL, DEFAULT_USER_AGENT};
use crate::models::AuthorizationData;
use eventsockets::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config/client.yaml";
pub const CONFIG_PATH_ENV: &str = "POCKET_OPTION_CONFIG_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything needed to build and connect a `PocketOptionClient`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL; the Socket.IO path is appended by the transport
    #[serde(default = "default_url")]
    pub url: String,
    /// Reconnection and timeout options
    #[serde(default)]
    pub connection: ClientConfig,
    /// How long `connect` waits for the first attempt
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: f64,
    /// Keep retrying when the first attempt fails
    #[serde(default)]
    pub retry_initial_connect: bool,
    #[serde(default)]
    pub heartbeat: HeartbeatSettings,
    /// Extra handshake headers; `Origin` and `User-Agent` have defaults
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Symbol the demo binary subscribes to
    #[serde(default)]
    pub subscription: SubscriptionSettings,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_heartbeat_event")]
    pub event: String,
    #[serde(default = "default_heartbeat_interval")]
    pub interval_secs: f64,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            event: default_heartbeat_event(),
            interval_secs: default_heartbeat_interval(),
        }
    }
}

impl HeartbeatSettings {
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs).unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Candle period in seconds
    #[serde(default = "default_period")]
    pub period: i64,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            period: default_period(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_wait_timeout() -> f64 {
    5.0
}

fn default_true() -> bool {
    true
}

fn default_heartbeat_event() -> String {
    "ps".to_string()
}

fn default_heartbeat_interval() -> f64 {
    60.0
}

fn default_asset() -> String {
    "AUDCAD_otc".to_string()
}

fn default_period() -> i64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            connection: ClientConfig::default(),
            wait_timeout_secs: default_wait_timeout(),
            retry_initial_connect: false,
            heartbeat: HeartbeatSettings::default(),
            headers: HashMap::new(),
            subscription: SubscriptionSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl ClientSettings {
    /// Load settings from a YAML file
    ///
    /// `PO_URL` overrides the configured URL.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut settings: ClientSettings = serde_yaml::from_str(&yaml_content)?;

        if let Ok(url) = std::env::var("PO_URL") {
            info!("Overriding url from environment variable");
            settings.url = url;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let scheme_ok = ["ws://", "wss://", "http://", "https://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme));
        if !scheme_ok {
            return Err(ConfigError::ValidationError(format!(
                "url must start with ws://, wss://, http:// or https://, got `{}`",
                self.url
            )));
        }

        self.connection
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if !self.wait_timeout_secs.is_finite() || self.wait_timeout_secs <= 0.0 {
            return Err(ConfigError::ValidationError(
                "wait_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.heartbeat.enabled {
            if self.heartbeat.event.is_empty() {
                return Err(ConfigError::ValidationError(
                    "heartbeat.event must not be empty".to_string(),
                ));
            }
            if !self.heartbeat.interval_secs.is_finite() || self.heartbeat.interval_secs <= 0.0 {
                return Err(ConfigError::ValidationError(
                    "heartbeat.interval_secs must be greater than 0".to_string(),
                ));
            }
        }

        if self.subscription.period <= 0 {
            return Err(ConfigError::ValidationError(
                "subscription.period must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.wait_timeout_secs).unwrap_or(Duration::ZERO)
    }

    /// Handshake headers: defaults overlaid with the configured ones
    pub fn handshake_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::from([
            ("Origin".to_string(), DEFAULT_ORIGIN.to_string()),
            ("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()),
        ]);
        for (name, value) in &self.headers {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  URL: {}", self.url);
        info!(
            "  Reconnection: {} (attempts: {}, delay: {}s..{}s)",
            self.connection.reconnection,
            self.connection.reconnection_attempts,
            self.connection.reconnection_delay_secs,
            self.connection.reconnection_delay_max_secs
        );
        info!("  Wait timeout: {} seconds", self.wait_timeout_secs);
        if self.heartbeat.enabled {
            info!(
                "  Heartbeat: `{}` every {} seconds",
                self.heartbeat.event, self.heartbeat.interval_secs
            );
        } else {
            info!("  Heartbeat: disabled");
        }
        info!(
            "  Subscription: {} ({}s)",
            self.subscription.asset, self.subscription.period
        );
        info!("  Log level: {}", self.log_level);
    }
}

/// Account credentials, never stored in the YAML file
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub session: String,
    pub uid: i64,
    pub is_demo: bool,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("session", &"<redacted>")
            .field("uid", &self.uid)
            .field("is_demo", &self.is_demo)
            .finish()
    }
}

impl Credentials {
    /// Read `PO_SESSION`, `PO_UID` and `PO_IS_DEMO` (default `1`)
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let session =
            std::env::var("PO_SESSION").map_err(|_| ConfigError::EnvVarMissing("PO_SESSION".to_string()))?;
        let uid = std::env::var("PO_UID").map_err(|_| ConfigError::EnvVarMissing("PO_UID".to_string()))?;
        let is_demo = std::env::var("PO_IS_DEMO").unwrap_or_else(|_| "1".to_string());

        Self::parse(session, &uid, &is_demo)
    }

    fn parse(session: String, uid: &str, is_demo: &str) -> Result<Self> {
        if session.trim().is_empty() {
            return Err(ConfigError::ValidationError("PO_SESSION must not be empty".to_string()));
        }
        let uid = uid
            .trim()
            .parse()
            .map_err(|_| ConfigError::ValidationError(format!("PO_UID must be an integer, got `{uid}`")))?;
        let is_demo = match is_demo.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "PO_IS_DEMO must be 0 or 1, got `{other}`"
                )))
            }
        };

        Ok(Self { session, uid, is_demo })
    }

    pub fn authorization(&self) -> AuthorizationData {
        AuthorizationData::new(self.session.clone(), self.uid, self.is_demo)
    }
}
