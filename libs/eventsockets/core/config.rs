use crate::traits::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Runtime options for an `EventClient`
///
/// Deserializable so applications can embed it in their own config files.
/// Missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Reconnect after a dropped session
    pub reconnection: bool,
    /// Maximum reconnection attempts, 0 means unlimited
    pub reconnection_attempts: usize,
    pub reconnection_delay_secs: f64,
    pub reconnection_delay_max_secs: f64,
    /// Jitter applied to each delay, `0.0..=1.0`
    pub randomization_factor: f64,
    /// Bound on each handshake step of a connection attempt
    pub request_timeout_secs: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconnection: true,
            reconnection_attempts: 0,
            reconnection_delay_secs: 1.0,
            reconnection_delay_max_secs: 5.0,
            randomization_factor: 0.5,
            request_timeout_secs: 5.0,
        }
    }
}

impl ClientConfig {
    /// Reconnection strategy described by these options
    pub fn reconnect_strategy(&self) -> Box<dyn ReconnectionStrategy> {
        if !self.reconnection {
            return Box::new(NeverReconnect);
        }
        let max_attempts = match self.reconnection_attempts {
            0 => None,
            n => Some(n),
        };
        Box::new(
            ExponentialBackoff::new(
                secs(self.reconnection_delay_secs),
                secs(self.reconnection_delay_max_secs),
                max_attempts,
            )
            .with_randomization(self.randomization_factor),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        secs(self.request_timeout_secs)
    }

    /// Check option ranges
    pub fn validate(&self) -> Result<()> {
        let delays = [
            ("reconnection_delay_secs", self.reconnection_delay_secs),
            ("reconnection_delay_max_secs", self.reconnection_delay_max_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ];
        for (name, value) in delays {
            if !value.is_finite() || value < 0.0 {
                return Err(EventSocketError::Configuration(format!(
                    "{name} must be a non-negative number of seconds, got {value}"
                )));
            }
        }
        if self.reconnection_delay_secs > self.reconnection_delay_max_secs {
            return Err(EventSocketError::Configuration(format!(
                "reconnection_delay_secs ({}) exceeds reconnection_delay_max_secs ({})",
                self.reconnection_delay_secs, self.reconnection_delay_max_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.randomization_factor) {
            return Err(EventSocketError::Configuration(format!(
                "randomization_factor must be within 0.0..=1.0, got {}",
                self.randomization_factor
            )));
        }
        Ok(())
    }
}

pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Arguments of a single `EventClient::connect` call
#[derive(Clone)]
pub struct ConnectOptions {
    pub url: String,
    pub headers: Option<Arc<dyn HeaderProvider>>,
    pub auth: Option<Value>,
    /// Resolve `connect` only once the first attempt finished
    pub wait: bool,
    pub wait_timeout: Duration,
    /// Keep retrying with the reconnection strategy when the first attempt fails
    pub retry: bool,
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: None,
            auth: None,
            wait: true,
            wait_timeout: Duration::from_secs(1),
            retry: false,
        }
    }

    pub fn headers(mut self, provider: impl HeaderProvider + 'static) -> Self {
        self.headers = Some(Arc::new(provider));
        self
    }

    pub fn auth(mut self, auth: Value) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("url", &self.url)
            .field("headers", &self.headers.is_some())
            .field("auth", &self.auth.is_some())
            .field("wait", &self.wait)
            .field("wait_timeout", &self.wait_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}
