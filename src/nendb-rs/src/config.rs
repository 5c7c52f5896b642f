use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client configuration, set once at construction and read-only thereafter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the NenDB server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of retries on transient failure (0 = single attempt).
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base factor for the exponential backoff schedule, in seconds.
    /// The n-th retry waits `backoff_factor * 2^n`, capped.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// HTTP status codes that trigger a retry.
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    /// HTTP methods allowed to retry. Requests with any other method are
    /// never retried, whatever the failure.
    #[serde(default = "default_retry_methods")]
    pub retry_methods: Vec<String>,

    /// Skip the `GET /health` probe normally performed at construction.
    /// Useful for tests and for servers that come up after the client.
    #[serde(default)]
    pub skip_health_probe: bool,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_retry_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

fn default_retry_methods() -> Vec<String> {
    ["HEAD", "GET", "OPTIONS", "POST"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            backoff_factor: default_backoff_factor(),
            retry_statuses: default_retry_statuses(),
            retry_methods: default_retry_methods(),
            skip_health_probe: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn with_skip_health_probe(mut self, skip: bool) -> Self {
        self.skip_health_probe = skip;
        self
    }
}
