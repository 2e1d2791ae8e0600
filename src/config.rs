//! Service configuration

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::analytics::DEFAULT_TOP_COUNTRIES;
use crate::error::{InsightsError, Result};
use crate::evaluation::{DEFAULT_TARGETS, EVALUATION_PATH};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,

    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Largest accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Countries returned by /top-countries when no limit is given
    #[serde(default = "default_top_countries")]
    pub top_countries_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Base URL probed by the harness (defaults to this server's own address)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-probe timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Endpoints probed, in order
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

// Defaults
fn default_bind_addr() -> IpAddr { IpAddr::from([0, 0, 0, 0]) }
fn default_http_port() -> u16 { 8080 }
fn default_max_upload_bytes() -> usize { 64 * 1024 * 1024 } // 64MB
fn default_top_countries() -> usize { DEFAULT_TOP_COUNTRIES }
fn default_timeout_ms() -> u64 { 5000 }
fn default_targets() -> Vec<String> {
    DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            http_port: default_http_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_countries_limit: default_top_countries(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: default_timeout_ms(),
            targets: default_targets(),
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| InsightsError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.analytics.top_countries_limit == 0 {
            return Err(InsightsError::Config(
                "analytics.top_countries_limit must be at least 1".to_string(),
            ));
        }
        if self.evaluation.timeout_ms == 0 {
            return Err(InsightsError::Config(
                "evaluation.timeout_ms must be at least 1".to_string(),
            ));
        }
        if let Some(target) = self.evaluation.targets.iter().find(|t| !t.starts_with('/')) {
            return Err(InsightsError::Config(format!(
                "evaluation target {target:?} must start with '/'"
            )));
        }
        if let Some(target) = self.evaluation.targets.iter().find(|t| is_evaluation_path(t)) {
            return Err(InsightsError::Config(format!(
                "evaluation target {target:?} would evaluate itself"
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.bind_addr, self.server.http_port)
    }

    /// Base URL for self-evaluation: explicit setting, else loopback on our own port
    pub fn evaluation_base_url(&self) -> String {
        match &self.evaluation.base_url {
            Some(url) => url.clone(),
            None => {
                let host = if self.server.bind_addr.is_unspecified() {
                    IpAddr::from([127, 0, 0, 1])
                } else {
                    self.server.bind_addr
                };
                format!("http://{}", SocketAddr::new(host, self.server.http_port))
            }
        }
    }

    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_millis(self.evaluation.timeout_ms)
    }
}

fn is_evaluation_path(target: &str) -> bool {
    let path = target.split(['?', '#']).next().unwrap_or(target);
    path.trim_end_matches('/') == EVALUATION_PATH
}
