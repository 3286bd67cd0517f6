//! Rule configuration
//!
//! Everything the default rule needs is read once at load time: collector
//! address, capture patterns, mock table and the optional local file served
//! on CONNECT. Nothing here changes after the rule is built.

use crate::error::{RuleError, RuleResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Kind of canned response a mock rule produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockKind {
    /// 1x1 transparent GIF
    Gif,
    /// `[]` served as JSON
    EmptyJson,
}

/// One entry of the ordered mock table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockRuleConfig {
    /// Case-insensitive regex tested against the full request URL
    pub pattern: String,
    pub kind: MockKind,
}

impl MockRuleConfig {
    pub fn new(pattern: &str, kind: MockKind) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind,
        }
    }
}

/// Where side-channel reports are posted.
///
/// `CollectorConfig::default()` applies when the `[collector]` table is
/// absent. Inside a table, omitted fields fall back per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// `http` or `https`
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_host")]
    pub host: String,
    /// Defaults to 80/443 by scheme when unset
    #[serde(default)]
    pub port: Option<u16>,
    /// Per-report request timeout. Unset or `0` means no timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: Some(8080),
            timeout_ms: Some(10_000),
        }
    }
}

impl CollectorConfig {
    pub fn resolved_port(&self) -> u16 {
        self.port.unwrap_or(if self.scheme == "https" { 443 } else { 80 })
    }

    /// `scheme://host:port`, without a trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.resolved_port())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

/// Which responses are forwarded to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub patterns: Vec<String>,
    /// Collector path reports are posted to
    pub path: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                "aweme/v1/feed".to_string(),
                "aweme/v1/search/item".to_string(),
            ],
            path: "/".to_string(),
        }
    }
}

/// File served when the host asks for local content on CONNECT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileConfig {
    pub path: PathBuf,
    pub content_type: String,
}

/// Top-level rule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub collector: CollectorConfig,
    pub capture: CaptureConfig,
    /// Evaluated in order, first match wins
    pub mock_rules: Vec<MockRuleConfig>,
    pub local_file: Option<LocalFileConfig>,
    /// Answer for CONNECT tunnels. `None` leaves the choice to the host.
    pub intercept_https: Option<bool>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            capture: CaptureConfig::default(),
            mock_rules: vec![
                MockRuleConfig::new(r"byteimg\.com", MockKind::Gif),
                MockRuleConfig::new(r"ixigua\.com", MockKind::Gif),
                MockRuleConfig::new("google", MockKind::EmptyJson),
            ],
            local_file: None,
            intercept_https: None,
        }
    }
}

impl RuleConfig {
    pub fn from_toml_str(source: &str) -> RuleResult<Self> {
        let config: RuleConfig =
            toml::from_str(source).map_err(|e| RuleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> RuleResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!("Loading rule config from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> RuleResult<()> {
        match self.collector.scheme.as_str() {
            "http" | "https" => {}
            other => {
                return Err(RuleError::Config(format!(
                    "unsupported collector scheme `{}`",
                    other
                )))
            }
        }
        if self.collector.host.trim().is_empty() {
            return Err(RuleError::Config("collector host is empty".to_string()));
        }
        if !self.capture.path.starts_with('/') {
            return Err(RuleError::Config(format!(
                "capture path `{}` must start with `/`",
                self.capture.path
            )));
        }
        Ok(())
    }
}
