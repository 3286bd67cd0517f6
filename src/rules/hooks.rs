//! Rule hooks
//!
//! The proxy host calls these at fixed points of each transaction:
//!
//! ```text
//! request ──on_request──► (mocked response | forwarded) ──on_response──► client
//! CONNECT ──on_connect──► (intercept | tunnel | local file)
//! failures ──on_request_error / on_connect_error──► observe only
//! ```
//!
//! Hooks only see snapshots and only answer with decisions. They never fail:
//! anything a hook cannot decide becomes pass-through.

use crate::config::{LocalFileConfig, MockKind, RuleConfig};
use crate::error::RuleResult;
use crate::models::{
    ConnectDecision, Decision, ErrorContext, LocalFileResponse, ResponseDetail,
    TransactionSnapshot,
};
use crate::rules::builder::build_override;
use crate::rules::decode::body_text;
use crate::rules::matcher::{matches_any, RuleTable, UrlPattern};
use crate::rules::reporter::{HttpReporter, Reporter, SideChannelMessage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle callbacks a proxy host invokes for every transaction.
///
/// Every method defaults to pass-through, so a rule implements only the
/// phases it cares about. Implementations must be safe to call concurrently
/// from many transactions.
#[async_trait]
pub trait RuleHooks: Send + Sync {
    /// Short human-readable description of the rule.
    fn summary(&self) -> &str;

    /// Called before the request leaves the proxy.
    async fn on_request(&self, _request: &TransactionSnapshot) -> Decision {
        Decision::PassThrough
    }

    /// Called once the upstream response arrived, before it is relayed.
    async fn on_response(
        &self,
        _request: &TransactionSnapshot,
        _response: &ResponseDetail,
    ) -> Decision {
        Decision::PassThrough
    }

    /// Called once per CONNECT tunnel. `None` leaves the choice to the host.
    async fn on_connect(&self, _request: &TransactionSnapshot) -> Option<ConnectDecision> {
        None
    }

    async fn on_request_error(&self, _request: &TransactionSnapshot, _error: &ErrorContext) {}

    async fn on_connect_error(&self, _request: &TransactionSnapshot, _error: &ErrorContext) {}
}

/// Table-driven rule: mocks matching requests, reports captured responses
/// to the collector and optionally answers CONNECT with a local file.
pub struct DefaultRule {
    mocks: RuleTable<MockKind>,
    capture: Vec<UrlPattern>,
    capture_path: String,
    local_file: Option<LocalFileConfig>,
    intercept_https: Option<bool>,
    reporter: Arc<dyn Reporter>,
}

impl DefaultRule {
    /// Build the rule with an HTTP reporter pointed at the configured collector.
    pub fn from_config(config: &RuleConfig) -> RuleResult<Self> {
        let reporter = Arc::new(HttpReporter::new(&config.collector)?);
        Self::with_reporter(config, reporter)
    }

    pub fn with_reporter(config: &RuleConfig, reporter: Arc<dyn Reporter>) -> RuleResult<Self> {
        config.validate()?;

        let mut mocks = RuleTable::new();
        for rule in &config.mock_rules {
            mocks.push(&rule.pattern, rule.kind)?;
        }
        let capture = config
            .capture
            .patterns
            .iter()
            .map(|pattern| UrlPattern::new(pattern))
            .collect::<RuleResult<Vec<_>>>()?;

        tracing::info!(
            "Rule loaded: {} mock rules, {} capture patterns",
            mocks.len(),
            capture.len()
        );

        Ok(Self {
            mocks,
            capture,
            capture_path: config.capture.path.clone(),
            local_file: config.local_file.clone(),
            intercept_https: config.intercept_https,
            reporter,
        })
    }

    async fn read_local_file(&self, local: &LocalFileConfig) -> Option<LocalFileResponse> {
        match tokio::fs::read(&local.path).await {
            Ok(body) => {
                let mut header = HashMap::new();
                header.insert("Content-Type".to_string(), local.content_type.clone());
                Some(LocalFileResponse {
                    status_code: 200,
                    header,
                    body,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read local file {}: {}",
                    local.path.display(),
                    e
                );
                None
            }
        }
    }
}

#[async_trait]
impl RuleHooks for DefaultRule {
    fn summary(&self) -> &str {
        "mock image/video and search traffic, forward captured feeds to the collector"
    }

    async fn on_request(&self, request: &TransactionSnapshot) -> Decision {
        match self.mocks.first_match(&request.url) {
            Some(kind) => {
                tracing::debug!(
                    "[{}] Mocking {} {} as {:?}",
                    request.id,
                    request.request_options.method.as_str(),
                    request.url,
                    kind
                );
                Decision::Respond(build_override(*kind))
            }
            None => Decision::PassThrough,
        }
    }

    async fn on_response(
        &self,
        request: &TransactionSnapshot,
        response: &ResponseDetail,
    ) -> Decision {
        if matches_any(&request.url, &self.capture) {
            match body_text(&response.response.header, &response.response.body) {
                Ok(json) => {
                    tracing::debug!(
                        "[{}] Capturing {} bytes from {}",
                        request.id,
                        json.len(),
                        request.url
                    );
                    self.reporter
                        .report(SideChannelMessage { json }, &self.capture_path);
                }
                Err(e) => {
                    tracing::warn!("[{}] Skipping capture of {}: {}", request.id, request.url, e);
                }
            }
        }
        Decision::PassThrough
    }

    async fn on_connect(&self, request: &TransactionSnapshot) -> Option<ConnectDecision> {
        if request.replace_local_file {
            match &self.local_file {
                Some(local) => {
                    if let Some(response) = self.read_local_file(local).await {
                        return Some(ConnectDecision::ServeLocalFile(response));
                    }
                }
                None => {
                    tracing::debug!(
                        "[{}] Local file requested for {} but none is configured",
                        request.id,
                        request.url
                    );
                }
            }
        }
        self.intercept_https.map(ConnectDecision::from_intercept)
    }

    async fn on_request_error(&self, request: &TransactionSnapshot, error: &ErrorContext) {
        tracing::warn!("[{}] Request to {} failed: {}", request.id, request.url, error);
    }

    async fn on_connect_error(&self, request: &TransactionSnapshot, error: &ErrorContext) {
        tracing::warn!("[{}] CONNECT to {} failed: {}", request.id, request.url, error);
    }
}
