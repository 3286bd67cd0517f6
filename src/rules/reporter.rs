//! Side-channel reporting
//!
//! Captured payloads are posted to a collector outside the proxied
//! transaction. Delivery is best effort: the hook never waits for it and
//! failures only show up in the logs.

use crate::config::CollectorConfig;
use crate::error::{RuleError, RuleResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Form fields posted to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideChannelMessage {
    pub json: String,
}

/// Fire-and-forget sink for captured payloads.
pub trait Reporter: Send + Sync {
    /// Must return immediately; delivery happens in the background.
    fn report(&self, message: SideChannelMessage, path: &str);
}

/// Posts messages as `application/x-www-form-urlencoded` to the collector.
pub struct HttpReporter {
    base_url: String,
    client: reqwest::Client,
}

impl HttpReporter {
    pub fn new(config: &CollectorConfig) -> RuleResult<Self> {
        let mut builder = reqwest::Client::builder()
            .no_proxy()
            // Fresh connection per report
            .pool_max_idle_per_host(0);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RuleError::Config(format!("failed to create collector client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url(),
            client,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one report and drain the response. The response itself is not
    /// inspected.
    pub async fn deliver(
        client: &reqwest::Client,
        url: &str,
        message: &SideChannelMessage,
    ) -> RuleResult<()> {
        let to_delivery_error = |source| RuleError::ReportDelivery {
            url: url.to_string(),
            source,
        };
        let response = client
            .post(url)
            .form(message)
            .send()
            .await
            .map_err(to_delivery_error)?;
        let status = response.status();
        let drained = response.bytes().await.map_err(to_delivery_error)?;
        tracing::debug!(
            "Side-channel report to {} answered {} ({} bytes)",
            url,
            status.as_u16(),
            drained.len()
        );
        Ok(())
    }
}

impl Reporter for HttpReporter {
    fn report(&self, message: SideChannelMessage, path: &str) {
        let url = self.endpoint(path);
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No async runtime available, dropping report to {}", url);
                return;
            }
        };

        let client = self.client.clone();
        handle.spawn(async move {
            if let Err(e) = HttpReporter::deliver(&client, &url, &message).await {
                tracing::warn!("{}", e);
            }
        });
    }
}
