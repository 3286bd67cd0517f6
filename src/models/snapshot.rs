//! Transaction snapshots
//!
//! Read-only views of a single HTTP transaction, built by the proxy host for
//! each hook invocation and dropped once the hook returns.

use crate::error::{RuleError, RuleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Connect,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Trace => "TRACE",
        }
    }
}

/// Transport protocol of the intercepted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }
}

/// Request line and headers as the host parsed them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub host: String,
    pub port: u16,
    /// Request path (including query string)
    pub path: String,
    pub headers: HashMap<String, String>,
}

/// Request-side view handed to every hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    /// Host-assigned identifier, used to correlate log lines across phases
    pub id: String,
    pub protocol: Protocol,
    /// Full request URL
    pub url: String,
    pub request_options: RequestOptions,
    /// Request body (empty when the request has none)
    pub request_data: Vec<u8>,
    /// Set by the host on CONNECT when the client asked for local content
    pub replace_local_file: bool,
}

impl TransactionSnapshot {
    /// Build a snapshot from a full URL, deriving protocol, host, port and path.
    pub fn from_url(method: HttpMethod, url: &str) -> RuleResult<Self> {
        let parsed = url::Url::parse(url).map_err(|_| RuleError::InvalidUrl(url.to_string()))?;
        let protocol = match parsed.scheme() {
            "http" => Protocol::Http,
            "https" => Protocol::Https,
            _ => return Err(RuleError::InvalidUrl(url.to_string())),
        };
        let host = parsed
            .host_str()
            .ok_or_else(|| RuleError::InvalidUrl(url.to_string()))?
            .to_string();
        let port = parsed.port().unwrap_or_else(|| protocol.default_port());
        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            protocol,
            url: url.to_string(),
            request_options: RequestOptions {
                method,
                host,
                port,
                path,
                headers: HashMap::new(),
            },
            request_data: Vec::new(),
            replace_local_file: false,
        })
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.request_options
            .headers
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.request_data = body.into();
        self
    }

    pub fn with_replace_local_file(mut self, replace: bool) -> Self {
        self.replace_local_file = replace;
        self
    }

    /// Case-insensitive request header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.request_options.headers, name)
    }
}

/// Upstream response as received by the host, before it is relayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    pub header: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            header: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.header.insert(name.to_string(), value.to_string());
        self
    }

    /// Case-insensitive response header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        header_value(&self.header, name)
    }
}

/// Response-phase view wrapping the upstream response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDetail {
    pub response: ResponseSnapshot,
}

impl From<ResponseSnapshot> for ResponseDetail {
    fn from(response: ResponseSnapshot) -> Self {
        Self { response }
    }
}

/// Which upstream operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UpstreamRequest,
    UpstreamConnect,
}

/// Failure reported by the host to the error hooks. Carries no schema beyond
/// a description of what went wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorContext {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(kind: ErrorKind, error: &(dyn std::error::Error + 'static)) -> Self {
        Self::new(kind, error.to_string())
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

pub(crate) fn header_value<'a>(
    headers: &'a HashMap<String, String>,
    name: &str,
) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
