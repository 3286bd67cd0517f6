//! Decisions returned by rule hooks.

use crate::error::{RuleError, RuleResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DATA_URI_PREFIX: &str = "data:";

/// Body of a mocked response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MockBody {
    /// Literal text. A value starting with `data:` is a data URI and is
    /// served as its decoded content.
    Text(String),
    Binary(Vec<u8>),
}

impl MockBody {
    pub fn is_data_uri(&self) -> bool {
        matches!(self, MockBody::Text(text) if text.starts_with(DATA_URI_PREFIX))
    }

    /// Bytes the host should write to the client.
    pub fn resolve(&self) -> RuleResult<Vec<u8>> {
        match self {
            MockBody::Text(text) if text.starts_with(DATA_URI_PREFIX) => decode_data_uri(text),
            MockBody::Text(text) => Ok(text.as_bytes().to_vec()),
            MockBody::Binary(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<&str> for MockBody {
    fn from(value: &str) -> Self {
        MockBody::Text(value.to_string())
    }
}

/// `data:[<mediatype>][;base64],<data>`
fn decode_data_uri(uri: &str) -> RuleResult<Vec<u8>> {
    let rest = &uri[DATA_URI_PREFIX.len()..];
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| RuleError::InvalidDataUri("missing `,` separator".to_string()))?;

    if meta.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| RuleError::InvalidDataUri(e.to_string()))
    } else {
        Ok(data.as_bytes().to_vec())
    }
}

/// Full replacement response. Returning one short-circuits the upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOverride {
    pub status_code: u16,
    pub header: HashMap<String, String>,
    pub body: MockBody,
}

impl ResponseOverride {
    pub fn new(status_code: u16, content_type: &str, body: MockBody) -> Self {
        let mut header = HashMap::new();
        header.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status_code,
            header,
            body,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        crate::models::snapshot::header_value(&self.header, "content-type")
    }
}

/// Outcome of a request- or response-phase hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Decision {
    /// Leave the transaction untouched
    #[default]
    PassThrough,
    /// Answer the client with this response instead
    Respond(ResponseOverride),
}

impl Decision {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Decision::PassThrough)
    }

    pub fn response(&self) -> Option<&ResponseOverride> {
        match self {
            Decision::Respond(response) => Some(response),
            Decision::PassThrough => None,
        }
    }
}

/// Local content served in place of a CONNECT tunnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileResponse {
    pub status_code: u16,
    pub header: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Outcome of the CONNECT-phase hook. Hooks return `Option<ConnectDecision>`,
/// where `None` leaves the choice to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectDecision {
    /// MITM the tunnel so later phases see decrypted traffic
    Intercept,
    /// Relay the encrypted tunnel untouched
    Tunnel,
    ServeLocalFile(LocalFileResponse),
}

impl ConnectDecision {
    pub fn from_intercept(intercept: bool) -> Self {
        if intercept {
            ConnectDecision::Intercept
        } else {
            ConnectDecision::Tunnel
        }
    }

    /// Boolean form expected by hosts that only understand intercept/tunnel.
    /// `None` for `ServeLocalFile`, which is not a tunnel decision.
    pub fn as_intercept(&self) -> Option<bool> {
        match self {
            ConnectDecision::Intercept => Some(true),
            ConnectDecision::Tunnel => Some(false),
            ConnectDecision::ServeLocalFile(_) => None,
        }
    }
}
