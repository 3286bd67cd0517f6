//! Response body decoding for captured payloads.

use crate::error::{RuleError, RuleResult};
use crate::models::snapshot::header_value;
use flate2::read::{DeflateDecoder, GzDecoder};
use std::collections::HashMap;
use std::io::{self, Read};

/// Hard cap on an inflated capture body
const MAX_DECODED_BODY_BYTES: u64 = 32 * 1024 * 1024;

/// Undo `Content-Encoding` and convert the body to text.
///
/// Invalid UTF-8 is replaced rather than rejected, so only a broken
/// compressed stream produces an error.
pub fn body_text(header: &HashMap<String, String>, body: &[u8]) -> RuleResult<String> {
    let encoding = header_value(header, "content-encoding")
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let decoded = match encoding.as_str() {
        "gzip" | "x-gzip" => inflate(GzDecoder::new(body), &encoding, MAX_DECODED_BODY_BYTES)?,
        "deflate" => inflate(DeflateDecoder::new(body), &encoding, MAX_DECODED_BODY_BYTES)?,
        _ => body.to_vec(),
    };

    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

fn inflate<R: Read>(decoder: R, encoding: &str, limit: u64) -> RuleResult<Vec<u8>> {
    let to_decode_error = |source| RuleError::Decode {
        encoding: encoding.to_string(),
        source,
    };
    let mut out = Vec::new();
    decoder
        .take(limit + 1)
        .read_to_end(&mut out)
        .map_err(to_decode_error)?;
    if out.len() as u64 > limit {
        return Err(to_decode_error(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("decoded body exceeds {} bytes", limit),
        )));
    }
    Ok(out)
}
