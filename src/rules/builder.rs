//! Canned responses for mock rules.

use crate::config::MockKind;
use crate::models::{MockBody, ResponseOverride};
use base64::Engine;
use once_cell::sync::Lazy;

/// 1x1 transparent GIF served in place of blocked images and videos.
pub const TRANSPARENT_GIF_DATA_URI: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAP///wAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw==";

/// Decoded bytes of [`TRANSPARENT_GIF_DATA_URI`].
pub static TRANSPARENT_GIF: Lazy<Vec<u8>> = Lazy::new(|| {
    let (_, data) = TRANSPARENT_GIF_DATA_URI
        .split_once(',')
        .unwrap_or_default();
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .unwrap_or_default()
});

pub const EMPTY_JSON_ARRAY: &str = "[]";

pub fn build_override(kind: MockKind) -> ResponseOverride {
    match kind {
        MockKind::Gif => ResponseOverride::new(
            200,
            "image/gif",
            MockBody::from(TRANSPARENT_GIF_DATA_URI),
        ),
        MockKind::EmptyJson => {
            ResponseOverride::new(200, "application/json", MockBody::from(EMPTY_JSON_ARRAY))
        }
    }
}
