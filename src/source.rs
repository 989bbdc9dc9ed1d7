//! # Image Sources
//!
//! Upload flows hand the compressor images in three shapes: raw bytes from a
//! file picker, a URL pointing at already-hosted bytes, or an inline data URI
//! pulled back out of the remote store. [`ImageSource`] makes that an explicit
//! tagged union instead of runtime type-sniffing, and this module owns the
//! plumbing around it: data-URI parse/serialize, the cheap size estimate used
//! to skip compression for already-small images, and the remote fetch.

use std::sync::OnceLock;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::debug;

use crate::error::{MediaError, MediaResult};

/// One image input, consumed exactly once by the compressor.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Raw encoded bytes with a declared MIME type.
    Bytes { data: Vec<u8>, mime: String },
    /// A remote URL to fetch.
    RemoteUri(String),
    /// An inline data URI (self-describing MIME + transfer encoding).
    DataUri(String),
}

/// Outcome of normalizing a [`DataUri`](ImageSource::DataUri) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataUriPayload {
    /// `data:<mime>;base64,<payload>` — decodable raster bytes.
    Base64 { mime: String, data: Vec<u8> },
    /// Any other inline encoding. The compressor never reprocesses an
    /// encoding it does not recognize as a redecodable raster; the string is
    /// returned to the caller unchanged.
    Opaque,
}

/// Parse an inline data URI.
///
/// Only the `data:<mime>;base64,<payload>` form is treated as raw image
/// bytes. Everything else (percent-encoded SVG, foreign schemes, missing
/// `;base64` marker) classifies as [`DataUriPayload::Opaque`]. A string that
/// *claims* base64 but fails to decode is a hard [`MediaError::Decode`],
/// not a passthrough.
pub fn parse_data_uri(uri: &str) -> MediaResult<DataUriPayload> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Ok(DataUriPayload::Opaque);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Ok(DataUriPayload::Opaque);
    };
    let Some(mime) = header.strip_suffix(";base64") else {
        return Ok(DataUriPayload::Opaque);
    };

    let data = BASE64
        .decode(payload.trim())
        .map_err(|e| MediaError::decode(format!("invalid base64 payload: {e}")))?;
    Ok(DataUriPayload::Base64 {
        mime: mime.to_string(),
        data,
    })
}

/// Serialize encoded bytes as an inline data URI.
pub fn to_data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(data))
}

/// Estimate the decoded size in KB of an inline-encoded image without
/// decoding it.
///
/// Pure arithmetic: `len(s) * 0.75 / 1024`, the fixed base64 expansion ratio
/// applied to the textual length. Deliberately approximate — callers use it
/// to decide whether compression is worth running at all, not for billing.
pub fn estimated_size_kb(embedded: &str) -> f64 {
    embedded.len() as f64 * 0.75 / 1024.0
}

/// Best-guess MIME type for an image file path, by extension.
///
/// Only a hint: decoding sniffs the real format from the bytes. Unknown
/// extensions fall back to the generic binary type rather than an empty
/// string.
pub fn mime_for_path(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

/// Fetch a remote image source into a byte buffer.
///
/// The whole request (connect, headers, body) runs under one deadline so a
/// stalled origin cannot block a batch slot indefinitely. Non-2xx statuses
/// surface as [`MediaError::Fetch`].
pub async fn fetch_remote(url: &str, timeout: Duration) -> MediaResult<Vec<u8>> {
    debug!("fetching remote source: {url}");
    let request = async {
        let response = http_client()
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::fetch(url, e))?
            .error_for_status()
            .map_err(|e| MediaError::fetch(url, e))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::fetch(url, e))?;
        Ok::<_, MediaError>(bytes.to_vec())
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(MediaError::Timeout {
            url: url.to_string(),
            after_secs: timeout.as_secs(),
        }),
    }
}
