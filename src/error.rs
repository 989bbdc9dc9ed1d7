//! Error taxonomy for the listing-media pipeline.
//!
//! The library keeps a typed error enum so callers can distinguish "the bytes
//! were not an image" from "the network failed" and fall back accordingly
//! (upload forms degrade to the original, uncompressed image on any error).
//! The binary boundary wraps these in `anyhow` for reporting.

use std::fmt;

/// Result alias used throughout the library.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors produced by the compression pipeline.
#[derive(Debug)]
pub enum MediaError {
    /// Input bytes could not be interpreted as a raster image.
    Decode { reason: String },
    /// A remote image source could not be fetched.
    Fetch { url: String, reason: String },
    /// Fetching a remote source exceeded the configured deadline.
    Timeout { url: String, after_secs: u64 },
    /// Resampling the decoded raster failed.
    Resize { reason: String },
    /// JPEG re-encoding failed.
    Encode(image::ImageError),
    /// Rejected [`CompressionOptions`](crate::config::CompressionOptions).
    InvalidOptions { field: &'static str, reason: String },
    /// File I/O on a local source or output path.
    Io(std::io::Error),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Decode { reason } => write!(f, "image decode failed: {reason}"),
            MediaError::Fetch { url, reason } => write!(f, "fetch of '{url}' failed: {reason}"),
            MediaError::Timeout { url, after_secs } => {
                write!(f, "fetch of '{url}' timed out after {after_secs}s")
            }
            MediaError::Resize { reason } => write!(f, "raster resize failed: {reason}"),
            MediaError::Encode(e) => write!(f, "jpeg encode failed: {e}"),
            MediaError::InvalidOptions { field, reason } => {
                write!(f, "invalid compression option '{field}': {reason}")
            }
            MediaError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MediaError::Encode(e) => Some(e),
            MediaError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl MediaError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    pub(crate) fn fetch(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
