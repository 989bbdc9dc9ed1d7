//! # lotpix: Listing-Media Pipeline
//!
//! Image compression and listing-field resolution for a vehicle-marketplace
//! application (trucks, machinery, agriculture equipment). Upload forms hand
//! this crate raw files, URLs, or stored data URIs; it hands back re-encoded
//! JPEGs sized for the catalog, ready to push to the remote store.
//!
//! ## Architecture
//!
//! - `compress`: single-image adaptive compressor (fit-within-box resize,
//!   white-background flatten, iterative quality reduction under a size
//!   budget)
//! - `batch`: chunked batch compression with bounded concurrency, plus the
//!   bulk store-recompression pass
//! - `source`: the `ImageSource` tagged union, data-URI plumbing, and the
//!   decode-free size estimate
//! - `config`: compression options with documented defaults and validation
//! - `error`: typed error taxonomy (decode vs. fetch vs. options)
//! - `fields` (the `lot-fields` member crate): category → field-set lookup
//!   shared by the listing form and the search filters
//!
//! ## Example
//!
//! ```rust,no_run
//! use lotpix::{CompressionOptions, ImageSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = CompressionOptions::default(); // 800x600, q 0.7, 200 KB
//! let photo = ImageSource::Bytes {
//!     data: std::fs::read("truck.png")?,
//!     mime: "image/png".to_string(),
//! };
//!
//! let result = lotpix::compress(photo, &options).await?;
//! println!("{}", result.to_data_uri());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod compress;
pub mod config;
pub mod error;
pub mod source;

/// Category-conditional field resolution (member crate re-export).
pub use lot_fields as fields;

pub use batch::{BATCH_CHUNK_SIZE, RecompressStats, compress_all, recompress_data_uris};
pub use compress::{CompressedImage, ImageResult, compress};
pub use config::CompressionOptions;
pub use error::{MediaError, MediaResult};
pub use lot_fields::{Category, FieldMapping, Metric, UnknownCategory, fields_for};
pub use source::{ImageSource, estimated_size_kb};
