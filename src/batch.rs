//! # Batch Compressor
//!
//! Applies the single-image compressor across a list of sources with bounded
//! concurrency: sources are partitioned into fixed-size chunks, chunks run
//! strictly sequentially, and only the items inside one chunk run
//! concurrently. Unbounded parallel decode/encode of large uploads can spike
//! peak memory and CPU; the small chunk size trades throughput for a
//! predictable ceiling.
//!
//! Output order always matches input order — results are collected
//! positionally, never in completion order. Failure is fail-fast: the first
//! item error aborts the batch and propagates. Upload batches are small and
//! user-initiated, and the caller's fallback (keep the original image) is the
//! same whether one item failed or all did.

use std::future::Future;

use futures_util::future::try_join_all;
use log::{debug, info};
use serde_json::Value;

use crate::compress::{ImageResult, compress};
use crate::config::CompressionOptions;
use crate::error::{MediaError, MediaResult};
use crate::source::{self, ImageSource};

/// Number of images compressed concurrently; a deliberate throttle, not an
/// accidental constant.
pub const BATCH_CHUNK_SIZE: usize = 2;

/// Size threshold below which stored images are left alone by
/// [`recompress_data_uris`], in KB of estimated decoded size.
pub const RECOMPRESS_THRESHOLD_KB: f64 = 200.0;

/// Compress every source, preserving input order.
///
/// Chunk `N + 1` does not start until every future in chunk `N` has settled.
pub async fn compress_all(
    sources: Vec<ImageSource>,
    options: &CompressionOptions,
) -> MediaResult<Vec<ImageResult>> {
    options.validate()?;
    let total = sources.len();
    debug!("compressing {total} sources in chunks of {BATCH_CHUNK_SIZE}");
    run_chunked(sources, BATCH_CHUNK_SIZE, |src| compress(src, options)).await
}

/// Run `f` over `items` in sequential chunks of `chunk_size`, concurrently
/// within each chunk, collecting results in input order.
///
/// Factored out of [`compress_all`] so the chunk sequencing is observable
/// with an injected work function.
pub async fn run_chunked<T, R, F, Fut>(items: Vec<T>, chunk_size: usize, f: F) -> MediaResult<Vec<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = MediaResult<R>>,
{
    let chunk_size = chunk_size.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut pending = items;
    while !pending.is_empty() {
        let rest = pending.split_off(pending.len().min(chunk_size));
        let chunk = std::mem::replace(&mut pending, rest);
        results.extend(try_join_all(chunk.into_iter().map(&f)).await?);
    }
    Ok(results)
}

/// Outcome counts from a bulk recompression pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecompressStats {
    /// Entries inspected.
    pub total: usize,
    /// Entries already at or under the size threshold, left untouched.
    pub skipped: usize,
    /// Entries re-encoded and replaced.
    pub recompressed: usize,
    /// Entries in an opaque inline encoding, returned verbatim.
    pub passed_through: usize,
}

/// Recompress every oversized data URI in a stored `id → data URI` map.
///
/// Entries whose [`estimated_size_kb`](source::estimated_size_kb) is at or
/// under `threshold_kb` are skipped without decoding. Non-string values are
/// counted as skipped too — the store may hold nulls for listings without
/// photos. Fails fast on the first decode error, matching the batch policy.
///
/// This runs only behind the CLI's explicit `reprocess` command; bulk
/// mutation of the store must never happen as a side effect of loading the
/// library.
pub async fn recompress_data_uris(
    store: Value,
    options: &CompressionOptions,
    threshold_kb: f64,
) -> MediaResult<(Value, RecompressStats)> {
    options.validate()?;
    let Value::Object(entries) = store else {
        return Err(MediaError::decode(
            "expected a JSON object of id → data URI",
        ));
    };

    let mut stats = RecompressStats::default();
    let mut updated = serde_json::Map::with_capacity(entries.len());

    for (id, value) in entries {
        stats.total += 1;
        let Value::String(uri) = value else {
            stats.skipped += 1;
            updated.insert(id, value);
            continue;
        };

        if source::estimated_size_kb(&uri) <= threshold_kb {
            stats.skipped += 1;
            updated.insert(id, Value::String(uri));
            continue;
        }

        match compress(ImageSource::DataUri(uri), options).await? {
            ImageResult::Jpeg(img) => {
                debug!(
                    "recompressed '{id}' to {}x{} ({:.1} KB)",
                    img.width,
                    img.height,
                    img.estimated_size_kb()
                );
                stats.recompressed += 1;
                updated.insert(id, Value::String(img.to_data_uri()));
            }
            ImageResult::Passthrough(unchanged) => {
                stats.passed_through += 1;
                updated.insert(id, Value::String(unchanged));
            }
        }
    }

    info!(
        "recompression pass: {} total, {} recompressed, {} skipped, {} passed through",
        stats.total, stats.recompressed, stats.skipped, stats.passed_through
    );
    Ok((Value::Object(updated), stats))
}
