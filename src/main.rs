use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde_json::json;

use lotpix::{CompressionOptions, ImageResult, ImageSource};

/// Listing-media toolbox for the vehicle marketplace:
/// - compress upload photos to catalog size (JPEG, fit within bounds, size budget)
/// - bulk-recompress oversized data URIs already in the store
/// - resolve the category-conditional field sets the UIs render from
#[derive(Parser, Debug)]
#[command(name = "lotpix")]
#[command(about = "Compress listing photos and resolve category field sets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress image files and write catalog-ready JPEGs
    Compress {
        /// Image files to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Maximum output width in pixels
        #[arg(long, default_value_t = 800)]
        max_width: u32,

        /// Maximum output height in pixels
        #[arg(long, default_value_t = 600)]
        max_height: u32,

        /// Initial JPEG quality in [0, 1]
        #[arg(short, long, default_value_t = 0.7)]
        quality: f32,

        /// Target size ceiling in KB (best effort)
        #[arg(long, default_value_t = 200)]
        max_kb: u32,

        /// Disable the size budget entirely
        #[arg(long)]
        no_budget: bool,

        /// Directory the JPEGs are written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Recompress oversized data URIs in a stored id → data URI JSON map
    ///
    /// This is the explicit entry point for bulk store maintenance; it never
    /// runs implicitly.
    Reprocess {
        /// JSON file holding the id → data URI map
        store: PathBuf,

        /// Skip entries at or under this estimated size in KB
        #[arg(long, default_value_t = 200.0)]
        threshold_kb: f64,

        /// Write the updated map here instead of back into the input file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the field mapping for a listing category as JSON
    Fields {
        /// Listing category
        #[arg(value_enum)]
        category: lotpix::Category,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Compress {
            files,
            max_width,
            max_height,
            quality,
            max_kb,
            no_budget,
            out_dir,
        } => {
            let options = CompressionOptions {
                max_width,
                max_height,
                quality,
                max_size_kb: if no_budget { None } else { Some(max_kb) },
                ..CompressionOptions::default()
            };
            run_compress(files, &options, &out_dir).await
        }
        Command::Reprocess {
            store,
            threshold_kb,
            out,
        } => run_reprocess(&store, threshold_kb, out.as_deref()).await,
        Command::Fields { category } => {
            let mapping = category.mapping();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "category": category.as_str(),
                    "primary_metric": mapping.primary_metric.as_str(),
                    "required_fields": mapping.required_fields,
                    "optional_fields": mapping.optional_fields,
                }))?
            );
            Ok(())
        }
    }
}

async fn run_compress(
    files: Vec<PathBuf>,
    options: &CompressionOptions,
    out_dir: &Path,
) -> Result<()> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut sources = Vec::with_capacity(files.len());
    for file in &files {
        let data = tokio::fs::read(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        // Extension-derived hint; decode sniffs the real format.
        sources.push(ImageSource::Bytes {
            data,
            mime: lotpix::source::mime_for_path(file).to_string(),
        });
    }

    let results = lotpix::compress_all(sources, options).await?;

    let mut summary = Vec::with_capacity(results.len());
    for (file, result) in files.iter().zip(results) {
        match result {
            ImageResult::Jpeg(img) => {
                let out_path = output_path(out_dir, file)?;
                tokio::fs::write(&out_path, &img.bytes)
                    .await
                    .with_context(|| format!("writing {}", out_path.display()))?;
                info!(
                    "{} -> {} ({}x{}, {:.1} KB)",
                    file.display(),
                    out_path.display(),
                    img.width,
                    img.height,
                    img.estimated_size_kb()
                );
                summary.push(json!({
                    "input": file.display().to_string(),
                    "output": out_path.display().to_string(),
                    "width": img.width,
                    "height": img.height,
                    "quality": img.quality,
                    "attempts": img.attempts,
                    "size_kb": img.estimated_size_kb(),
                }));
            }
            // File inputs are raw bytes, never opaque inline encodings.
            ImageResult::Passthrough(_) => {
                return Err(anyhow!("unexpected passthrough for {}", file.display()));
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&json!(summary))?);
    Ok(())
}

fn output_path(out_dir: &Path, input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| anyhow!("{} has no file name", input.display()))?;
    let mut name = stem.to_os_string();
    name.push(".jpg");
    Ok(out_dir.join(name))
}

async fn run_reprocess(store: &Path, threshold_kb: f64, out: Option<&Path>) -> Result<()> {
    let raw = tokio::fs::read_to_string(store)
        .await
        .with_context(|| format!("reading {}", store.display()))?;
    let map: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", store.display()))?;

    let options = CompressionOptions::default();
    let (updated, stats) = lotpix::recompress_data_uris(map, &options, threshold_kb).await?;

    let target = out.unwrap_or(store);
    tokio::fs::write(target, serde_json::to_string_pretty(&updated)?)
        .await
        .with_context(|| format!("writing {}", target.display()))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "total": stats.total,
            "recompressed": stats.recompressed,
            "skipped": stats.skipped,
            "passed_through": stats.passed_through,
            "output": target.display().to_string(),
        }))?
    );
    Ok(())
}
