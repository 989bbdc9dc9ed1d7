//! # Compression Configuration
//!
//! Options shared by the single-image and batch compressors. Every field has
//! a documented default so upload flows can call the pipeline with
//! `CompressionOptions::default()` and only override what they care about.
//!
//! ## Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `max_width` | `u32` | 800 | Pixel bound on output width |
//! | `max_height` | `u32` | 600 | Pixel bound on output height |
//! | `quality` | `f32` | 0.7 | Initial JPEG quality in [0, 1] |
//! | `max_size_kb` | `Option<u32>` | `Some(200)` | Target output size ceiling |
//! | `fetch_timeout` | `Duration` | 30 s | Deadline for remote sources |
//!
//! The size ceiling is best effort: the quality-reduction loop compounds
//! `quality * 0.8` per attempt (floor 0.1) for at most 5 attempts and then
//! returns the last encode even if it is still over budget.

use std::time::Duration;

use crate::error::{MediaError, MediaResult};

/// Multiplicative quality reduction applied per convergence attempt.
pub const QUALITY_STEP: f32 = 0.8;

/// Lowest quality the reduction loop will encode at.
pub const QUALITY_FLOOR: f32 = 0.1;

/// Hard ceiling on re-encode attempts, independent of convergence.
pub const MAX_QUALITY_ATTEMPTS: u32 = 5;

/// Configuration for a compression run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOptions {
    /// Maximum output width in pixels. Larger inputs are scaled down to fit,
    /// preserving aspect ratio; smaller inputs are never upscaled.
    pub max_width: u32,

    /// Maximum output height in pixels.
    pub max_height: u32,

    /// Initial JPEG encode quality in `[0, 1]`.
    pub quality: f32,

    /// Target upper bound on encoded size, measured through the data-URI
    /// length proxy (`len * 0.75 / 1024`). `None` disables the reduction
    /// loop entirely.
    pub max_size_kb: Option<u32>,

    /// Deadline for fetching a remote source. The original pipeline had no
    /// timeout at all; a hung fetch would stall its batch slot indefinitely,
    /// so the rewrite bounds it explicitly.
    pub fetch_timeout: Duration,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
            quality: 0.7,
            max_size_kb: Some(200),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl CompressionOptions {
    /// Validate the options before any decode work starts.
    ///
    /// Rejects zero pixel bounds, a quality outside `[0, 1]`, and a zero
    /// size budget (which could never be met and would always exhaust the
    /// attempt cap).
    pub fn validate(&self) -> MediaResult<()> {
        if self.max_width == 0 {
            return Err(MediaError::InvalidOptions {
                field: "max_width",
                reason: "must be at least 1 pixel".to_string(),
            });
        }
        if self.max_height == 0 {
            return Err(MediaError::InvalidOptions {
                field: "max_height",
                reason: "must be at least 1 pixel".to_string(),
            });
        }
        if !self.quality.is_finite() || !(0.0..=1.0).contains(&self.quality) {
            return Err(MediaError::InvalidOptions {
                field: "quality",
                reason: format!("{} is outside [0, 1]", self.quality),
            });
        }
        if self.max_size_kb == Some(0) {
            return Err(MediaError::InvalidOptions {
                field: "max_size_kb",
                reason: "must be positive; use None to disable the budget".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = CompressionOptions::default();
        assert_eq!(opts.max_width, 800);
        assert_eq!(opts.max_height, 600);
        assert_eq!(opts.quality, 0.7);
        assert_eq!(opts.max_size_kb, Some(200));
        assert_eq!(opts.fetch_timeout, Duration::from_secs(30));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_fields() {
        let mut opts = CompressionOptions::default();

        opts.max_width = 0;
        assert!(opts.validate().is_err());
        opts.max_width = 800; // Reset

        opts.max_height = 0;
        assert!(opts.validate().is_err());
        opts.max_height = 600; // Reset

        opts.quality = 1.5;
        assert!(opts.validate().is_err());
        opts.quality = -0.1;
        assert!(opts.validate().is_err());
        opts.quality = f32::NAN;
        assert!(opts.validate().is_err());
        opts.quality = 0.7; // Reset

        opts.max_size_kb = Some(0);
        assert!(opts.validate().is_err());
        opts.max_size_kb = None;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_quality_bounds_are_inclusive() {
        let mut opts = CompressionOptions::default();
        opts.quality = 0.0;
        assert!(opts.validate().is_ok());
        opts.quality = 1.0;
        assert!(opts.validate().is_ok());
    }
}
