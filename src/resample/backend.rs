//! Resample backend trait and shared types.
//!
//! The [`ResampleBackend`] trait covers the two operations the cache needs:
//! identify (read source dimensions) and render (decode, downscale, encode).
//! Parameter structs describe *what* to produce, not *how* — the backend owns
//! the pixel work, which keeps the cache and orchestrator testable against a
//! recording mock.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Lossy encoding quality (0-100). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Variant encoding, keyed by the source file extension.
///
/// The cached variant keeps the source's file name, so the extension-implied
/// content type stays truthful: `.png` stays PNG, `.gif` stays GIF, and
/// everything else becomes JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantFormat {
    Png,
    Gif,
    Jpeg,
}

impl VariantFormat {
    pub fn from_source(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => Self::Png,
            Some("gif") => Self::Gif,
            _ => Self::Jpeg,
        }
    }
}

/// Full specification for one variant render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source: PathBuf,
    /// Exact output width.
    pub width: u32,
    /// Exact output height (pre-computed by [`plan_resize`](super::plan_resize)).
    pub height: u32,
    pub format: VariantFormat,
    /// Applies to JPEG output only.
    pub quality: Quality,
}

/// Trait for resample backends.
///
/// Implementations must be `Sync`: the cache warmer renders across a rayon
/// pool with one shared backend.
pub trait ResampleBackend: Sync {
    /// Read source dimensions without a full decode where the format allows.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode the source, downscale to exactly the planned dimensions, and
    /// return the encoded variant bytes.
    fn render(&self, params: &RenderParams) -> Result<Vec<u8>, BackendError>;
}
