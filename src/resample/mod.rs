//! Image resampling — pure Rust, zero external dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Downscale** | `image::imageops` with `Lanczos3` |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` (quality-carrying) |
//! | **Encode → PNG / GIF** | `image::codecs::{png, gif}` |
//!
//! The module is split into:
//! - **Calculations**: pure dimension math (unit testable without pixels)
//! - **Backend**: [`ResampleBackend`] trait, parameter and error types
//! - **Rust backend**: the production implementation on the `image` crate

pub mod backend;
mod calculations;
pub mod rust_backend;

pub use backend::{
    BackendError, Dimensions, Quality, RenderParams, ResampleBackend, VariantFormat,
};
pub use calculations::{ResizePlan, plan_resize};
pub use rust_backend::{RustBackend, supported_source_extensions};
