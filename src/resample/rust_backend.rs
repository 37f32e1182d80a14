//! Pure Rust resample backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header read, no full decode) |
//! | Decode (JPEG, PNG, GIF) | `image` crate pure Rust decoders |
//! | Downscale | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder` |
//! | Encode → GIF | `GifEncoder::encode_frame` |

use super::backend::{BackendError, Dimensions, Quality, RenderParams, ResampleBackend, VariantFormat};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Frame, ImageEncoder, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Extensions whose decoders are compiled in.
const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Image file extensions this backend can decode, lowercase.
pub fn supported_source_extensions() -> &'static [&'static str] {
    SOURCE_EXTENSIONS
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: image::ImageError) -> BackendError {
    match err {
        image::ImageError::IoError(e) => BackendError::Io(e),
        other => BackendError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

/// Load and decode a source image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| decode_error(path, e))
}

/// Encode an already-resized image into the variant format.
fn encode(
    img: &DynamicImage,
    format: VariantFormat,
    quality: Quality,
    source: &Path,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let result = match format {
        VariantFormat::Png => img.write_with_encoder(PngEncoder::new(Cursor::new(&mut buf))),
        VariantFormat::Gif => {
            GifEncoder::new(Cursor::new(&mut buf)).encode_frame(Frame::new(img.to_rgba8()))
        }
        VariantFormat::Jpeg => {
            // JPEG has no alpha channel; flatten before encoding.
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality.value()).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
        }
    };
    result.map_err(|e| BackendError::Encode {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(buf)
}

impl ResampleBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn render(&self, params: &RenderParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode(&resized, params.format, params.quality, &params.source)
    }
}
