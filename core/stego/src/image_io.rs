//! Image decoding into a [`PixelChannel`] and lossless persistence.
//!
//! Embedded bits live in sample LSBs, which any lossy codec destroys, so
//! channels are only ever written as PNG.

use image::{ImageError, ImageFormat, RgbImage};
use std::path::Path;
use tracing::{debug, info};

use crate::channel::PixelChannel;
use encrypto_common::{Error, Result};

/// Default file name for steganographic output.
pub const DEFAULT_OUTPUT_FILENAME: &str = "encrypto.png";

/// Decode an image and convert it to 8-bit RGB samples.
///
/// Any decodable format is accepted as a cover. Images being read back for
/// extraction must have been stored losslessly.
///
/// # Errors
/// - [`Error::NotFound`] if the file does not exist
/// - [`Error::Image`] if the file cannot be decoded
pub fn load(path: &Path) -> Result<PixelChannel> {
    let decoded = image::open(path).map_err(|e| map_image_error(path, e))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    debug!(path = %path.display(), width, height, "Loaded image");
    PixelChannel::from_rgb(width, height, rgb.into_raw())
}

/// Write a channel as a PNG file.
///
/// # Errors
/// - [`Error::Image`] if encoding fails
/// - [`Error::Io`] if the file cannot be written
pub fn save_png(channel: PixelChannel, path: &Path) -> Result<()> {
    let (width, height) = (channel.width(), channel.height());
    let image = RgbImage::from_raw(width, height, channel.into_samples())
        .ok_or_else(|| Error::Image("Sample buffer does not match dimensions".to_string()))?;

    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| map_image_error(path, e))?;

    info!(path = %path.display(), width, height, "Wrote image");
    Ok(())
}

fn map_image_error(path: &Path, err: ImageError) -> Error {
    match err {
        ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            Error::NotFound(path.to_path_buf())
        }
        ImageError::IoError(io) => Error::Io(io),
        other => Error::Image(other.to_string()),
    }
}
