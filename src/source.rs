// THEORY:
// The image source is the collaborator that turns a file into a `RasterImage`.
// It owns everything the metrics engine deliberately knows nothing about: file
// I/O, container formats and the accepted-format policy (JPEG, PNG, WEBP, BMP).
// Unsupported inputs are rejected here, before any metric runs.
//
// The format is sniffed from the file contents first and from the extension only
// when sniffing fails. Whatever the source color type, the decoded image is
// converted to RGBA8.

use crate::core_modules::error::SourceError;
use crate::core_modules::image_profile::ImageProfile;
use crate::core_modules::raster::RasterImage;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

pub const SUPPORTED_MEDIA_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/bmp"];

/// A decoded image together with its source metadata and profile.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub name: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub raster: RasterImage,
    pub profile: ImageProfile,
}

/// Maps a detected format to its media type, if the engine accepts it.
pub fn supported_media_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

/// Decodes an in-memory encoded image.
pub fn decode_bytes(
    name: &str,
    bytes: &[u8],
    extension_hint: Option<&Path>,
) -> Result<LoadedImage, SourceError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|source| SourceError::Io {
            path: name.into(),
            source,
        })?;

    let format = reader
        .format()
        .or_else(|| extension_hint.and_then(|path| ImageFormat::from_path(path).ok()))
        .ok_or_else(|| SourceError::UnsupportedFormat {
            media_type: "unknown".to_string(),
        })?;
    let media_type = supported_media_type(format).ok_or_else(|| SourceError::UnsupportedFormat {
        media_type: format.to_mime_type().to_string(),
    })?;

    reader.set_format(format);
    let decoded = reader.decode().map_err(|source| SourceError::Decode {
        path: name.into(),
        source,
    })?;
    let raster = RasterImage::try_from(decoded.to_rgba8())?;
    let size_bytes = bytes.len() as u64;
    let profile = ImageProfile::analyze(name, media_type, size_bytes, &raster);

    debug!(name, media_type, width = raster.width(), height = raster.height(), "decoded image");
    Ok(LoadedImage {
        name: name.to_string(),
        media_type: media_type.to_string(),
        size_bytes,
        raster,
        profile,
    })
}

/// Reads and decodes an image file.
pub fn load_image(path: impl AsRef<Path>) -> Result<LoadedImage, SourceError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    decode_bytes(&name, &bytes, Some(path))
}
