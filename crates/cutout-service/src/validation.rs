use std::io::Cursor;

use cutout_core::{AppError, AppResult};
use image::ImageReader;

/// Basic facts about a decoded upload, extracted without a full pixel decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
}

impl ImageInfo {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Checks that `bytes` is a decodable image whose dimensions stay under
/// `max_pixels`. Only the header is parsed here; the pixel data is decoded
/// later, inside the worker.
pub fn validate_image_bytes(bytes: &[u8], max_pixels: u64) -> AppResult<ImageInfo> {
    if bytes.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| {
            AppError::validation(format!("Unable to inspect image data: {err}"))
        })?;

    let format = reader
        .format()
        .ok_or_else(|| AppError::validation("Unrecognized image format"))?;

    let (width, height) = reader.into_dimensions().map_err(|err| {
        AppError::validation(format!("Invalid or corrupted image file: {err}"))
    })?;

    let info = ImageInfo {
        width,
        height,
        format: format!("{format:?}").to_lowercase(),
    };

    if info.pixel_count() > max_pixels {
        return Err(AppError::validation(format!(
            "Image is {width}x{height} ({} pixels), which exceeds the limit of {max_pixels} pixels",
            info.pixel_count()
        )));
    }

    Ok(info)
}
