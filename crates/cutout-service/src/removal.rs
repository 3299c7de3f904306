use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use cutout_core::traits::BackgroundRemover;
use cutout_core::{AppError, AppResult};
use cutout_entity::RemovalOptions;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tokio::sync::Semaphore;
use tracing::debug;

/// Runs a single image through the removal model and post-processes the
/// returned matte. Model calls are throttled by a shared semaphore so the
/// inference backend never sees more than the configured number of
/// concurrent requests, regardless of how many worker slots are active.
#[derive(Debug, Clone)]
pub struct RemovalService {
    remover: Arc<dyn BackgroundRemover>,
    inference_guard: Arc<Semaphore>,
}

impl RemovalService {
    pub fn new(remover: Arc<dyn BackgroundRemover>, inference_concurrency: usize) -> Self {
        Self {
            remover,
            inference_guard: Arc::new(Semaphore::new(inference_concurrency.max(1))),
        }
    }

    /// Removes the background from `image` and applies the requested alpha
    /// refinement. The output is always an RGBA PNG.
    pub async fn process(&self, image: Bytes, options: RemovalOptions) -> AppResult<Bytes> {
        let _permit = self
            .inference_guard
            .acquire()
            .await
            .map_err(|_| AppError::internal("Inference semaphore closed"))?;

        let cutout = self.remover.remove(image).await?;
        drop(_permit);

        // Pixel work is CPU-bound, keep it off the async runtime.
        let refined = tokio::task::spawn_blocking(move || refine_alpha(&cutout, &options))
            .await
            .map_err(|err| AppError::internal("Alpha refinement task panicked").caused_by(err))??;

        Ok(refined)
    }
}

/// Decodes the model output, applies alpha boost and edge feathering, and
/// re-encodes as PNG. Runs even for default options so the result is
/// guaranteed to be a well-formed RGBA PNG no matter what the model emits.
pub fn refine_alpha(png: &[u8], options: &RemovalOptions) -> AppResult<Bytes> {
    let decoded = image::load_from_memory(png).map_err(|err| {
        AppError::external("Remover returned undecodable image data").caused_by(err)
    })?;
    let mut rgba = decoded.into_rgba8();

    if (options.alpha_boost - 1.0).abs() > f32::EPSILON {
        boost_alpha(&mut rgba, options.alpha_boost);
    }

    let radius = options.feather_radius.round() as u32;
    if radius > 0 {
        feather_alpha(&mut rgba, radius);
    }

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|err| AppError::internal("Failed to encode refined PNG").caused_by(err))?;

    debug!(output_len = out.len(), "Alpha refinement finished");
    Ok(Bytes::from(out))
}

fn boost_alpha(img: &mut RgbaImage, factor: f32) {
    for pixel in img.pixels_mut() {
        let boosted = (f32::from(pixel[3]) * factor).clamp(0.0, 255.0);
        pixel[3] = boosted.round() as u8;
    }
}

/// Softens mask edges with a separable box blur over the alpha channel.
/// Color channels are left untouched.
fn feather_alpha(img: &mut RgbaImage, radius: u32) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let radius = radius as i64;

    let mut alpha: Vec<u32> =
        img.pixels().map(|p| u32::from(p[3])).collect();
    let mut scratch = vec![0u32; alpha.len()];

    // Horizontal pass.
    for y in 0..height as i64 {
        let row = y * width as i64;
        for x in 0..width as i64 {
            let lo = (x - radius).max(0);
            let hi = (x + radius).min(width as i64 - 1);
            let sum: u32 = ((row + lo)..=(row + hi)).map(|i| alpha[i as usize]).sum();
            scratch[(row + x) as usize] = sum / (hi - lo + 1) as u32;
        }
    }

    // Vertical pass.
    for x in 0..width as i64 {
        for y in 0..height as i64 {
            let lo = (y - radius).max(0);
            let hi = (y + radius).min(height as i64 - 1);
            let sum: u32 = (lo..=hi)
                .map(|yy| scratch[(yy * width as i64 + x) as usize])
                .sum();
            alpha[(y * width as i64 + x) as usize] = sum / (hi - lo + 1) as u32;
        }
    }

    for (i, pixel) in img.pixels_mut().enumerate() {
        pixel[3] = alpha[i].min(255) as u8;
    }
}
