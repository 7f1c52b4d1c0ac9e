use crate::error::CutoutError;
use image::{imageops, RgbaImage};

/// Compute target dimensions that fit within the given bounds while
/// preserving aspect ratio.
///
/// Returns the dimensions unchanged when both already fit. Otherwise
/// scales down uniformly so the binding dimension equals its bound and
/// rounds the other to the nearest pixel. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height));
    let scaled_w = (f64::from(width) * scale).round().max(1.0) as u32;
    let scaled_h = (f64::from(height) * scale).round().max(1.0) as u32;
    (scaled_w, scaled_h)
}

/// Decode raw image bytes into an RGBA pixel buffer.
///
/// Decoding of arbitrary input encodings is delegated to the `image`
/// codecs; unsupported or corrupt data is fatal for the run.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, CutoutError> {
    if bytes.is_empty() {
        return Err(CutoutError::EmptyInput);
    }
    let decoded = image::load_from_memory(bytes).map_err(CutoutError::Decode)?;
    Ok(decoded.to_rgba8())
}

/// Resample into a fresh buffer bounded by `max_width` x `max_height`,
/// or return the buffer unchanged when it already fits.
pub fn resize_to_fit(image: RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (target_w, target_h) = fit_within(width, height, max_width, max_height);
    if (target_w, target_h) == (width, height) {
        return image;
    }

    tracing::debug!(
        "Resizing {}x{} -> {}x{} (bounds {}x{})",
        width,
        height,
        target_w,
        target_h,
        max_width,
        max_height
    );
    imageops::resize(&image, target_w, target_h, imageops::FilterType::Lanczos3)
}
