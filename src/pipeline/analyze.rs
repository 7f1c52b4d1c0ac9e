use super::types::{BoundingBox, Category};
use image::RgbaImage;
use std::collections::HashMap;

/// Pixels with alpha below this are background and skipped.
const OPAQUE_THRESHOLD: u8 = 128;
/// Upper bound on sampled pixels; larger buffers are strided over.
const MAX_SAMPLES: usize = 10_000;
/// Channel quantization step: 256 levels collapse to multiples of 32.
const QUANT_STEP: u32 = 32;
/// Neutral gray used to pad the palette up to its minimum size.
const NEUTRAL_GRAY: &str = "#808080";

const MIN_COLORS: usize = 3;
const MAX_COLORS: usize = 5;

/// Extract a ranked palette of dominant colors from the masked buffer.
///
/// Transparent pixels are skipped, retained channels are quantized to
/// the nearest multiple of 32, and the top 5 quantized colors by
/// frequency are returned as `#rrggbb` strings. At most ~10,000 pixels
/// are sampled (striding over large buffers). The result always has at
/// least 3 entries, padded with a neutral gray sentinel.
pub fn extract_dominant_colors(pixels: &RgbaImage) -> Vec<String> {
    let raw = pixels.as_raw();
    let total = raw.len() / 4;
    let stride = (total / MAX_SAMPLES).max(1);

    let mut counts: HashMap<[u8; 3], u32> = HashMap::new();
    for idx in (0..total).step_by(stride) {
        let pixel = &raw[idx * 4..idx * 4 + 4];
        if pixel[3] < OPAQUE_THRESHOLD {
            continue;
        }
        let key = [quantize(pixel[0]), quantize(pixel[1]), quantize(pixel[2])];
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<([u8; 3], u32)> = counts.into_iter().collect();
    // Frequency descending, channel values as a deterministic tie-break.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut colors: Vec<String> = ranked
        .into_iter()
        .take(MAX_COLORS)
        .map(|([r, g, b], _)| format!("#{r:02x}{g:02x}{b:02x}"))
        .collect();
    while colors.len() < MIN_COLORS {
        colors.push(NEUTRAL_GRAY.to_string());
    }
    colors
}

/// The palette returned when no subject was detected: three neutral
/// gray sentinels.
pub fn fallback_palette() -> Vec<String> {
    vec![NEUTRAL_GRAY.to_string(); MIN_COLORS]
}

/// Round a channel to the nearest multiple of 32, capped at 255.
fn quantize(channel: u8) -> u8 {
    (((u32::from(channel) + QUANT_STEP / 2) / QUANT_STEP) * QUANT_STEP).min(255) as u8
}

/// Guess a clothing category from the subject's bounding-box geometry.
///
/// Wide boxes read as dresses laid flat, boxes hugging the top of the
/// frame as tops, the lower half as bottoms, and narrow centered boxes
/// as shoes. Pure function of its inputs; a suggestion, not a
/// classification.
pub fn detect_category(bounds: &BoundingBox, image_height: u32) -> Category {
    let box_width = bounds.width() as f32;
    let box_height = bounds.height().max(1) as f32;
    let aspect_ratio = box_width / box_height;
    let top_position = bounds.min_y as f32 / image_height.max(1) as f32;

    if aspect_ratio > 1.3 {
        Category::Dresses
    } else if top_position < 0.3 {
        Category::Tops
    } else if top_position > 0.5 {
        Category::Bottoms
    } else if aspect_ratio < 0.8 {
        Category::Shoes
    } else {
        Category::Tops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_rounds_to_nearest_multiple_of_32() {
        assert_eq!(quantize(0), 0);
        assert_eq!(quantize(15), 0);
        assert_eq!(quantize(16), 32);
        assert_eq!(quantize(100), 96);
        assert_eq!(quantize(200), 192);
        assert_eq!(quantize(255), 255);
    }

    #[test]
    fn transparent_buffer_yields_three_sentinels() {
        let pixels = RgbaImage::from_pixel(16, 16, image::Rgba([90, 10, 40, 0]));
        let colors = extract_dominant_colors(&pixels);
        assert_eq!(colors, vec!["#808080"; 3]);
    }

    #[test]
    fn solid_red_ranks_first_and_pads_to_minimum() {
        let pixels = RgbaImage::from_pixel(10, 10, image::Rgba([255, 0, 0, 255]));
        let colors = extract_dominant_colors(&pixels);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], "#ff0000");
        assert_eq!(colors[1], "#808080");
    }

    #[test]
    fn palette_is_capped_at_five() {
        // Eight distinct quantized columns; only the top five survive.
        let pixels = RgbaImage::from_fn(8, 8, |x, _| {
            image::Rgba([(x * 32) as u8, 0, 0, 255])
        });
        let colors = extract_dominant_colors(&pixels);
        assert_eq!(colors.len(), 5);
    }

    #[test]
    fn ranking_follows_frequency() {
        // 3/4 green, 1/4 blue.
        let pixels = RgbaImage::from_fn(8, 8, |x, _| {
            if x < 6 {
                image::Rgba([0, 255, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        });
        let colors = extract_dominant_colors(&pixels);
        assert_eq!(colors[0], "#00ff00");
        assert_eq!(colors[1], "#0000ff");
    }

    #[test]
    fn large_buffers_are_strided() {
        // 200x200 = 40,000 pixels -> stride 4; still produces a palette.
        let pixels = RgbaImage::from_pixel(200, 200, image::Rgba([64, 64, 64, 255]));
        let colors = extract_dominant_colors(&pixels);
        assert_eq!(colors[0], "#404040");
    }

    #[test]
    fn fallback_palette_is_three_grays() {
        assert_eq!(fallback_palette(), vec!["#808080"; 3]);
    }

    fn bounds(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[test]
    fn wide_box_is_dresses() {
        // aspect = 99/49 > 1.3
        assert_eq!(detect_category(&bounds(0, 0, 99, 49), 200), Category::Dresses);
    }

    #[test]
    fn high_box_is_tops() {
        // aspect = 50/100, top = 10/200 < 0.3
        assert_eq!(detect_category(&bounds(0, 10, 50, 110), 200), Category::Tops);
    }

    #[test]
    fn low_box_is_bottoms() {
        // top = 120/200 > 0.5
        assert_eq!(
            detect_category(&bounds(0, 120, 50, 190), 200),
            Category::Bottoms
        );
    }

    #[test]
    fn narrow_centered_box_is_shoes() {
        // top = 80/200 = 0.4, aspect = 30/60 = 0.5 < 0.8
        assert_eq!(
            detect_category(&bounds(0, 80, 30, 140), 200),
            Category::Shoes
        );
    }

    #[test]
    fn square_centered_box_defaults_to_tops() {
        // top = 0.4, aspect = 1.0
        assert_eq!(detect_category(&bounds(0, 80, 60, 140), 200), Category::Tops);
    }

    #[test]
    fn category_is_deterministic() {
        let b = bounds(0, 0, 99, 49);
        for _ in 0..10 {
            assert_eq!(detect_category(&b, 200), Category::Dresses);
        }
    }
}
