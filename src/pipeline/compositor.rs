use super::types::{BoundingBox, SegmentationMask};
use image::RgbaImage;

/// Confidence above which a pixel counts toward the subject bounding box.
const SUBJECT_THRESHOLD: f32 = 0.5;

/// Result of applying a segmentation mask to a pixel buffer.
#[derive(Debug)]
pub enum MaskOutcome {
    /// A subject was found: alpha carries the mask confidence and
    /// `bounds` covers every pixel above the confidence threshold.
    Subject {
        pixels: RgbaImage,
        bounds: BoundingBox,
    },
    /// No pixel exceeded the confidence threshold. The buffer is
    /// returned untouched so the caller can pass the original through.
    NoSubject(RgbaImage),
}

/// Drive the alpha channel of `pixels` from the mask confidences and
/// compute the subject bounding box.
///
/// Alpha is a linear pass-through of the confidence (soft edges are
/// preserved); the bounding box accumulates pixels with confidence
/// strictly above 0.5.
///
/// # Panics
///
/// Panics if the mask dimensions do not match the pixel buffer. A
/// mismatch is a programmer error, never silently truncated.
pub fn apply_mask(mut pixels: RgbaImage, mask: &SegmentationMask) -> MaskOutcome {
    assert_eq!(
        (mask.width(), mask.height()),
        pixels.dimensions(),
        "mask dimensions must match pixel buffer dimensions"
    );

    let (width, height) = pixels.dimensions();
    let mut bounds: Option<BoundingBox> = None;
    for y in 0..height {
        for x in 0..width {
            if mask.confidence(x, y) > SUBJECT_THRESHOLD {
                bounds = Some(match bounds {
                    None => BoundingBox {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    },
                    Some(b) => BoundingBox {
                        min_x: b.min_x.min(x),
                        min_y: b.min_y.min(y),
                        max_x: b.max_x.max(x),
                        max_y: b.max_y.max(y),
                    },
                });
            }
        }
    }

    let Some(bounds) = bounds else {
        tracing::debug!("No pixel exceeded confidence {SUBJECT_THRESHOLD}, passing through");
        return MaskOutcome::NoSubject(pixels);
    };

    for (x, y, pixel) in pixels.enumerate_pixels_mut() {
        let confidence = mask.confidence(x, y).clamp(0.0, 1.0);
        pixel.0[3] = (confidence * 255.0).round() as u8;
    }

    MaskOutcome::Subject { pixels, bounds }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba([200, 50, 50, 255]))
    }

    fn uniform_mask(width: u32, height: u32, confidence: f32) -> SegmentationMask {
        SegmentationMask::new(
            width,
            height,
            vec![confidence; (width * height) as usize],
        )
    }

    #[test]
    #[should_panic(expected = "mask dimensions must match")]
    fn rejects_mismatched_dimensions() {
        let _ = apply_mask(opaque(4, 4), &uniform_mask(4, 5, 1.0));
    }

    #[test]
    fn full_confidence_covers_entire_image() {
        match apply_mask(opaque(8, 6), &uniform_mask(8, 6, 1.0)) {
            MaskOutcome::Subject { pixels, bounds } => {
                assert_eq!(
                    bounds,
                    BoundingBox {
                        min_x: 0,
                        min_y: 0,
                        max_x: 7,
                        max_y: 5,
                    }
                );
                assert!(pixels.pixels().all(|p| p.0[3] == 255));
            }
            MaskOutcome::NoSubject(_) => panic!("expected a subject"),
        }
    }

    #[test]
    fn all_zero_mask_passes_buffer_through_unchanged() {
        let original = opaque(5, 5);
        let before = original.as_raw().clone();
        match apply_mask(original, &uniform_mask(5, 5, 0.0)) {
            MaskOutcome::NoSubject(pixels) => assert_eq!(pixels.as_raw(), &before),
            MaskOutcome::Subject { .. } => panic!("expected no subject"),
        }
    }

    #[test]
    fn threshold_is_strict() {
        // Exactly 0.5 does not count as subject.
        match apply_mask(opaque(3, 3), &uniform_mask(3, 3, 0.5)) {
            MaskOutcome::NoSubject(_) => {}
            MaskOutcome::Subject { .. } => panic!("0.5 must not exceed the threshold"),
        }
    }

    #[test]
    fn bounding_box_tracks_confident_region() {
        let mut data = vec![0.0f32; 100];
        for y in 3..=7 {
            for x in 2..=5 {
                data[y * 10 + x] = 0.9;
            }
        }
        let mask = SegmentationMask::new(10, 10, data);
        match apply_mask(opaque(10, 10), &mask) {
            MaskOutcome::Subject { pixels, bounds } => {
                assert_eq!(
                    bounds,
                    BoundingBox {
                        min_x: 2,
                        min_y: 3,
                        max_x: 5,
                        max_y: 7,
                    }
                );
                assert_eq!(pixels.get_pixel(0, 0).0[3], 0);
                assert_eq!(pixels.get_pixel(3, 4).0[3], 230); // 0.9 * 255 rounded
            }
            MaskOutcome::NoSubject(_) => panic!("expected a subject"),
        }
    }

    #[test]
    fn soft_confidence_maps_linearly_to_alpha() {
        let mut data = vec![0.6f32; 4];
        data[0] = 0.25;
        let mask = SegmentationMask::new(2, 2, data);
        match apply_mask(opaque(2, 2), &mask) {
            MaskOutcome::Subject { pixels, .. } => {
                assert_eq!(pixels.get_pixel(0, 0).0[3], 64); // 0.25 * 255 rounded
                assert_eq!(pixels.get_pixel(1, 0).0[3], 153); // 0.6 * 255 rounded
            }
            MaskOutcome::NoSubject(_) => panic!("expected a subject"),
        }
    }
}
