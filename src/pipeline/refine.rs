use image::RgbaImage;

/// Alpha difference to any 8-neighbor beyond which a pixel counts as a
/// silhouette edge.
const EDGE_DELTA: i16 = 128;

/// Smooth the alpha channel at mask boundaries to avoid jagged cutouts.
///
/// A pixel whose alpha differs from any of its 8 neighbors by more than
/// 128 is an edge pixel; its alpha is replaced with the mean over the
/// square window of side `2 * radius + 1` (clipped at borders).
/// Non-edge pixels are untouched, so the blur stays local to the
/// silhouette instead of softening the whole image.
///
/// All reads go through a snapshot of the pre-pass alpha plane, so a
/// blurred value never feeds into a neighbor within the same pass.
/// No-op when `radius == 0`.
pub fn refine_edges(mut pixels: RgbaImage, radius: u32) -> RgbaImage {
    if radius == 0 {
        return pixels;
    }

    let (width, height) = pixels.dimensions();
    let alpha: Vec<u8> = pixels.pixels().map(|p| p.0[3]).collect();

    let mut refined = 0u32;
    for y in 0..height {
        for x in 0..width {
            if !is_edge(&alpha, width, height, x, y) {
                continue;
            }
            pixels.get_pixel_mut(x, y).0[3] = window_mean(&alpha, width, height, x, y, radius);
            refined += 1;
        }
    }
    tracing::debug!("Refined {} edge pixels (radius {})", refined, radius);

    pixels
}

fn is_edge(alpha: &[u8], width: u32, height: u32, x: u32, y: u32) -> bool {
    let center = i16::from(alpha[(y * width + x) as usize]);
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                continue;
            }
            let neighbor = i16::from(alpha[(ny * i64::from(width) + nx) as usize]);
            if (center - neighbor).abs() > EDGE_DELTA {
                return true;
            }
        }
    }
    false
}

fn window_mean(alpha: &[u8], width: u32, height: u32, x: u32, y: u32, radius: u32) -> u8 {
    let r = i64::from(radius);
    let x0 = (i64::from(x) - r).max(0);
    let x1 = (i64::from(x) + r).min(i64::from(width) - 1);
    let y0 = (i64::from(y) - r).max(0);
    let y1 = (i64::from(y) + r).min(i64::from(height) - 1);

    let mut sum = 0u32;
    let mut count = 0u32;
    for wy in y0..=y1 {
        for wx in x0..=x1 {
            sum += u32::from(alpha[(wy * i64::from(width) + wx) as usize]);
            count += 1;
        }
    }
    (sum / count) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4-wide buffer with a hard alpha edge between columns 1 and 2.
    fn hard_edge(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _y| {
            let alpha = if x < width / 2 { 255 } else { 0 };
            image::Rgba([100, 100, 100, alpha])
        })
    }

    fn alphas(image: &RgbaImage) -> Vec<u8> {
        image.pixels().map(|p| p.0[3]).collect()
    }

    #[test]
    fn zero_radius_is_noop() {
        let image = hard_edge(4, 4);
        let before = alphas(&image);
        let refined = refine_edges(image, 0);
        assert_eq!(alphas(&refined), before);
    }

    #[test]
    fn uniform_alpha_has_no_edges() {
        let image = RgbaImage::from_pixel(6, 6, image::Rgba([5, 5, 5, 200]));
        let refined = refine_edges(image, 2);
        assert!(alphas(&refined).iter().all(|&a| a == 200));
    }

    #[test]
    fn soft_gradient_is_not_an_edge() {
        // Neighboring alphas differ by 100 < 128, so nothing qualifies.
        let image = RgbaImage::from_fn(3, 1, |x, _| {
            image::Rgba([0, 0, 0, [50u8, 150, 250][x as usize]])
        });
        let before = alphas(&image);
        let refined = refine_edges(image, 1);
        assert_eq!(alphas(&refined), before);
    }

    #[test]
    fn edge_pixels_get_window_mean_of_old_values() {
        // Columns: 255 255 0 0. Columns 1 and 2 are edges.
        // Radius 1 window for column 1 spans columns 0..=2 over three
        // rows of (255, 255, 0): mean = 170. Column 2 spans 1..=3 of
        // (255, 0, 0): mean = 85. Both computed from the snapshot; if
        // the pass read its own output, column 2 would see 170 instead
        // of 255 and land on 56.
        let refined = refine_edges(hard_edge(4, 3), 1);
        for y in 0..3 {
            assert_eq!(refined.get_pixel(0, y).0[3], 255);
            assert_eq!(refined.get_pixel(1, y).0[3], 170);
            assert_eq!(refined.get_pixel(2, y).0[3], 85);
            assert_eq!(refined.get_pixel(3, y).0[3], 0);
        }
    }

    #[test]
    fn color_channels_are_untouched() {
        let refined = refine_edges(hard_edge(4, 4), 2);
        for pixel in refined.pixels() {
            assert_eq!(&pixel.0[..3], &[100, 100, 100]);
        }
    }
}
