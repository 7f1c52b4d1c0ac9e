use std::fmt;
use std::time::Duration;

/// Per-pixel subject confidence map: 0.0 = background, 1.0 = subject.
///
/// Row-major, dimensions must match the pixel buffer it was computed
/// against. Produced once per run by the inference backend and consumed
/// by the mask compositor.
#[derive(Debug, Clone)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl SegmentationMask {
    /// Wrap a row-major confidence buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != width * height`.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "mask data length must equal width * height"
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Confidence at (x, y). Caller guarantees coordinates are in range.
    pub fn confidence(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Smallest axis-aligned rectangle containing all confident subject
/// pixels, in inclusive pixel coordinates. Read-only after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }
}

/// Configuration for one pipeline run. No hidden defaults beyond the
/// ones visible in [`Default`].
#[derive(Debug, Clone)]
pub struct ProcessingOptions {
    /// Encoding fidelity in 0..=1; maps to PNG compression effort.
    pub quality: f32,
    /// Box-blur radius in pixels for edge refinement; 0 disables it.
    pub edge_blur_radius: u32,
    /// Upper bound on output width; larger inputs are downscaled.
    pub target_max_width: u32,
    /// Upper bound on output height; larger inputs are downscaled.
    pub target_max_height: u32,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            quality: 0.9,
            edge_blur_radius: 2,
            target_max_width: 1024,
            target_max_height: 1024,
        }
    }
}

/// Best-effort clothing category guess derived from bounding-box
/// geometry. A suggestion for the caller to pre-fill, not ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Tops,
    Bottoms,
    Dresses,
    Shoes,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tops => "tops",
            Self::Bottoms => "bottoms",
            Self::Dresses => "dresses",
            Self::Shoes => "shoes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured output of one pipeline run. Immutable once
/// constructed; owned by the caller.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Encoded PNG bytes (RGBA, transparent background when a subject
    /// was isolated).
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Ranked dominant colors as `#rrggbb` hex strings, 3 to 5 entries.
    pub dominant_colors: Vec<String>,
    /// Category guess; `None` when no subject was detected.
    pub category: Option<Category>,
    /// Bounding box of the confident subject region, if one was found.
    pub bounding_box: Option<BoundingBox>,
    /// Whether a subject was isolated (false means the original image
    /// was passed through unmasked).
    pub subject_detected: bool,
    /// Wall-clock time from entry to result construction.
    pub elapsed: Duration,
}

/// Pipeline stages in execution order, used for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Decoding,
    AwaitingModel,
    Segmenting,
    Compositing,
    Refining,
    Analyzing,
    Encoding,
    Done,
}

impl Stage {
    /// Fractional progress when this stage is entered. Strictly
    /// increasing across the stage sequence.
    pub const fn percent(self) -> u8 {
        match self {
            Self::Decoding => 10,
            Self::AwaitingModel => 30,
            Self::Segmenting => 45,
            Self::Compositing => 70,
            Self::Refining => 85,
            Self::Analyzing => 90,
            Self::Encoding => 95,
            Self::Done => 100,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Decoding => "decoding",
            Self::AwaitingModel => "awaiting-model",
            Self::Segmenting => "segmenting",
            Self::Compositing => "compositing",
            Self::Refining => "refining",
            Self::Analyzing => "analyzing",
            Self::Encoding => "encoding",
            Self::Done => "done",
        }
    }
}

/// One progress report, emitted on entry to each pipeline stage.
///
/// Advisory only: a dropped receiver or absent channel never affects
/// pipeline correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub percent: u8,
}

impl From<Stage> for ProgressEvent {
    fn from(stage: Stage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_accessors() {
        let mask = SegmentationMask::new(2, 2, vec![0.0, 0.25, 0.5, 1.0]);
        assert_eq!(mask.width(), 2);
        assert_eq!(mask.height(), 2);
        assert_eq!(mask.confidence(1, 0), 0.25);
        assert_eq!(mask.confidence(1, 1), 1.0);
    }

    #[test]
    #[should_panic(expected = "mask data length")]
    fn mask_rejects_wrong_length() {
        let _ = SegmentationMask::new(2, 2, vec![0.0; 3]);
    }

    #[test]
    fn bounding_box_extent() {
        let bounds = BoundingBox {
            min_x: 2,
            min_y: 3,
            max_x: 9,
            max_y: 7,
        };
        assert_eq!(bounds.width(), 7);
        assert_eq!(bounds.height(), 4);
    }

    #[test]
    fn default_options() {
        let options = ProcessingOptions::default();
        assert_eq!(options.quality, 0.9);
        assert_eq!(options.edge_blur_radius, 2);
        assert_eq!(options.target_max_width, 1024);
        assert_eq!(options.target_max_height, 1024);
    }

    #[test]
    fn stage_percentages_increase() {
        let stages = [
            Stage::Decoding,
            Stage::AwaitingModel,
            Stage::Segmenting,
            Stage::Compositing,
            Stage::Refining,
            Stage::Analyzing,
            Stage::Encoding,
            Stage::Done,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0].percent() < pair[1].percent());
        }
        assert_eq!(Stage::Done.percent(), 100);
    }
}
