mod cache;
mod ort_backend;

pub use cache::ModelCache;
pub use ort_backend::{acceleration_available, OrtBackend, OrtSegmenter};

use crate::error::{InferenceError, ModelError};
use crate::pipeline::SegmentationMask;
use image::RgbaImage;

/// A loaded segmentation model.
///
/// Effectively read-only after construction: `segment` takes `&self`
/// and must not mutate observable model state, so one handle can be
/// shared across concurrent pipeline runs. Implementations whose
/// underlying runtime is not reentrant serialize internally.
pub trait Segmenter: Send + Sync {
    /// Run the model over a frame and return a per-pixel confidence
    /// mask with the same dimensions as the frame.
    fn segment(&self, frame: &RgbaImage) -> Result<SegmentationMask, InferenceError>;

    /// The model's native input dimensions as (width, height).
    fn input_size(&self) -> (u32, u32);
}

/// Factory seam for segmenter construction.
///
/// Allows swapping between different backends (ONNX on device, mocks in
/// tests) without touching the lifecycle manager or the orchestrator.
pub trait SegmenterBackend: Send + Sync {
    /// Construct a segmenter for the given profile.
    fn load(&self, profile: &ModelProfile) -> Result<Box<dyn Segmenter>, ModelError>;

    /// Whether a hardware-accelerated compute backend is usable.
    fn acceleration_available(&self) -> bool {
        false
    }
}

/// A model construction configuration: input resolution and thread
/// budget. The fallback profile trades quality for a better chance of
/// loading on constrained hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelProfile {
    pub input_width: u32,
    pub input_height: u32,
    pub intra_threads: usize,
}

impl ModelProfile {
    /// Preferred configuration: full resolution, wider thread budget.
    pub const PRIMARY: Self = Self {
        input_width: 512,
        input_height: 512,
        intra_threads: 4,
    };

    /// Conservative retry configuration used when the primary fails.
    pub const FALLBACK: Self = Self {
        input_width: 320,
        input_height: 320,
        intra_threads: 2,
    };
}
