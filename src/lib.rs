//! On-device subject segmentation and cutout pipeline.
//!
//! Given a photograph of a clothing item, isolate the subject on a
//! transparent background, extract its dominant colors, and guess a
//! clothing category, all locally and without a server round-trip.
//!
//! ```no_run
//! use cutout::{BackgroundRemover, ProcessingOptions};
//!
//! # fn run(photo: Vec<u8>) -> Result<(), cutout::CutoutError> {
//! let remover = BackgroundRemover::new("models/segmenter.onnx");
//! remover.preload()?; // optional: hide load latency
//! let result = remover.remove_background(&photo, &ProcessingOptions::default())?;
//! println!("{:?} {:?}", result.dominant_colors, result.category);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod model;
pub mod pipeline;

pub use error::{CutoutError, InferenceError, ModelError};
pub use model::{ModelCache, ModelProfile, OrtBackend, Segmenter, SegmenterBackend};
pub use pipeline::{
    BoundingBox, Category, ProcessingOptions, ProcessingResult, ProgressEvent, SegmentationMask,
    Stage,
};

use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// The public surface the surrounding application talks to.
///
/// Owns a [`ModelCache`], so the one segmenter instance, its
/// single-flight loading, and its teardown are all scoped to this value
/// instead of module-level statics. Construct once, share by reference,
/// and call [`cleanup`](Self::cleanup) on component teardown.
pub struct BackgroundRemover {
    cache: ModelCache,
}

impl BackgroundRemover {
    /// Remover backed by an ONNX model file on disk.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self::with_backend(Box::new(OrtBackend::new(model_path)))
    }

    /// Remover with a custom backend (alternative runtimes, test mocks).
    pub fn with_backend(backend: Box<dyn SegmenterBackend>) -> Self {
        Self {
            cache: ModelCache::new(backend),
        }
    }

    /// Load the model eagerly so the first
    /// [`remove_background`](Self::remove_background) call does not pay
    /// load latency. Call as early as convenient.
    pub fn preload(&self) -> Result<(), ModelError> {
        self.cache.preload()
    }

    /// Run the full pipeline over raw image bytes.
    pub fn remove_background(
        &self,
        image_bytes: &[u8],
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult, CutoutError> {
        pipeline::process(&self.cache, image_bytes, options, None)
    }

    /// Run the full pipeline over an already-decoded pixel buffer,
    /// skipping the decode step.
    pub fn remove_background_image(
        &self,
        image: image::RgbaImage,
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult, CutoutError> {
        pipeline::process_buffer(&self.cache, image, options, None)
    }

    /// Like [`remove_background`](Self::remove_background), emitting a
    /// [`ProgressEvent`] on entry to each pipeline stage. The channel is
    /// advisory: a dropped receiver never affects the run.
    pub fn remove_background_with_progress(
        &self,
        image_bytes: &[u8],
        options: &ProcessingOptions,
        progress: &Sender<ProgressEvent>,
    ) -> Result<ProcessingResult, CutoutError> {
        pipeline::process(&self.cache, image_bytes, options, Some(progress))
    }

    /// Release the cached model. The next run reloads from scratch.
    pub fn cleanup(&self) {
        self.cache.cleanup();
    }

    /// Whether the segmenter is currently loaded.
    pub fn is_model_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    /// Whether a hardware-accelerated compute backend is usable.
    /// Callers may warn the user that processing will be slower when
    /// this is `false`.
    pub fn is_acceleration_available(&self) -> bool {
        self.cache.acceleration_available()
    }
}
