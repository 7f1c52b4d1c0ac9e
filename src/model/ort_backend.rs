use super::{ModelProfile, Segmenter, SegmenterBackend};
use crate::error::{InferenceError, ModelError};
use crate::pipeline::SegmentationMask;
use image::{imageops, RgbaImage};
use ndarray::Array4;
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Whether a hardware-accelerated execution provider is usable on this
/// device. Synchronous capability probe; callers may use it to set
/// latency expectations before running the pipeline.
pub fn acceleration_available() -> bool {
    CUDAExecutionProvider::default()
        .is_available()
        .unwrap_or(false)
}

/// ONNX Runtime backend: loads a pretrained subject segmentation model
/// from disk and constructs [`OrtSegmenter`] instances.
pub struct OrtBackend {
    model_path: PathBuf,
}

impl OrtBackend {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }
}

impl SegmenterBackend for OrtBackend {
    fn load(&self, profile: &ModelProfile) -> Result<Box<dyn Segmenter>, ModelError> {
        let segmenter = OrtSegmenter::new(&self.model_path, profile)?;
        Ok(Box::new(segmenter))
    }

    fn acceleration_available(&self) -> bool {
        acceleration_available()
    }
}

/// A subject segmentation model running under ONNX Runtime.
///
/// Input: RGB frame normalized to `[0, 1]`, NCHW `[1, 3, H, W]`.
/// Output: per-pixel subject confidence `[1, 1, h, w]`, resampled back
/// to the frame dimensions.
///
/// The session sits behind a mutex so [`segment`](Segmenter::segment)
/// can take `&self` and stay safe to call from concurrent pipeline
/// runs; inference calls are serialized, never interleaved.
pub struct OrtSegmenter {
    session: Mutex<Session>,
    input_width: u32,
    input_height: u32,
}

impl OrtSegmenter {
    fn new(model_path: &Path, profile: &ModelProfile) -> Result<Self, ModelError> {
        tracing::info!(
            "Loading segmentation model from {} ({}x{}, {} threads)",
            model_path.display(),
            profile.input_width,
            profile.input_height,
            profile.intra_threads
        );

        // Request the accelerated provider; ort falls back to the CPU
        // provider when it is unavailable.
        let session = Session::builder()?
            .with_execution_providers([CUDAExecutionProvider::default().build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(profile.intra_threads)?
            .commit_from_file(model_path)?;

        tracing::info!("Segmentation model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            input_width: profile.input_width,
            input_height: profile.input_height,
        })
    }

    /// Resize the frame to the model input size and normalize into a
    /// `[1, 3, H, W]` tensor, dropping the alpha channel.
    fn to_tensor(&self, frame: &RgbaImage) -> Array4<f32> {
        let resized = if frame.dimensions() != (self.input_width, self.input_height) {
            imageops::resize(
                frame,
                self.input_width,
                self.input_height,
                imageops::FilterType::Lanczos3,
            )
        } else {
            frame.clone()
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, y as usize, x as usize]] =
                    f32::from(pixel.0[channel]) / 255.0;
            }
        }
        tensor
    }

    /// Resample model-resolution confidences back to frame dimensions.
    fn resample_confidences(
        confidences: &[f32],
        mask_width: u32,
        mask_height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> SegmentationMask {
        if (mask_width, mask_height) == (frame_width, frame_height) {
            return SegmentationMask::new(frame_width, frame_height, confidences.to_vec());
        }

        let gray = image::GrayImage::from_fn(mask_width, mask_height, |x, y| {
            let value = confidences[(y * mask_width + x) as usize];
            image::Luma([(value * 255.0).clamp(0.0, 255.0) as u8])
        });
        let resized = imageops::resize(
            &gray,
            frame_width,
            frame_height,
            imageops::FilterType::Lanczos3,
        );
        let data = resized.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect();
        SegmentationMask::new(frame_width, frame_height, data)
    }
}

impl Segmenter for OrtSegmenter {
    fn segment(&self, frame: &RgbaImage) -> Result<SegmentationMask, InferenceError> {
        let _span = tracing::debug_span!("ort_segment").entered();

        let tensor = self.to_tensor(frame);
        let input = Tensor::from_array(tensor).map_err(|e| InferenceError(e.to_string()))?;

        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| InferenceError(e.to_string()))?;

        // Confidence map has shape [1, 1, h, w].
        let confidence = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| InferenceError(e.to_string()))?
            .to_owned();
        drop(outputs);
        drop(session);

        let shape = confidence.shape();
        if shape.len() < 2 {
            return Err(InferenceError(format!(
                "unexpected output shape {shape:?}"
            )));
        }
        let mask_height = shape[shape.len() - 2] as u32;
        let mask_width = shape[shape.len() - 1] as u32;
        let flat: Vec<f32> = confidence.iter().map(|c| c.clamp(0.0, 1.0)).collect();

        let (frame_width, frame_height) = frame.dimensions();
        Ok(Self::resample_confidences(
            &flat,
            mask_width,
            mask_height,
            frame_width,
            frame_height,
        ))
    }

    fn input_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }
}
