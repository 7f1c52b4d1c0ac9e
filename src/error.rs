use thiserror::Error;

/// Errors surfaced to the caller of a pipeline run.
///
/// Only undecodable input and an unrecoverable model load abort a run.
/// Everything else (inference failures, no subject detected) degrades to
/// returning the unmasked original image.
#[derive(Debug, Error)]
pub enum CutoutError {
    /// Input byte slice was empty.
    #[error("input image bytes are empty")]
    EmptyInput,

    /// Input bytes could not be decoded as an image.
    #[error("failed to decode input image")]
    Decode(#[source] image::ImageError),

    /// Output PNG encoding failed.
    #[error("failed to encode output image")]
    Encode(#[source] image::ImageError),

    /// Model loading failed for both the primary and fallback profiles.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors from model loading and backend initialization.
#[derive(Debug, Error)]
pub enum ModelError {
    /// ONNX Runtime reported an error while building or committing a session.
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    /// A non-ONNX backend failed to produce a segmenter.
    #[error("model backend error: {0}")]
    Backend(String),

    /// Both the primary and the fallback model profiles failed to load.
    /// The cache stays empty so a later call retries from scratch.
    #[error("segmentation model failed to load (primary: {primary}; fallback: {fallback})")]
    LoadFailed { primary: String, fallback: String },
}

/// A loaded model raised an error during one inference call.
///
/// Recoverable at the run level: the orchestrator falls back to the
/// unmasked original image instead of failing the whole user action.
#[derive(Debug, Error)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);
