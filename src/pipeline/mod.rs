mod analyze;
mod compositor;
mod preprocess;
mod refine;
pub mod types;

pub use compositor::MaskOutcome;
pub use preprocess::fit_within;
pub use types::{
    BoundingBox, Category, ProcessingOptions, ProcessingResult, ProgressEvent, SegmentationMask,
    Stage,
};

use crate::error::CutoutError;
use crate::model::ModelCache;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::sync::mpsc::Sender;
use std::time::Instant;

/// Run the full cutout pipeline over raw image bytes.
///
/// Stages: decode/resize, model acquisition, segmentation,
/// compositing, edge refinement, color/category analysis, PNG
/// encoding. Progress events are emitted on entry to each stage when a
/// sender is supplied; a dropped receiver is ignored.
///
/// An inference failure or an empty mask degrades to the unmasked
/// original image with the sentinel palette and no category guess,
/// so the caller always gets an image back unless the input itself
/// could not be decoded or the model never loaded.
pub fn process(
    cache: &ModelCache,
    bytes: &[u8],
    options: &ProcessingOptions,
    progress: Option<&Sender<ProgressEvent>>,
) -> Result<ProcessingResult, CutoutError> {
    let start = Instant::now();
    emit(progress, Stage::Decoding);
    let decoded = preprocess::decode(bytes)?;
    run(cache, decoded, options, progress, start)
}

/// Run the pipeline over an already-decoded pixel buffer, skipping the
/// decode stage. For callers that hold a frame in memory (e.g. from a
/// camera preview) and have no encoded bytes to hand over.
pub fn process_buffer(
    cache: &ModelCache,
    pixels: RgbaImage,
    options: &ProcessingOptions,
    progress: Option<&Sender<ProgressEvent>>,
) -> Result<ProcessingResult, CutoutError> {
    let start = Instant::now();
    emit(progress, Stage::Decoding);
    run(cache, pixels, options, progress, start)
}

fn emit(progress: Option<&Sender<ProgressEvent>>, stage: Stage) {
    if let Some(sender) = progress {
        let _ = sender.send(ProgressEvent::from(stage));
    }
}

fn run(
    cache: &ModelCache,
    decoded: RgbaImage,
    options: &ProcessingOptions,
    progress: Option<&Sender<ProgressEvent>>,
    start: Instant,
) -> Result<ProcessingResult, CutoutError> {
    let emit = |stage: Stage| emit(progress, stage);
    let pixels = preprocess::resize_to_fit(decoded, options.target_max_width, options.target_max_height);

    emit(Stage::AwaitingModel);
    let segmenter = cache.get()?;

    emit(Stage::Segmenting);
    let mask = match segmenter.segment(&pixels) {
        Ok(mask) => Some(mask),
        Err(err) => {
            // Recoverable: a visible, un-cutout image beats no image.
            tracing::warn!("Inference failed ({}), returning unmasked image", err);
            None
        }
    };

    emit(Stage::Compositing);
    let (pixels, bounds) = match mask {
        Some(mask) => match compositor::apply_mask(pixels, &mask) {
            MaskOutcome::Subject { pixels, bounds } => (pixels, Some(bounds)),
            MaskOutcome::NoSubject(pixels) => {
                tracing::info!("No subject detected, passing original image through");
                (pixels, None)
            }
        },
        None => (pixels, None),
    };

    emit(Stage::Refining);
    let pixels = if bounds.is_some() {
        refine::refine_edges(pixels, options.edge_blur_radius)
    } else {
        pixels
    };

    emit(Stage::Analyzing);
    let (dominant_colors, category) = match bounds {
        Some(bounds) => (
            analyze::extract_dominant_colors(&pixels),
            Some(analyze::detect_category(&bounds, pixels.height())),
        ),
        None => (analyze::fallback_palette(), None),
    };

    emit(Stage::Encoding);
    let (width, height) = pixels.dimensions();
    let png = encode_png(&pixels, options.quality)?;

    emit(Stage::Done);
    let elapsed = start.elapsed();
    tracing::debug!(
        "Pipeline finished in {:?} ({}x{}, subject={})",
        elapsed,
        width,
        height,
        bounds.is_some()
    );

    Ok(ProcessingResult {
        png,
        width,
        height,
        dominant_colors,
        category,
        bounding_box: bounds,
        subject_detected: bounds.is_some(),
        elapsed,
    })
}

/// Encode the buffer as PNG, the one alpha-capable format the rest of
/// the application persists. `quality` selects compression effort.
fn encode_png(pixels: &RgbaImage, quality: f32) -> Result<Vec<u8>, CutoutError> {
    let compression = if quality >= 0.9 {
        CompressionType::Best
    } else if quality >= 0.5 {
        CompressionType::Default
    } else {
        CompressionType::Fast
    };

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, PngFilterType::Adaptive);
    encoder
        .write_image(
            pixels.as_raw(),
            pixels.width(),
            pixels.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(CutoutError::Encode)?;
    Ok(buffer)
}
