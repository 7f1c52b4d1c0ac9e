use anyhow::{Context, Result};
use clap::Parser;
use cutout::{BackgroundRemover, ProcessingOptions, ProgressEvent};
use std::path::PathBuf;
use std::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input photo (any format the image codecs can decode)
    input: PathBuf,

    /// Output PNG path (transparent background)
    output: PathBuf,

    /// Path to the segmentation model (ONNX file)
    #[arg(short, long)]
    model: PathBuf,

    /// Maximum output width in pixels
    #[arg(long, default_value_t = 1024)]
    max_width: u32,

    /// Maximum output height in pixels
    #[arg(long, default_value_t = 1024)]
    max_height: u32,

    /// Edge refinement blur radius in pixels (0 disables)
    #[arg(long, default_value_t = 2)]
    blur_radius: u32,

    /// Encoding quality, 0.0 to 1.0
    #[arg(long, default_value_t = 0.9)]
    quality: f32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let remover = BackgroundRemover::new(&args.model);
    if remover.is_acceleration_available() {
        tracing::info!("Hardware acceleration available");
    } else {
        tracing::info!("Hardware acceleration unavailable, running on CPU");
    }

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let options = ProcessingOptions {
        quality: args.quality,
        edge_blur_radius: args.blur_radius,
        target_max_width: args.max_width,
        target_max_height: args.max_height,
    };

    let (sender, receiver) = mpsc::channel::<ProgressEvent>();
    let result = remover
        .remove_background_with_progress(&bytes, &options, &sender)
        .context("Background removal failed")?;
    drop(sender);
    for event in receiver.try_iter() {
        tracing::debug!("Stage {} reached {}%", event.stage.name(), event.percent);
    }

    std::fs::write(&args.output, &result.png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    tracing::info!(
        "Wrote {} ({}x{}, {} bytes) in {:?}",
        args.output.display(),
        result.width,
        result.height,
        result.png.len(),
        result.elapsed
    );
    tracing::info!("Dominant colors: {}", result.dominant_colors.join(", "));
    match result.category {
        Some(category) => tracing::info!("Category guess: {}", category),
        None => tracing::info!("No subject detected, original image passed through"),
    }

    remover.cleanup();
    Ok(())
}
