use anyhow::Context as _;
use tracing::{info, warn};

use crate::{
    compose::{Compositor, load_image, probe_dimensions},
    config::PipelineConfig,
    encode_gif::{FrameSink, GifSink, GifSinkOpts, SinkConfig},
    error::{GiflapseError, GiflapseResult},
    scan::{discover_images, sort_frames},
};

/// One source image that contributed nothing to the output.
#[derive(Clone, Debug)]
pub struct SkippedFrame {
    /// Position in the sorted frame sequence.
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// What a finished run did.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub width: u32,
    pub height: u32,
    pub frames_encoded: usize,
    pub skipped: Vec<SkippedFrame>,
    /// Size of the output file; `None` when the sink has no file behind it.
    pub out_size_bytes: Option<u64>,
}

/// Run the whole pipeline against `sink`:
/// scan, sort, probe dimensions, then composite and push every frame.
///
/// A frame that fails to load is skipped (recorded in the report, run
/// continues); every other failure aborts the run. The sink never opens when
/// discovery finds nothing, so an empty directory leaves no output behind.
#[tracing::instrument(skip_all)]
pub fn run(cfg: &PipelineConfig, sink: &mut dyn FrameSink) -> GiflapseResult<RunReport> {
    cfg.validate()?;

    info!(dir = %cfg.source_dir.display(), "scanning source directory");
    let discovered = discover_images(&cfg.source_dir, &cfg.extensions)?;
    let frames = sort_frames(discovered);
    if frames.is_empty() {
        return Err(GiflapseError::discovery(format!(
            "no qualifying image files in '{}'",
            cfg.source_dir.display()
        )));
    }
    info!(count = frames.len(), "frame sequence built");

    // The first frame fixes the canvas; its failure is fatal, not a skip.
    let first = &frames[0];
    let (width, height) = probe_dimensions(&first.path)?;
    info!(name = %first.name, width, height, "canvas dimensions taken from first frame");

    sink.begin(SinkConfig {
        width,
        height,
        frame_delay_ms: cfg.frame_delay_ms,
    })?;
    let mut compositor = Compositor::new(width, height, cfg.background)?;

    let total = frames.len();
    let mut encoded = 0usize;
    let mut skipped = Vec::new();
    for (index, source) in frames.iter().enumerate() {
        match load_image(&source.path) {
            Ok(image) => {
                let frame = compositor.compose(&image);
                sink.push_frame(encoded, frame)?;
                encoded += 1;
                info!(frame = index + 1, total, name = %source.name, "frame encoded");
            }
            Err(err) => {
                warn!(frame = index + 1, total, name = %source.name, error = %err, "skipping frame");
                skipped.push(SkippedFrame {
                    index,
                    name: source.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(encoded, skipped = skipped.len(), "finishing stream");
    sink.end()?;

    Ok(RunReport {
        width,
        height,
        frames_encoded: encoded,
        skipped,
        out_size_bytes: None,
    })
}

/// Convenience entry point: run against a [`GifSink`] built from the config
/// and report the resulting file size.
pub fn run_to_file(cfg: &PipelineConfig) -> GiflapseResult<RunReport> {
    let mut sink = GifSink::new(GifSinkOpts::from_config(cfg));
    let mut report = run(cfg, &mut sink)?;

    let size = std::fs::metadata(&cfg.out_path)
        .with_context(|| format!("stat output file '{}'", cfg.out_path.display()))?
        .len();
    report.out_size_bytes = Some(size);
    info!(
        path = %cfg.out_path.display(),
        size_bytes = size,
        frames = report.frames_encoded,
        skipped = report.skipped.len(),
        "animation written"
    );
    Ok(report)
}
