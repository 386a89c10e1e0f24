//! giflapse assembles a directory of still images into one animated GIF.
//!
//! The pipeline is linear:
//!
//! 1. **Scan**: list the source directory, keep allow-listed extensions, stamp
//!    each file with its creation (falling back to modification) time
//! 2. **Sort**: stable chronological order, filename as the tie-break
//! 3. **Compose**: draw each image stretched onto a reused fixed-size canvas
//!    over a background fill; the first frame fixes the canvas dimensions
//! 4. **Encode**: stream every composited canvas through the `gif` encoder
//!    into the output file
//!
//! Quantization, LZW compression and frame disposal belong to the `gif`
//! crate; decoding and drawing belong to `image`. This crate sequences those
//! collaborators and reports what happened, per-frame skips included, in a
//! [`RunReport`].
#![forbid(unsafe_code)]

pub mod compose;
pub mod config;
pub mod encode_gif;
pub mod error;
pub mod pipeline;
pub mod scan;

pub use compose::{ComposedFrame, Compositor};
pub use config::{PipelineConfig, Repeat, default_extensions, parse_hex_color};
pub use encode_gif::{CapturedFrame, FrameSink, GifSink, GifSinkOpts, InMemorySink, SinkConfig};
pub use error::{GiflapseError, GiflapseResult};
pub use pipeline::{RunReport, SkippedFrame, run, run_to_file};
pub use scan::{SourceImage, discover_images, sort_frames};
