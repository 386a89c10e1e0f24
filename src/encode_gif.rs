use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::PathBuf,
};

use tracing::debug;

use crate::{
    compose::ComposedFrame,
    config::{PipelineConfig, Repeat},
    error::{GiflapseError, GiflapseResult},
};

/// Configuration handed to a [`FrameSink`] once, at the start of a run.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Delay between frames in milliseconds.
    pub frame_delay_ms: u32,
}

/// Sink contract for consuming composited frames in sequence order.
///
/// Ordering contract: `push_frame` is called with strictly increasing `index`,
/// after exactly one `begin` and before exactly one `end`. `end` blocks until
/// the output is durable; its result is the completion signal.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> GiflapseResult<()>;
    /// Push one frame in strictly increasing sequence order.
    fn push_frame(&mut self, index: usize, frame: ComposedFrame<'_>) -> GiflapseResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> GiflapseResult<()>;
}

/// Encoder options fixed at sink construction, before any frame exists.
#[derive(Clone, Debug)]
pub struct GifSinkOpts {
    pub out_path: PathBuf,
    /// Quantization speed, 1 (best) to 30 (fastest).
    pub quality: u8,
    pub repeat: Repeat,
}

impl GifSinkOpts {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            out_path: cfg.out_path.clone(),
            quality: cfg.quality,
            repeat: cfg.repeat,
        }
    }
}

/// Streams frames through the `gif` encoder into a file.
///
/// `begin` opens the destination (truncating any existing file) and writes the
/// stream header; each `push_frame` quantizes one canvas and appends it;
/// `end` writes the trailer and flushes. Quantization, LZW compression and
/// frame disposal are the `gif` crate's business, not ours.
pub struct GifSink {
    opts: GifSinkOpts,
    encoder: Option<gif::Encoder<BufWriter<File>>>,
    frame_size: Option<(u16, u16)>,
    delay_ticks: u16,
    scratch: Vec<u8>,
    finished: bool,
}

impl GifSink {
    pub fn new(opts: GifSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            frame_size: None,
            delay_ticks: 0,
            scratch: Vec::new(),
            finished: false,
        }
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> GiflapseResult<()> {
        if self.encoder.is_some() || self.finished {
            return Err(GiflapseError::validation("gif sink was already started"));
        }
        if !crate::config::QUALITY_RANGE.contains(&self.opts.quality) {
            return Err(GiflapseError::validation(format!(
                "quality {} is outside {}..={}",
                self.opts.quality,
                crate::config::QUALITY_RANGE.start(),
                crate::config::QUALITY_RANGE.end()
            )));
        }

        let width = u16::try_from(cfg.width).map_err(|_| {
            GiflapseError::validation(format!(
                "canvas width {} exceeds the GIF limit of {}",
                cfg.width,
                u16::MAX
            ))
        })?;
        let height = u16::try_from(cfg.height).map_err(|_| {
            GiflapseError::validation(format!(
                "canvas height {} exceeds the GIF limit of {}",
                cfg.height,
                u16::MAX
            ))
        })?;

        let file = File::create(&self.opts.out_path).map_err(|e| {
            GiflapseError::encode(format!(
                "create output file '{}': {e}",
                self.opts.out_path.display()
            ))
        })?;

        // The header goes out here; repeat must follow before the first frame.
        let mut encoder = gif::Encoder::new(BufWriter::new(file), width, height, &[])
            .map_err(|e| GiflapseError::encode(format!("start gif stream: {e}")))?;
        let repeat = match self.opts.repeat {
            Repeat::Infinite => Some(gif::Repeat::Infinite),
            Repeat::Finite(n) => Some(gif::Repeat::Finite(n)),
            Repeat::Never => None,
        };
        if let Some(repeat) = repeat {
            encoder
                .set_repeat(repeat)
                .map_err(|e| GiflapseError::encode(format!("set gif repeat: {e}")))?;
        }

        self.delay_ticks = delay_to_ticks(cfg.frame_delay_ms);
        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.frame_size = Some((width, height));
        self.encoder = Some(encoder);
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: ComposedFrame<'_>) -> GiflapseResult<()> {
        let (Some(encoder), Some((width, height))) = (self.encoder.as_mut(), self.frame_size)
        else {
            return Err(GiflapseError::validation(
                "gif sink received a frame outside begin/end",
            ));
        };

        if frame.width != u32::from(width) || frame.height != u32::from(height) {
            return Err(GiflapseError::validation(format!(
                "frame {index} size mismatch: got {}x{}, expected {width}x{height}",
                frame.width, frame.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(GiflapseError::validation(format!(
                "frame {index} pixel buffer size mismatch: got {}, expected {}",
                frame.data.len(),
                self.scratch.len()
            )));
        }

        // from_rgba_speed quantizes in place, so work on a reused copy.
        self.scratch.copy_from_slice(frame.data);
        let mut gif_frame = gif::Frame::from_rgba_speed(
            width,
            height,
            &mut self.scratch,
            i32::from(self.opts.quality),
        );
        gif_frame.delay = self.delay_ticks;

        encoder
            .write_frame(&gif_frame)
            .map_err(|e| GiflapseError::encode(format!("write frame {index}: {e}")))?;
        debug!(index, "frame appended to gif stream");
        Ok(())
    }

    fn end(&mut self) -> GiflapseResult<()> {
        let Some(encoder) = self.encoder.take() else {
            return Err(GiflapseError::validation(
                "gif sink ended without a matching begin",
            ));
        };
        self.finished = true;

        let mut writer = encoder
            .into_inner()
            .map_err(|e| GiflapseError::encode(format!("finalize gif stream: {e}")))?;
        writer.flush().map_err(|e| {
            GiflapseError::encode(format!(
                "flush output file '{}': {e}",
                self.opts.out_path.display()
            ))
        })?;
        Ok(())
    }
}

/// GIF stores the per-frame delay in 10 ms ticks.
fn delay_to_ticks(delay_ms: u32) -> u16 {
    (delay_ms.saturating_add(5) / 10).clamp(1, u32::from(u16::MAX)) as u16
}

/// One frame captured by [`InMemorySink`].
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<CapturedFrame>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Frames in push order.
    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> GiflapseResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: ComposedFrame<'_>) -> GiflapseResult<()> {
        self.frames.push(CapturedFrame {
            index,
            width: frame.width,
            height: frame.height,
            data: frame.data.to_vec(),
        });
        Ok(())
    }

    fn end(&mut self) -> GiflapseResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(width: u32, height: u32, data: &[u8]) -> ComposedFrame<'_> {
        ComposedFrame {
            width,
            height,
            data,
        }
    }

    fn sink_into(dir: &tempfile::TempDir) -> GifSink {
        GifSink::new(GifSinkOpts {
            out_path: dir.path().join("out.gif"),
            quality: 10,
            repeat: Repeat::Infinite,
        })
    }

    #[test]
    fn delay_rounds_to_ten_ms_ticks() {
        assert_eq!(delay_to_ticks(100), 10);
        assert_eq!(delay_to_ticks(104), 10);
        assert_eq!(delay_to_ticks(105), 11);
        // A sub-tick delay still yields a valid one-tick frame.
        assert_eq!(delay_to_ticks(1), 1);
    }

    #[test]
    fn lifecycle_writes_a_gif_header_and_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_into(&dir);

        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            frame_delay_ms: 100,
        })
        .unwrap();
        let data = vec![255u8; 2 * 2 * 4];
        sink.push_frame(0, frame_of(2, 2, &data)).unwrap();
        sink.end().unwrap();

        let bytes = std::fs::read(dir.path().join("out.gif")).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
        assert_eq!(bytes.last(), Some(&0x3B));
    }

    #[test]
    fn push_outside_lifecycle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![0u8; 2 * 2 * 4];

        let mut sink = sink_into(&dir);
        assert!(sink.push_frame(0, frame_of(2, 2, &data)).is_err());

        let mut sink = sink_into(&dir);
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            frame_delay_ms: 100,
        })
        .unwrap();
        sink.end().unwrap();
        assert!(sink.push_frame(0, frame_of(2, 2, &data)).is_err());
        assert!(sink.end().is_err());
    }

    #[test]
    fn frame_size_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_into(&dir);
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            frame_delay_ms: 100,
        })
        .unwrap();

        let data = vec![0u8; 3 * 2 * 4];
        assert!(sink.push_frame(0, frame_of(3, 2, &data)).is_err());
    }

    #[test]
    fn oversized_canvas_is_rejected_at_begin() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_into(&dir);
        let err = sink
            .begin(SinkConfig {
                width: u32::from(u16::MAX) + 1,
                height: 2,
                frame_delay_ms: 100,
            })
            .unwrap_err();
        assert!(err.to_string().contains("GIF limit"));
    }

    #[test]
    fn in_memory_sink_captures_config_and_frames() {
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            width: 2,
            height: 1,
            frame_delay_ms: 40,
        })
        .unwrap();

        let data = vec![1u8; 2 * 1 * 4];
        sink.push_frame(0, frame_of(2, 1, &data)).unwrap();
        sink.push_frame(1, frame_of(2, 1, &data)).unwrap();
        sink.end().unwrap();

        assert_eq!(sink.config().unwrap().frame_delay_ms, 40);
        assert_eq!(sink.frames().len(), 2);
        assert_eq!(sink.frames()[1].index, 1);
        assert!(sink.ended());
    }
}
