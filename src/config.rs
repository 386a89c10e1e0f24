use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::error::{GiflapseError, GiflapseResult};

/// Quantization speed accepted by the encoder: 1 is best quality, 30 fastest.
pub const QUALITY_RANGE: std::ops::RangeInclusive<u8> = 1..=30;

/// Everything one run of the pipeline needs, as one explicit value.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Directory scanned for source images.
    pub source_dir: PathBuf,
    /// Destination GIF path, overwritten if it exists.
    pub out_path: PathBuf,
    /// Extension allow-list, matched case-insensitively (leading dot optional).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Delay between frames in milliseconds.
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u32,
    /// Quantization speed/quality trade-off, see [`QUALITY_RANGE`].
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub repeat: Repeat,
    /// Background fill as straight RGBA; `None` clears frames to transparent.
    #[serde(default)]
    pub background: Option<[u8; 4]>,
}

impl PipelineConfig {
    /// Load and validate a config from a JSON file.
    pub fn from_path(path: &Path) -> GiflapseResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> GiflapseResult<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(GiflapseError::validation("source_dir must not be empty"));
        }
        if self.out_path.as_os_str().is_empty() {
            return Err(GiflapseError::validation("out_path must not be empty"));
        }
        if self.extensions.is_empty() {
            return Err(GiflapseError::validation(
                "extension allow-list must not be empty",
            ));
        }
        if self.frame_delay_ms == 0 {
            return Err(GiflapseError::validation("frame_delay_ms must be non-zero"));
        }
        if !QUALITY_RANGE.contains(&self.quality) {
            return Err(GiflapseError::validation(format!(
                "quality {} is outside {}..={}",
                self.quality,
                QUALITY_RANGE.start(),
                QUALITY_RANGE.end()
            )));
        }
        Ok(())
    }
}

/// How often the finished animation loops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Repeat {
    #[default]
    Infinite,
    /// Play once, no loop extension is written.
    Never,
    Finite(u16),
}

impl Repeat {
    /// Integer mapping kept from the original configuration surface:
    /// 0 loops forever, negative plays once, n loops n times.
    pub fn from_loop_count(count: i64) -> Self {
        match count {
            0 => Self::Infinite,
            c if c < 0 => Self::Never,
            c => Self::Finite(c.min(i64::from(u16::MAX)) as u16),
        }
    }
}

pub fn default_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

fn default_frame_delay_ms() -> u32 {
    100
}

fn default_quality() -> u8 {
    10
}

/// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional) into straight RGBA.
pub fn parse_hex_color(s: &str) -> GiflapseResult<[u8; 4]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if !hex.is_ascii() {
        return Err(GiflapseError::validation(format!("invalid hex color '{s}'")));
    }

    let byte_at = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| GiflapseError::validation(format!("invalid hex color '{s}'")))
    };

    match hex.len() {
        6 => Ok([byte_at(0)?, byte_at(2)?, byte_at(4)?, 255]),
        8 => Ok([byte_at(0)?, byte_at(2)?, byte_at(4)?, byte_at(6)?]),
        _ => Err(GiflapseError::validation(format!(
            "invalid hex color '{s}' (expected #RRGGBB or #RRGGBBAA)"
        ))),
    }
}
