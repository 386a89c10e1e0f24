use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use giflapse::{PipelineConfig, Repeat, default_extensions, parse_hex_color};

#[derive(Parser, Debug)]
#[command(
    name = "giflapse",
    version,
    about = "Assemble a directory of still images into an animated GIF, ordered by creation time"
)]
struct Cli {
    /// Full pipeline configuration as a JSON file (overrides all other flags).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing the source images.
    #[arg(long = "in-dir", default_value = "images")]
    in_dir: PathBuf,

    /// Output GIF path, overwritten if it exists.
    #[arg(long, default_value = "output.gif")]
    out: PathBuf,

    /// Delay between frames in milliseconds.
    #[arg(long, default_value_t = 100)]
    delay_ms: u32,

    /// Quantization speed/quality trade-off (1 = best, 30 = fastest).
    #[arg(long, default_value_t = 10)]
    quality: u8,

    /// Loop count: 0 loops forever, negative plays once, n loops n times.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    repeat: i64,

    /// Background fill as #RRGGBB or #RRGGBBAA; omit for transparent frames.
    #[arg(long)]
    background: Option<String>,

    /// Allowed source extension (repeatable; defaults to png, jpg, jpeg).
    #[arg(long = "ext")]
    extensions: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => config_from_flags(&cli)?,
    };

    let report = giflapse::run_to_file(&cfg)?;
    eprintln!(
        "wrote {} ({} bytes, {} frames, {} skipped)",
        cfg.out_path.display(),
        report.out_size_bytes.unwrap_or(0),
        report.frames_encoded,
        report.skipped.len()
    );
    Ok(())
}

fn config_from_flags(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let background = cli
        .background
        .as_deref()
        .map(parse_hex_color)
        .transpose()?;
    let extensions = if cli.extensions.is_empty() {
        default_extensions()
    } else {
        cli.extensions.clone()
    };

    let cfg = PipelineConfig {
        source_dir: cli.in_dir.clone(),
        out_path: cli.out.clone(),
        extensions,
        frame_delay_ms: cli.delay_ms,
        quality: cli.quality,
        repeat: Repeat::from_loop_count(cli.repeat),
        background,
    };
    cfg.validate()?;
    Ok(cfg)
}
