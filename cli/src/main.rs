use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use overlay_core::{
    CodeDetection, DeviceClass, FillPolicy, FrameGeometry, Highlight, HighlightMapper,
    PipelineOptions, ScanMode, ScanPipeline, Size,
};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "scan-overlay",
    version,
    about = "Replay recorded code detections into viewport highlight rectangles",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded batch file through a stateless mapper.
    Compute {
        /// Input JSON file: an array of frame records
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        mapping: MappingArgs,
    },

    /// Stream NDJSON frame records from stdin through a stateful session.
    Stream {
        #[command(flatten)]
        mapping: MappingArgs,

        /// When the scan event should fire
        #[arg(long, value_enum, default_value_t = ModeArg::Continuous)]
        mode: ModeArg,

        /// Do not skip the first frame's highlight pass
        #[arg(long)]
        no_first_frame_skip: bool,

        /// Suppress highlight computation, keep scan events
        #[arg(long)]
        no_highlighting: bool,
    },
}

#[derive(Args)]
struct MappingArgs {
    /// Fill policy of the preview surface
    #[arg(long, value_enum, default_value_t = PolicyArg::Cover)]
    policy: PolicyArg,

    /// Device class for the axis-swap table
    #[arg(long, value_enum, default_value_t = DeviceArg::Phone)]
    device: DeviceArg,
}

impl MappingArgs {
    fn mapper(&self) -> HighlightMapper {
        HighlightMapper::new(self.policy.into(), self.device.into())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Cover,
    Contain,
    Stretch,
}

impl From<PolicyArg> for FillPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Cover => Self::Cover,
            PolicyArg::Contain => Self::Contain,
            PolicyArg::Stretch => Self::Stretch,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeviceArg {
    Phone,
    Tablet,
}

impl From<DeviceArg> for DeviceClass {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Phone => Self::Phone,
            DeviceArg::Tablet => Self::LargeTablet,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Continuous,
    Once,
}

impl From<ModeArg> for ScanMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Continuous => Self::Continuous,
            ModeArg::Once => Self::Once,
        }
    }
}

// ── Wire records ──────────────────────────────────────────────────────────────

/// One recorded frame: sensor geometry, the measured viewport, and the
/// detections the native scanner returned.
#[derive(Debug, Deserialize)]
struct FrameRecord {
    frame: FrameGeometry,
    viewport: Size,
    #[serde(default)]
    detections: Vec<CodeDetection>,
}

#[derive(Debug, Serialize)]
struct ComputeRecord {
    highlights: Vec<Highlight>,
}

#[derive(Debug, Serialize)]
struct StreamRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    highlights: Option<Vec<Highlight>>,
    emit_scan: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Respect RUST_LOG; default to info. Logs go to stderr so the stream
    // command's stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compute {
            input,
            output,
            mapping,
        } => cmd_compute(input, output, mapping),
        Commands::Stream {
            mapping,
            mode,
            no_first_frame_skip,
            no_highlighting,
        } => cmd_stream(mapping, mode, no_first_frame_skip, no_highlighting),
    }
}

// ── Batch replay ──────────────────────────────────────────────────────────────

fn cmd_compute(input: PathBuf, output: Option<PathBuf>, mapping: MappingArgs) -> Result<()> {
    info!("batch replay");
    info!("  input  : {}", input.display());

    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("could not read {}", input.display()))?;
    let frames: Vec<FrameRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse frame records from {}", input.display()))?;

    let mapper = mapping.mapper();
    let pb = progress(frames.len() as u64, "Computing highlights");

    // The mapper is stateless, so frames fan out across the thread pool;
    // collect preserves input order.
    let records: Vec<ComputeRecord> = frames
        .par_iter()
        .map(|record| {
            let highlights = mapper.compute(&record.detections, record.frame, record.viewport);
            pb.inc(1);
            ComputeRecord { highlights }
        })
        .collect();

    pb.finish_with_message("Done.");

    let json = serde_json::to_string_pretty(&records).context("could not serialize highlights")?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("could not write {}", path.display()))?;
            info!("  output : {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

// ── Streaming session ─────────────────────────────────────────────────────────

fn cmd_stream(
    mapping: MappingArgs,
    mode: ModeArg,
    no_first_frame_skip: bool,
    no_highlighting: bool,
) -> Result<()> {
    let options = PipelineOptions {
        mode: mode.into(),
        skip_first_frame: !no_first_frame_skip,
        highlighting: !no_highlighting,
    };
    let mut pipeline = ScanPipeline::new(mapping.mapper(), options);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = line.context("could not read frame record from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        // A malformed record drops that frame, not the session.
        let record: FrameRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_no + 1, "skipping malformed frame record: {e}");
                continue;
            }
        };

        let update = pipeline.process_frame(&record.detections, record.frame, record.viewport);
        let reply = StreamRecord {
            highlights: update.highlights,
            emit_scan: update.emit_scan,
        };
        serde_json::to_writer(&mut out, &reply).context("could not serialize frame update")?;
        writeln!(out)?;
        out.flush()?;
    }

    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn progress(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message(msg.to_string());
    pb
}
