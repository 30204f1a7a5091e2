//! stitchpath: turn extracted vector geometry into a DST stitch file.
//!
//! Reads a `GeometryDocument` JSON file, runs the stitch pipeline with
//! configurable parameters, prints per-stage diagnostics and writes the
//! ordered stitches as Tajima DST. Optionally writes an SVG preview with
//! the jump travel drawn in.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin stitchpath -- [OPTIONS] <INPUT> <OUTPUT>
//! ```
//!
//! Logging goes to stderr and honours `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout)]

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use stitchpath_export::{DstEmitter, StitchEmitter, SvgMetadata};
use stitchpath_pipeline::diagnostics::Clock;
use stitchpath_pipeline::{GeometryDocument, PipelineConfig, ShapeStitcherKind};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Convert vector geometry into an ordered embroidery stitch file.
///
/// Strokes are sampled at a constant pitch, sewn as single or triple
/// stitches, ordered to keep jumps short, and written as Tajima DST.
#[derive(Parser)]
#[command(name = "stitchpath", version)]
struct Cli {
    /// Input geometry document (JSON).
    input: PathBuf,

    /// Output DST file.
    output: PathBuf,

    /// Shape stitching strategy.
    #[arg(long, value_enum, default_value_t = Mode::Normal)]
    mode: Mode,

    /// Distance between stitches in millimetres.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_PITCH)]
    pitch: f64,

    /// Junction marker diameter in millimetres.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_STAR_SIZE)]
    star_size: f64,

    /// Strokes at least this wide (mm) are sewn as triple stitches.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_TRIPLE_STROKE_WIDTH)]
    triple_stroke_width: f64,

    /// Arc-length table resolution per curve.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CURVE_SEGMENTS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    curve_segments: usize,

    /// Keep segments in input order instead of minimising jumps.
    #[arg(long)]
    no_optimize: bool,

    /// Write an SVG preview to this file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Shape stitching strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Every stroked path; triple stitch for wide strokes.
    Normal,
    /// Fritzing 0.9 PCB exports: skip the board outline, lighter
    /// connectors, star-capped traces.
    Fritzing09,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        pitch: cli.pitch,
        star_size: cli.star_size,
        triple_stroke_width: cli.triple_stroke_width,
        curve_segments: cli.curve_segments,
        stitcher: match cli.mode {
            Mode::Normal => ShapeStitcherKind::Normal,
            Mode::Fritzing09 => ShapeStitcherKind::Fritzing09,
        },
        optimize_order: !cli.no_optimize,
    })
}

/// Design name for file headers: the input's file stem.
fn design_name(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stitchpath")
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_document(path: &Path) -> Result<GeometryDocument, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            tracing::error!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;
    let doc = read_document(&cli.input)?;
    tracing::info!(
        input = %cli.input.display(),
        shapes = doc.shapes.len(),
        wires = doc.wires.len(),
        "loaded geometry"
    );
    tracing::debug!(?config, "pipeline config");

    let (result, diagnostics) =
        stitchpath_pipeline::diagnostics::process_with_diagnostics(&doc, &config, &StdClock)
            .map_err(|e| format!("Pipeline error: {e}"))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", diagnostics.report());
    }

    let name = design_name(&cli.input);

    let file = File::create(&cli.output)
        .map_err(|e| format!("Error creating {}: {e}", cli.output.display()))?;
    let mut emitter = DstEmitter::new(BufWriter::new(file)).with_label(name);
    emitter
        .emit(&result.segments)
        .map_err(|e| format!("Error writing {}: {e}", cli.output.display()))?;
    tracing::info!(
        output = %cli.output.display(),
        stitches = result.stitch_count(),
        "DST written"
    );

    if let Some(ref svg_path) = cli.svg {
        let desc = format!("{config:#?}");
        let metadata = SvgMetadata {
            title: Some(name),
            description: Some(&desc),
        };
        let svg = stitchpath_export::to_svg(&result.segments, &metadata);
        std::fs::write(svg_path, &svg)
            .map_err(|e| format!("Error writing SVG to {}: {e}", svg_path.display()))?;
        tracing::info!(
            output = %svg_path.display(),
            bytes = svg.len(),
            "SVG written"
        );
    }

    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
