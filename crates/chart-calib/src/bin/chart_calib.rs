//! chart-calib CLI: detect axes in chart images and replay calibrations.

use std::path::{Path, PathBuf};

use chart_calib::core::{AxisSegment, RgbaImage};
use chart_calib::detect::{self, DetectError};
use chart_calib::lines::AxisDetectorParams;
use chart_calib::session::{
    AxisKind, AxisMapping, CalibratedPoint, CalibrationError, CalibrationPhase, ChartSession,
    ClickOutcome, Marker, PerAxis, SessionClick, SessionError, SessionParams, SlopeMeasurement,
    ValueMapper,
};
use clap::{Args, Parser, Subcommand};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("invalid script: {0}")]
    Script(String),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "chart-calib")]
#[command(about = "Detect chart axes and map chart pixels to data values")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect axis-like lines in an image and suggest the x and y axes.
    Detect(DetectArgs),

    /// Replay a calibration script and print mappings and queried values.
    Calibrate(CalibrateArgs),
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Path to the input image.
    image: PathBuf,

    /// Detector parameters (JSON); missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON result here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CalibrateArgs {
    /// Calibration script (JSON).
    script: PathBuf,

    /// Write the JSON result here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Axis pair given as `[[x1, y1], [x2, y2]]` per axis.
#[derive(Debug, Clone, Deserialize)]
struct AxisPair {
    x: [[f64; 2]; 2],
    y: [[f64; 2]; 2],
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum AutoKeyword {
    #[serde(rename = "auto")]
    Auto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AxesSpec {
    Auto(AutoKeyword),
    Explicit(AxisPair),
}

#[derive(Debug, Clone, Deserialize)]
struct TickSpec {
    pixel: [f64; 2],
    value: f64,
    /// Place the tick on this axis directly; otherwise it is clicked and
    /// lands on the nearest axis.
    #[serde(default)]
    axis: Option<AxisKind>,
}

#[derive(Debug, Clone, Deserialize)]
struct CalibrationScript {
    /// Image file, relative to the script's directory.
    #[serde(default)]
    image: Option<PathBuf>,
    /// Size of a blank canvas when no image is given.
    #[serde(default)]
    size: Option<[usize; 2]>,
    #[serde(default)]
    params: SessionParams,
    axes: AxesSpec,
    #[serde(default)]
    ticks: Vec<TickSpec>,
    #[serde(default)]
    queries: Vec<[f64; 2]>,
    #[serde(default)]
    slope: Option<[[f64; 2]; 2]>,
}

#[derive(Debug, Serialize)]
struct QueryResult {
    pixel: Point2<f64>,
    #[serde(flatten)]
    value: CalibratedPoint,
}

#[derive(Debug, Serialize)]
struct CalibrationReport {
    phase: CalibrationPhase,
    origin: Option<Point2<f64>>,
    mappings: PerAxis<Option<AxisMapping>>,
    markers: Vec<Marker>,
    rejected: Vec<String>,
    queries: Vec<QueryResult>,
    slope: Option<SlopeMeasurement>,
    summary: String,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Detect(args) => run_detect(args),
        Commands::Calibrate(args) => run_calibrate(args),
    };
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_verbose: u8) {
    chart_calib::core::init_tracing();
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8) {
    use log::LevelFilter;

    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(err) = chart_calib::core::init_with_level(level) {
        eprintln!("logger already installed: {err}");
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> CliResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json).map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            log::info!("results written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let params: AxisDetectorParams = match &args.config {
        Some(path) => read_json(path)?,
        None => AxisDetectorParams::default(),
    };
    let detection = detect::detect_axes_in_file(&args.image, params)?;
    log::info!(
        "{}: {} lines, {} clusters, axes complete: {}",
        args.image.display(),
        detection.lines.len(),
        detection.clustered.len(),
        detection.suggestion.is_complete()
    );
    emit(&detection, args.out.as_deref())
}

fn segment(p: [[f64; 2]; 2]) -> AxisSegment {
    AxisSegment::from_coords(p[0][0], p[0][1], p[1][0], p[1][1])
}

fn open_session(script: &CalibrationScript, script_path: &Path) -> CliResult<ChartSession> {
    match (&script.image, script.size) {
        (Some(image), _) => {
            let path = match script_path.parent() {
                Some(dir) if image.is_relative() => dir.join(image),
                _ => image.clone(),
            };
            Ok(detect::session_from_file(path, script.params.clone())?)
        }
        (None, Some([w, h])) => {
            if w == 0 || h == 0 {
                return Err(CliError::Script(format!("canvas size {w}x{h} is empty")));
            }
            let mut session = ChartSession::new(script.params.clone())?;
            let canvas =
                RgbaImage::filled(w, h, [255, 255, 255, 255]).map_err(SessionError::from)?;
            session.load_image(canvas);
            Ok(session)
        }
        (None, None) => Err(CliError::Script(
            "either \"image\" or \"size\" is required".to_string(),
        )),
    }
}

fn run_calibrate(args: &CalibrateArgs) -> CliResult<()> {
    let script: CalibrationScript = read_json(&args.script)?;
    let mut session = open_session(&script, &args.script)?;

    match &script.axes {
        AxesSpec::Auto(AutoKeyword::Auto) => {
            let detection = session.auto_detect_axes()?;
            if !detection.suggestion.is_complete() {
                return Err(CliError::Script(
                    "automatic axis detection found no complete axis pair".to_string(),
                ));
            }
        }
        AxesSpec::Explicit(pair) => {
            session.set_axes(segment(pair.x), segment(pair.y))?;
        }
    }

    let mut rejected = Vec::new();
    for tick in &script.ticks {
        let p = Point2::new(tick.pixel[0], tick.pixel[1]);
        match tick.axis {
            Some(axis) => {
                session.engine_mut().add_marker(axis, p, Some(tick.value))?;
            }
            None => match session.click(p) {
                SessionClick::Calibration(ClickOutcome::ValueRequested(prompt)) => {
                    session
                        .engine_mut()
                        .submit_value(prompt.marker, tick.value)?;
                }
                SessionClick::Calibration(ClickOutcome::Rejected(reason)) => {
                    log::warn!("tick at ({}, {}) rejected", p.x, p.y);
                    rejected.push(reason.message());
                }
                SessionClick::Calibration(ClickOutcome::Ignored) => {
                    log::warn!("tick at ({}, {}) ignored", p.x, p.y);
                    rejected.push(match session.phase() {
                        CalibrationPhase::Done => "calibration already complete".to_string(),
                        phase => format!("click ignored while in phase {phase:?}"),
                    });
                }
                other => {
                    return Err(CliError::Script(format!(
                        "unexpected click outcome {other:?}"
                    )))
                }
            },
        }
    }

    let queries = script
        .queries
        .iter()
        .map(|q| {
            let pixel = Point2::new(q[0], q[1]);
            QueryResult {
                pixel,
                value: session.pixel_to_value(pixel),
            }
        })
        .collect();

    let slope = match script.slope {
        Some([a, b]) => {
            session.start_slope()?;
            session.click(Point2::new(a[0], a[1]));
            match session.click(Point2::new(b[0], b[1])) {
                SessionClick::Slope(m) => m,
                SessionClick::Calibration(_) => None,
            }
        }
        None => None,
    };

    let engine = session.engine();
    let report = CalibrationReport {
        phase: engine.phase(),
        origin: engine.frame().map(|f| f.origin),
        mappings: PerAxis {
            x: engine.mapping(AxisKind::X),
            y: engine.mapping(AxisKind::Y),
        },
        markers: engine.markers().to_vec(),
        rejected,
        queries,
        slope,
        summary: session.summary(),
    };
    emit(&report, args.out.as_deref())
}
