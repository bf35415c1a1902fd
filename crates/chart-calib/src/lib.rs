//! High-level facade crate for the `chart-calib-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the underlying crates
//! - (feature-gated) helpers that decode image files with `image` and run
//!   axis detection or open a calibration session on them
//! - (feature-gated) the `chart-calib` command line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use chart_calib::detect;
//! use chart_calib::lines::AxisDetectorParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detection = detect::detect_axes_in_file("plot.png", AxisDetectorParams::default())?;
//! if let (Some(x), Some(y)) = (detection.suggestion.x_axis, detection.suggestion.y_axis) {
//!     println!("x axis {:?}, y axis {:?}", x.segment, y.segment);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `chart_calib::core`: RGBA views, region crop, Sobel edges, axis geometry.
//! - `chart_calib::lines`: band-limited Hough lines, clustering, axis suggestion.
//! - `chart_calib::session`: calibration state machine, slope measurement,
//!   single-owner chart session.
//! - `chart_calib::detect` (feature `image`): end-to-end helpers from image files.

pub use chart_calib_core as core;
pub use chart_calib_lines as lines;
pub use chart_calib_session as session;

pub use chart_calib_core::{AxisBasis, AxisSegment, RgbaImage, RgbaImageView};
pub use chart_calib_lines::{AxisDetection, AxisDetector, AxisDetectorParams, AxisSuggestion};
pub use chart_calib_session::{
    AxisKind, AxisMapping, CalibratedPoint, CalibrationEngine, ChartSession, SlopeMeasurer,
    ValueMapper,
};

#[cfg(feature = "image")]
pub mod detect;
