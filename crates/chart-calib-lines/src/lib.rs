//! Automatic axis detection for chart images.
//!
//! The pipeline is biased toward axis-like lines only:
//! - a Sobel edge map from `chart-calib-core`,
//! - a Hough transform voting in two narrow angle bands (near-vertical and
//!   near-horizontal normals) with 1-D peak extraction,
//! - first-fit clustering of near-duplicate lines,
//! - a scoring heuristic that picks the x and y axis candidates.
//!
//! Nothing here is fatal: no edges, no peaks or no segment all reduce to
//! empty results so callers can fall back to drawing axes by hand.

mod cluster;
mod detector;
mod error;
mod hough;
mod line;
mod suggest;

pub use cluster::{cluster_lines, refit_segments, ClusterParams};
pub use detector::{AxisDetection, AxisDetector, AxisDetectorParams};
pub use error::LinesError;
pub use hough::{
    find_lines, find_peaks, segment_from_polar, HoughAccumulator, HoughParams, HoughPeak,
};
pub use line::{DetectedLine, Orientation};
pub use suggest::{suggest_axes, AxisSuggestion};
