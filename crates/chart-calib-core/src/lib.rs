//! Core types and utilities for chart axis calibration.
//!
//! This crate is intentionally small: RGBA buffer views, the Sobel edge map
//! that feeds line detection, and the axis geometry (segments, bases,
//! projection) shared by detection and calibration. It performs no I/O.

mod angle;
mod edges;
mod error;
mod geometry;
mod image;
mod logger;

pub use angle::{angular_dist_pi, wrap_angle_pi};
pub use edges::{detect_edges, luminance_plane, EdgeMap, EdgeParams};
pub use error::ImageError;
pub use geometry::{
    axes_origin, fallback_direction, AxisBasis, AxisSegment, Projection, PARALLEL_EPS,
};
pub use image::{crop_region, luminance, RgbaImage, RgbaImageView, SelectionRect, MIN_SELECTION_SIZE};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
