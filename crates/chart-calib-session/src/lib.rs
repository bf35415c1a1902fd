//! Interactive chart calibration.
//!
//! [`CalibrationEngine`] turns two axis lines and a few user-declared tick
//! values into per-axis affine maps `value = a * t + b`, where `t` is the
//! signed pixel offset of a point's projection along the axis.
//! [`SlopeMeasurer`] reads two points through that mapping (or through raw
//! pixels when calibration is incomplete). [`ChartSession`] owns an image and
//! both tools for the lifetime of one chart.
//!
//! ```
//! use chart_calib_core::AxisSegment;
//! use chart_calib_session::{AxisKind, CalibrationEngine, ValueMapper};
//! use nalgebra::Point2;
//!
//! let mut engine = CalibrationEngine::default();
//! engine.start_with_axes(
//!     AxisSegment::from_coords(0.0, 100.0, 200.0, 100.0),
//!     AxisSegment::from_coords(0.0, 100.0, 0.0, 0.0),
//! );
//! engine.add_marker(AxisKind::X, Point2::new(0.0, 100.0), Some(10.0)).unwrap();
//! engine.add_marker(AxisKind::X, Point2::new(100.0, 100.0), Some(110.0)).unwrap();
//! let v = engine.pixel_to_value(Point2::new(50.0, 20.0));
//! assert!((v.x.unwrap() - 60.0).abs() < 1e-9);
//! assert!(v.y.is_none());
//! ```

mod calibration;
mod error;
mod format;
mod session;
mod slope;
mod types;

pub use calibration::{
    fit_axis_mapping, AxisFrame, CalibrationEngine, CalibrationParams, CalibrationPhase,
    CalibrationState, ClickOutcome, HoverReadout, RejectReason, ValuePrompt, FIT_EPS,
};
pub use error::{CalibrationError, SessionError};
pub use format::{format_optional, format_value, mapping_summary};
pub use session::{ChartSession, SessionClick, SessionParams};
pub use slope::{
    slope_from_deltas, SlopeMeasurement, SlopeMeasurer, SlopePhase, SlopeSample, SLOPE_DX_EPS,
};
pub use types::{
    AxisKind, AxisMapping, CalibratedPoint, Marker, MarkerId, PerAxis, ValueMapper,
};
