use chart_calib_core::ImageError;
use chart_calib_lines::LinesError;

use crate::MarkerId;

/// Errors returned by [`crate::CalibrationEngine`] for caller mistakes.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("unknown marker {0}")]
    UnknownMarker(MarkerId),
    #[error("axis value must be finite, got {0}")]
    NonFiniteValue(f64),
    #[error("both axes must be set before adding markers")]
    AxesNotSet,
}

/// Errors returned by [`crate::ChartSession`].
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("no image loaded")]
    NoImage,
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Lines(#[from] LinesError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}
