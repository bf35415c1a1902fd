//! Single-owner session tying a captured image to calibration and slope
//! measurement.

use chart_calib_core::{crop_region, AxisSegment, RgbaImage, RgbaImageView, SelectionRect};
use chart_calib_lines::{AxisDetection, AxisDetector, AxisDetectorParams};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::calibration::{
    CalibrationEngine, CalibrationParams, CalibrationPhase, ClickOutcome, HoverReadout,
};
use crate::format::mapping_summary;
use crate::slope::{SlopeMeasurement, SlopeMeasurer};
use crate::types::{CalibratedPoint, ValueMapper};
use crate::SessionError;

/// Settings for a whole session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    pub detector: AxisDetectorParams,
    pub calibration: CalibrationParams,
}

/// Where a click went.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionClick {
    /// Consumed by an active slope measurement; carries the result once the
    /// second point is in.
    Slope(Option<SlopeMeasurement>),
    Calibration(ClickOutcome),
}

/// One chart being calibrated.
///
/// Loading a new image discards all calibration and measurement state.
pub struct ChartSession {
    params: SessionParams,
    detector: AxisDetector,
    image: Option<RgbaImage>,
    engine: CalibrationEngine,
    slope: SlopeMeasurer,
    detection: Option<AxisDetection>,
}

impl ChartSession {
    pub fn new(params: SessionParams) -> Result<Self, SessionError> {
        let detector = AxisDetector::new(params.detector.clone())?;
        let engine = CalibrationEngine::new(params.calibration.clone());
        Ok(Self {
            params,
            detector,
            image: None,
            engine,
            slope: SlopeMeasurer::new(),
            detection: None,
        })
    }

    #[inline]
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    #[inline]
    pub fn engine(&self) -> &CalibrationEngine {
        &self.engine
    }

    /// Direct access for marker edits and value prompts.
    #[inline]
    pub fn engine_mut(&mut self) -> &mut CalibrationEngine {
        &mut self.engine
    }

    #[inline]
    pub fn slope(&self) -> &SlopeMeasurer {
        &self.slope
    }

    /// Last automatic detection run, if any.
    pub fn detection(&self) -> Option<&AxisDetection> {
        self.detection.as_ref()
    }

    /// Take ownership of an RGBA capture and start manual axis drawing.
    pub fn load_image(&mut self, image: RgbaImage) {
        log::info!("image loaded: {}x{}", image.width, image.height);
        self.image = Some(image);
        self.detection = None;
        self.slope.reset();
        self.engine.start_manual();
    }

    /// Validate a raw RGBA buffer and load it.
    pub fn load_raw(
        &mut self,
        width: usize,
        height: usize,
        data: Vec<u8>,
    ) -> Result<(), SessionError> {
        let image = RgbaImage::from_raw(width, height, data)?;
        self.load_image(image);
        Ok(())
    }

    /// Crop a selection out of a full capture and load the crop.
    pub fn load_region(
        &mut self,
        capture: &RgbaImageView<'_>,
        rect: &SelectionRect,
        scale: Vector2<f64>,
    ) -> Result<(), SessionError> {
        let image = crop_region(capture, rect, scale)?;
        self.load_image(image);
        Ok(())
    }

    /// Drop the image and every piece of state derived from it.
    pub fn reset(&mut self) {
        self.image = None;
        self.detection = None;
        self.slope.reset();
        self.engine.reset();
    }

    /// Restart calibration on the current image with hand-drawn axes.
    pub fn restart_calibration(&mut self) -> Result<(), SessionError> {
        if self.image.is_none() {
            return Err(SessionError::NoImage);
        }
        self.slope.reset();
        self.engine.start_manual();
        Ok(())
    }

    /// Detect axes on the current image and, when both are found, jump
    /// straight to tick placement. Otherwise calibration restarts with manual
    /// axis drawing.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn auto_detect_axes(&mut self) -> Result<&AxisDetection, SessionError> {
        let image = self.image.as_ref().ok_or(SessionError::NoImage)?;
        let detection = self.detector.detect(&image.view());
        self.slope.reset();
        self.engine.start_from_suggestion(&detection.suggestion);
        Ok(&*self.detection.insert(detection))
    }

    /// Calibrate against known axes, skipping the drawing phases.
    pub fn set_axes(
        &mut self,
        x_axis: AxisSegment,
        y_axis: AxisSegment,
    ) -> Result<Point2<f64>, SessionError> {
        if self.image.is_none() {
            return Err(SessionError::NoImage);
        }
        self.slope.reset();
        Ok(self.engine.start_with_axes(x_axis, y_axis))
    }

    /// Begin a slope measurement; it takes precedence over calibration clicks
    /// until finished.
    pub fn start_slope(&mut self) -> Result<(), SessionError> {
        if self.image.is_none() {
            return Err(SessionError::NoImage);
        }
        self.slope.start();
        Ok(())
    }

    /// Route a click to the active slope measurement, else to calibration.
    pub fn click(&mut self, p: Point2<f64>) -> SessionClick {
        if self.slope.is_active() {
            SessionClick::Slope(self.slope.click(p, &self.engine))
        } else {
            SessionClick::Calibration(self.engine.click(p))
        }
    }

    pub fn hover(&self, p: Point2<f64>) -> HoverReadout {
        self.engine.hover(p)
    }

    #[inline]
    pub fn phase(&self) -> CalibrationPhase {
        self.engine.phase()
    }

    /// Status line, slope measurement first.
    pub fn instructions(&self) -> String {
        if self.slope.is_active() {
            self.slope.instructions().to_string()
        } else {
            self.engine.instructions()
        }
    }

    /// Result panel text: resolved mappings and the last finite slope.
    pub fn summary(&self) -> String {
        mapping_summary(&self.engine.state().mappings, self.slope.result())
    }
}

impl ValueMapper for ChartSession {
    fn pixel_to_value(&self, p: Point2<f64>) -> CalibratedPoint {
        self.engine.pixel_to_value(p)
    }
}
