//! Interactive axis calibration.
//!
//! The engine walks `idle → draw-x-pt1 → draw-x-pt2 → draw-y-pt1 →
//! draw-y-pt2 → await-points → done`. Once both axes exist, clicks become
//! tick markers on the nearest axis; each marker waits for a declared value
//! and every value change refits the mapping of that marker's axis only.

use chart_calib_core::{axes_origin, AxisBasis, AxisSegment};
use chart_calib_lines::AxisSuggestion;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::types::{
    AxisKind, AxisMapping, CalibratedPoint, Marker, MarkerId, PerAxis, ValueMapper,
};
use crate::CalibrationError;

/// Offsets (or offset differences) at or below this cannot anchor a fit.
pub const FIT_EPS: f64 = 1e-6;

/// Calibration protocol settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Interactive clicks stop creating markers on an axis once it holds this
    /// many. Markers added through [`CalibrationEngine::add_marker`] are not
    /// capped.
    pub max_markers_per_axis: usize,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            max_markers_per_axis: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationPhase {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "draw-x-pt1")]
    DrawXStart,
    #[serde(rename = "draw-x-pt2")]
    DrawXEnd,
    #[serde(rename = "draw-y-pt1")]
    DrawYStart,
    #[serde(rename = "draw-y-pt2")]
    DrawYEnd,
    #[serde(rename = "await-points")]
    AwaitPoints,
    #[serde(rename = "done")]
    Done,
}

/// Both axes with their shared origin and bases.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisFrame {
    pub segments: PerAxis<AxisSegment>,
    pub origin: Point2<f64>,
    pub bases: PerAxis<AxisBasis>,
}

impl AxisFrame {
    /// Bases anchored at the axes' intersection, or at the x axis' first
    /// endpoint when the axes are parallel.
    pub fn new(x_axis: AxisSegment, y_axis: AxisSegment) -> Self {
        let origin = axes_origin(&x_axis, &y_axis);
        Self {
            segments: PerAxis {
                x: x_axis,
                y: y_axis,
            },
            origin,
            bases: PerAxis {
                x: AxisBasis::from_segment(&x_axis, Some(origin)),
                y: AxisBasis::from_segment(&y_axis, Some(origin)),
            },
        }
    }

    /// Axis whose line passes closest to `p`; ties go to y.
    pub fn nearest_axis(&self, p: Point2<f64>) -> AxisKind {
        let dx = self.segments.x.distance_to(p);
        let dy = self.segments.y.distance_to(p);
        if dx < dy {
            AxisKind::X
        } else {
            AxisKind::Y
        }
    }
}

/// Everything a renderer needs to draw the calibration overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    pub phase: CalibrationPhase,
    /// Axes drawn so far; the frame is only built once both exist.
    pub drawn: PerAxis<Option<AxisSegment>>,
    /// First endpoint of the axis currently being drawn.
    pub draw_start: Option<Point2<f64>>,
    pub frame: Option<AxisFrame>,
    pub markers: Vec<Marker>,
    pub mappings: PerAxis<Option<AxisMapping>>,
    /// Marker whose value prompt is outstanding.
    pub pending: Option<MarkerId>,
    next_marker_id: u32,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            drawn: PerAxis::default(),
            draw_start: None,
            frame: None,
            markers: Vec::new(),
            mappings: PerAxis::default(),
            pending: None,
            next_marker_id: 1,
        }
    }
}

/// Request for the caller to ask the user for an axis value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValuePrompt {
    pub marker: MarkerId,
    pub axis: AxisKind,
    pub label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The nearest axis already holds its share of interactive markers.
    AxisFull(AxisKind),
    /// A value prompt must be answered or cancelled first.
    PromptPending(MarkerId),
}

impl RejectReason {
    pub fn message(&self) -> String {
        match self {
            RejectReason::AxisFull(axis) => format!(
                "{} point already set. Click near the {}-axis or remove the {} point.",
                axis.to_string().to_uppercase(),
                axis.other().to_string().to_uppercase(),
                axis.to_string().to_uppercase(),
            ),
            RejectReason::PromptPending(id) => format!("Enter a value for marker {id} first."),
        }
    }
}

/// Pointer readout, see [`CalibrationEngine::hover`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoverReadout {
    pub pixel: Point2<f64>,
    pub value: CalibratedPoint,
    /// Projection of the pointer onto each axis, once axes exist.
    pub feet: PerAxis<Option<Point2<f64>>>,
    pub preview: Option<AxisSegment>,
}

/// What a click did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClickOutcome {
    /// The current phase takes no clicks.
    Ignored,
    AxisStarted(AxisKind),
    /// The x axis is complete; the y axis comes next.
    AxisDrawn(AxisKind),
    /// Both axes are complete and tick markers can be placed.
    AxesReady { origin: Point2<f64> },
    ValueRequested(ValuePrompt),
    Rejected(RejectReason),
}

/// Fit `value = a * t + b` from `(t, value)` samples in collection order.
///
/// - no sample: unset
/// - one sample: the axis origin is assumed to read 0, so `a = v / t`,
///   `b = 0`; unset when `|t| <= FIT_EPS`
/// - two or more: line through the first two samples; when their offsets
///   are within `FIT_EPS` of each other `previous` is kept
pub fn fit_axis_mapping(
    samples: &[(f64, f64)],
    previous: Option<AxisMapping>,
) -> Option<AxisMapping> {
    match samples {
        [] => None,
        [(t1, v1)] => (t1.abs() > FIT_EPS).then(|| AxisMapping { a: v1 / t1, b: 0.0 }),
        [(t1, v1), (t2, v2), ..] => {
            let dt = t2 - t1;
            if dt.abs() > FIT_EPS {
                let a = (v2 - v1) / dt;
                Some(AxisMapping { a, b: v1 - a * t1 })
            } else {
                previous
            }
        }
    }
}

/// Single-owner calibration state machine.
#[derive(Clone, Debug, Default)]
pub struct CalibrationEngine {
    params: CalibrationParams,
    state: CalibrationState,
}

impl CalibrationEngine {
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            params,
            state: CalibrationState::default(),
        }
    }

    #[inline]
    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    #[inline]
    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    #[inline]
    pub fn phase(&self) -> CalibrationPhase {
        self.state.phase
    }

    #[inline]
    pub fn frame(&self) -> Option<&AxisFrame> {
        self.state.frame.as_ref()
    }

    #[inline]
    pub fn mapping(&self, axis: AxisKind) -> Option<AxisMapping> {
        self.state.mappings[axis]
    }

    pub fn markers(&self) -> &[Marker] {
        &self.state.markers
    }

    pub fn markers_for(&self, axis: AxisKind) -> impl Iterator<Item = &Marker> {
        self.state.markers.iter().filter(move |m| m.axis == axis)
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.state.markers.iter().find(|m| m.id == id)
    }

    /// Drop everything and go idle.
    pub fn reset(&mut self) {
        self.state = CalibrationState::default();
    }

    /// Drop everything and wait for the first x-axis click.
    pub fn start_manual(&mut self) {
        self.reset();
        self.state.phase = CalibrationPhase::DrawXStart;
        log::info!("calibration restarted: draw the x axis");
    }

    /// Drop everything and calibrate against the given axes right away.
    pub fn start_with_axes(&mut self, x_axis: AxisSegment, y_axis: AxisSegment) -> Point2<f64> {
        self.reset();
        self.state.drawn = PerAxis {
            x: Some(x_axis),
            y: Some(y_axis),
        };
        self.install_frame(x_axis, y_axis)
    }

    /// Use automatically suggested axes; falls back to manual drawing when the
    /// suggestion lacks either axis. Returns whether the suggestion was used.
    pub fn start_from_suggestion(&mut self, suggestion: &AxisSuggestion) -> bool {
        match (&suggestion.x_axis, &suggestion.y_axis) {
            (Some(x), Some(y)) => {
                self.start_with_axes(x.segment, y.segment);
                true
            }
            _ => {
                log::warn!("axis suggestion incomplete, falling back to manual drawing");
                self.start_manual();
                false
            }
        }
    }

    fn install_frame(&mut self, x_axis: AxisSegment, y_axis: AxisSegment) -> Point2<f64> {
        let frame = AxisFrame::new(x_axis, y_axis);
        let origin = frame.origin;
        self.state.frame = Some(frame);
        self.state.phase = CalibrationPhase::AwaitPoints;
        log::info!(
            "axes ready, origin at ({:.1}, {:.1})",
            origin.x,
            origin.y
        );
        origin
    }

    /// Feed one pointer click, in image pixels.
    pub fn click(&mut self, p: Point2<f64>) -> ClickOutcome {
        use CalibrationPhase::*;
        match self.state.phase {
            Idle | Done => ClickOutcome::Ignored,
            DrawXStart => self.begin_axis(AxisKind::X, p, DrawXEnd),
            DrawYStart => self.begin_axis(AxisKind::Y, p, DrawYEnd),
            DrawXEnd => {
                let Some(start) = self.state.draw_start.take() else {
                    self.state.phase = DrawXStart;
                    return ClickOutcome::Ignored;
                };
                self.state.drawn.x = Some(AxisSegment::new(start, p));
                self.state.phase = DrawYStart;
                ClickOutcome::AxisDrawn(AxisKind::X)
            }
            DrawYEnd => {
                let Some(start) = self.state.draw_start.take() else {
                    self.state.phase = DrawYStart;
                    return ClickOutcome::Ignored;
                };
                let y_axis = AxisSegment::new(start, p);
                self.state.drawn.y = Some(y_axis);
                match self.state.drawn.x {
                    Some(x_axis) => {
                        let origin = self.install_frame(x_axis, y_axis);
                        ClickOutcome::AxesReady { origin }
                    }
                    None => {
                        self.state.phase = DrawXStart;
                        ClickOutcome::AxisDrawn(AxisKind::Y)
                    }
                }
            }
            AwaitPoints => self.place_marker(p),
        }
    }

    fn begin_axis(&mut self, axis: AxisKind, p: Point2<f64>, next: CalibrationPhase) -> ClickOutcome {
        self.state.draw_start = Some(p);
        self.state.phase = next;
        ClickOutcome::AxisStarted(axis)
    }

    fn place_marker(&mut self, p: Point2<f64>) -> ClickOutcome {
        if let Some(id) = self.state.pending {
            return ClickOutcome::Rejected(RejectReason::PromptPending(id));
        }
        let Some(frame) = self.state.frame else {
            return ClickOutcome::Ignored;
        };
        let axis = frame.nearest_axis(p);
        if self.markers_for(axis).count() >= self.params.max_markers_per_axis {
            log::warn!("{axis} axis already holds its markers, click rejected");
            return ClickOutcome::Rejected(RejectReason::AxisFull(axis));
        }

        let id = self.push_marker(&frame, axis, p, None);
        self.state.pending = Some(id);
        ClickOutcome::ValueRequested(ValuePrompt {
            marker: id,
            axis,
            label: axis.prompt().to_string(),
        })
    }

    fn push_marker(
        &mut self,
        frame: &AxisFrame,
        axis: AxisKind,
        p: Point2<f64>,
        value: Option<f64>,
    ) -> MarkerId {
        let proj = frame.bases[axis].project(p);
        let id = MarkerId(self.state.next_marker_id);
        self.state.next_marker_id += 1;
        self.state.markers.push(Marker {
            id,
            axis,
            click: p,
            projected: proj.point,
            t: proj.t,
            value,
        });
        log::debug!("marker {id} on {axis} axis at t={:.2}", proj.t);
        id
    }

    /// Answer a value prompt (or set any marker's value).
    pub fn submit_value(&mut self, id: MarkerId, value: f64) -> Result<(), CalibrationError> {
        self.set_marker_value(id, Some(value))
    }

    /// Give up on the outstanding prompt; its marker stays without a value.
    pub fn cancel_prompt(&mut self) -> Option<MarkerId> {
        self.state.pending.take()
    }

    /// Edit or clear the value of a marker and refit its axis.
    pub fn set_marker_value(
        &mut self,
        id: MarkerId,
        value: Option<f64>,
    ) -> Result<(), CalibrationError> {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(CalibrationError::NonFiniteValue(v));
            }
        }
        let marker = self
            .state
            .markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(CalibrationError::UnknownMarker(id))?;
        marker.value = value;
        let axis = marker.axis;

        if self.state.pending == Some(id) && value.is_some() {
            self.state.pending = None;
        }
        self.refit(axis);
        Ok(())
    }

    /// Delete a marker and refit its axis.
    pub fn remove_marker(&mut self, id: MarkerId) -> Result<Marker, CalibrationError> {
        let idx = self
            .state
            .markers
            .iter()
            .position(|m| m.id == id)
            .ok_or(CalibrationError::UnknownMarker(id))?;
        let marker = self.state.markers.remove(idx);
        if self.state.pending == Some(id) {
            self.state.pending = None;
        }
        self.refit(marker.axis);
        Ok(marker)
    }

    /// Place a marker without the interactive prompt.
    pub fn add_marker(
        &mut self,
        axis: AxisKind,
        p: Point2<f64>,
        value: Option<f64>,
    ) -> Result<MarkerId, CalibrationError> {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(CalibrationError::NonFiniteValue(v));
            }
        }
        let frame = self.state.frame.ok_or(CalibrationError::AxesNotSet)?;
        let id = self.push_marker(&frame, axis, p, value);
        self.refit(axis);
        Ok(id)
    }

    fn refit(&mut self, axis: AxisKind) {
        let samples: Vec<(f64, f64)> = self
            .markers_for(axis)
            .filter_map(|m| Some((m.t, m.value?)))
            .collect();
        let mapping = fit_axis_mapping(&samples, self.state.mappings[axis]);
        self.state.mappings[axis] = mapping;
        match mapping {
            Some(m) => log::debug!("{axis} mapping: a={} b={}", m.a, m.b),
            None => log::debug!("{axis} mapping unset"),
        }
        self.update_phase();
    }

    fn update_phase(&mut self) {
        let phase = self.state.phase;
        if !matches!(phase, CalibrationPhase::AwaitPoints | CalibrationPhase::Done) {
            return;
        }
        let resolved = self.state.mappings.x.is_some() && self.state.mappings.y.is_some();
        let next = if resolved {
            CalibrationPhase::Done
        } else {
            CalibrationPhase::AwaitPoints
        };
        if next != phase {
            log::info!("calibration phase {phase:?} -> {next:?}");
            self.state.phase = next;
        }
    }

    /// Segment from the pending first endpoint to `hover`, while drawing.
    pub fn draw_preview(&self, hover: Point2<f64>) -> Option<AxisSegment> {
        match self.state.phase {
            CalibrationPhase::DrawXEnd | CalibrationPhase::DrawYEnd => {
                self.state.draw_start.map(|s| AxisSegment::new(s, hover))
            }
            _ => None,
        }
    }

    /// Readout for the pointer position: calibrated values, the feet of the
    /// perpendiculars on both axes and the axis being drawn.
    pub fn hover(&self, p: Point2<f64>) -> HoverReadout {
        let feet = match &self.state.frame {
            Some(frame) => PerAxis {
                x: Some(frame.bases.x.project(p).point),
                y: Some(frame.bases.y.project(p).point),
            },
            None => PerAxis::default(),
        };
        HoverReadout {
            pixel: p,
            value: self.pixel_to_value(p),
            feet,
            preview: self.draw_preview(p),
        }
    }

    /// Status line telling the user what to do next.
    pub fn instructions(&self) -> String {
        use CalibrationPhase::*;
        let text = match self.state.phase {
            Idle => "Load an image to start.",
            DrawXStart => "Draw X-axis: click first point.",
            DrawXEnd => "Draw X-axis: click second point.",
            DrawYStart => "Draw Y-axis: click first point.",
            DrawYEnd => "Draw Y-axis: click second point.",
            Done => "Calibration complete. Hover to see (X, Y).",
            AwaitPoints => match (self.state.mappings.x, self.state.mappings.y) {
                (Some(_), None) => "X set. Now click a tick near the Y-axis.",
                (None, Some(_)) => "Y set. Now click a tick near the X-axis.",
                _ => "Click one tick near the X-axis and one near the Y-axis.",
            },
        };
        text.to_string()
    }
}

impl ValueMapper for CalibrationEngine {
    /// Evaluate each calibrated axis at the projection of `p`.
    fn pixel_to_value(&self, p: Point2<f64>) -> CalibratedPoint {
        let Some(frame) = &self.state.frame else {
            return CalibratedPoint::default();
        };
        let eval = |axis: AxisKind| {
            self.state.mappings[axis].map(|m| m.eval(frame.bases[axis].project(p).t))
        };
        CalibratedPoint {
            x: eval(AxisKind::X),
            y: eval(AxisKind::Y),
        }
    }
}
