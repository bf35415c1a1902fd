//! Two-click slope measurement.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::types::{CalibratedPoint, ValueMapper};

/// `|dx|` at or below this (but nonzero) leaves the slope unset.
pub const SLOPE_DX_EPS: f64 = 1e-12;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlopePhase {
    #[default]
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "wait-pt1")]
    WaitFirst,
    #[serde(rename = "wait-pt2")]
    WaitSecond,
    #[serde(rename = "done")]
    Done,
}

/// One captured click with whatever calibration was available at the time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlopeSample {
    pub pixel: Point2<f64>,
    pub value: CalibratedPoint,
}

/// Result of a finished measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlopeMeasurement {
    pub points: [SlopeSample; 2],
    pub dx: f64,
    pub dy: f64,
    /// `+inf` when `dx == 0`, `None` when `dx` is nonzero but negligible.
    /// Serialized as `"inf"`/`"-inf"` for infinities, `null` when unset.
    #[serde(with = "slope_repr", default)]
    pub slope: Option<f64>,
    /// Deltas are in calibrated units rather than pixels.
    pub calibrated: bool,
}

impl SlopeMeasurement {
    /// Measure between two samples. Calibrated deltas are used when both
    /// samples carry both coordinates; otherwise pixel deltas with the
    /// vertical axis flipped so that up is positive.
    pub fn between(first: SlopeSample, second: SlopeSample) -> Self {
        let (dx, dy, calibrated) = match (first.value.both(), second.value.both()) {
            (Some((x1, y1)), Some((x2, y2))) => (x2 - x1, y2 - y1, true),
            _ => (
                second.pixel.x - first.pixel.x,
                first.pixel.y - second.pixel.y,
                false,
            ),
        };
        Self {
            points: [first, second],
            dx,
            dy,
            slope: slope_from_deltas(dx, dy),
            calibrated,
        }
    }
}

/// `dy / dx`, `+inf` for an exactly vertical pair, `None` when `dx` is
/// nonzero but within [`SLOPE_DX_EPS`].
pub fn slope_from_deltas(dx: f64, dy: f64) -> Option<f64> {
    if dx.abs() > SLOPE_DX_EPS {
        Some(dy / dx)
    } else if dx == 0.0 {
        Some(f64::INFINITY)
    } else {
        None
    }
}

/// JSON has no infinities, so a vertical pair is written as a label to keep
/// it apart from an unset slope.
mod slope_repr {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Label(String),
    }

    pub fn serialize<S: Serializer>(slope: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match *slope {
            None => s.serialize_none(),
            Some(v) if v == f64::INFINITY => s.serialize_some("inf"),
            Some(v) if v == f64::NEG_INFINITY => s.serialize_some("-inf"),
            Some(v) => s.serialize_some(&v),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Repr>::deserialize(d)? {
            None => Ok(None),
            Some(Repr::Number(v)) => Ok(Some(v)),
            Some(Repr::Label(label)) => match label.as_str() {
                "inf" => Ok(Some(f64::INFINITY)),
                "-inf" => Ok(Some(f64::NEG_INFINITY)),
                other => Err(D::Error::custom(format!("invalid slope {other:?}"))),
            },
        }
    }
}

/// Captures two clicks and reports the slope between them.
#[derive(Clone, Debug, Default)]
pub struct SlopeMeasurer {
    phase: SlopePhase,
    first: Option<SlopeSample>,
    result: Option<SlopeMeasurement>,
}

impl SlopeMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> SlopePhase {
        self.phase
    }

    /// Whether the next click belongs to the measurement.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, SlopePhase::WaitFirst | SlopePhase::WaitSecond)
    }

    /// Sample captured by the first click, while waiting for the second.
    pub fn first_sample(&self) -> Option<&SlopeSample> {
        self.first.as_ref()
    }

    pub fn result(&self) -> Option<&SlopeMeasurement> {
        self.result.as_ref()
    }

    /// Discard any previous measurement and wait for the first click.
    pub fn start(&mut self) {
        *self = Self {
            phase: SlopePhase::WaitFirst,
            ..Self::default()
        };
        log::info!("slope measurement started");
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed a click; returns the measurement once the second point lands.
    /// Clicks outside an active measurement are ignored.
    pub fn click<M: ValueMapper + ?Sized>(
        &mut self,
        p: Point2<f64>,
        mapper: &M,
    ) -> Option<SlopeMeasurement> {
        let sample = SlopeSample {
            pixel: p,
            value: mapper.pixel_to_value(p),
        };
        match self.phase {
            SlopePhase::WaitFirst => {
                self.first = Some(sample);
                self.phase = SlopePhase::WaitSecond;
                None
            }
            SlopePhase::WaitSecond => {
                let first = self.first.take()?;
                let m = SlopeMeasurement::between(first, sample);
                log::info!(
                    "slope measured: dx={} dy={} slope={:?} calibrated={}",
                    m.dx,
                    m.dy,
                    m.slope,
                    m.calibrated
                );
                self.result = Some(m);
                self.phase = SlopePhase::Done;
                Some(m)
            }
            SlopePhase::Idle | SlopePhase::Done => None,
        }
    }

    /// Status line for the current phase.
    pub fn instructions(&self) -> &'static str {
        match self.phase {
            SlopePhase::Idle => "",
            SlopePhase::WaitFirst => "Slope: Click first point.",
            SlopePhase::WaitSecond => "Slope: Click second point.",
            SlopePhase::Done => "Slope measured. Start a new measurement to measure again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// x = px, y = 2 * px.y; enough to exercise calibrated deltas.
    struct Linear;

    impl ValueMapper for Linear {
        fn pixel_to_value(&self, p: Point2<f64>) -> CalibratedPoint {
            CalibratedPoint {
                x: Some(p.x),
                y: Some(2.0 * p.y),
            }
        }
    }

    struct Uncalibrated;

    impl ValueMapper for Uncalibrated {
        fn pixel_to_value(&self, _: Point2<f64>) -> CalibratedPoint {
            CalibratedPoint::default()
        }
    }

    #[test]
    fn slope_rules() {
        assert_eq!(slope_from_deltas(10.0, 20.0), Some(2.0));
        assert_eq!(slope_from_deltas(0.0, -3.0), Some(f64::INFINITY));
        assert_eq!(slope_from_deltas(1e-13, 1.0), None);
        assert_eq!(slope_from_deltas(-4.0, 2.0), Some(-0.5));
    }

    #[test]
    fn calibrated_measurement() {
        let mut m = SlopeMeasurer::new();
        assert!(m.click(Point2::new(0.0, 0.0), &Linear).is_none());
        m.start();
        assert!(m.is_active());
        assert!(m.click(Point2::new(0.0, 0.0), &Linear).is_none());
        assert_eq!(m.phase(), SlopePhase::WaitSecond);
        let r = m.click(Point2::new(10.0, 10.0), &Linear).unwrap();
        assert!(r.calibrated);
        assert_abs_diff_eq!(r.dx, 10.0);
        assert_abs_diff_eq!(r.dy, 20.0);
        assert_abs_diff_eq!(r.slope.unwrap(), 2.0);
        assert_eq!(m.phase(), SlopePhase::Done);
        assert!(!m.is_active());
        assert!(m.click(Point2::new(1.0, 1.0), &Linear).is_none());
        assert_eq!(m.result(), Some(&r));
    }

    #[test]
    fn pixel_fallback_flips_vertical_axis() {
        let mut m = SlopeMeasurer::new();
        m.start();
        m.click(Point2::new(10.0, 100.0), &Uncalibrated);
        let r = m.click(Point2::new(30.0, 60.0), &Uncalibrated).unwrap();
        assert!(!r.calibrated);
        assert_abs_diff_eq!(r.dx, 20.0);
        assert_abs_diff_eq!(r.dy, 40.0);
        assert_abs_diff_eq!(r.slope.unwrap(), 2.0);
    }

    #[test]
    fn vertical_pair_is_infinite() {
        let mut m = SlopeMeasurer::new();
        m.start();
        m.click(Point2::new(5.0, 1.0), &Linear);
        let r = m.click(Point2::new(5.0, 9.0), &Linear).unwrap();
        assert_eq!(r.slope, Some(f64::INFINITY));
    }

    #[test]
    fn vertical_and_unset_slopes_stay_distinct_in_json() {
        let sample = |x: f64, y: f64| SlopeSample {
            pixel: Point2::new(x, y),
            value: CalibratedPoint::default(),
        };
        let vertical = SlopeMeasurement::between(sample(5.0, 9.0), sample(5.0, 1.0));
        let unset = SlopeMeasurement {
            slope: slope_from_deltas(1e-13, 1.0),
            ..vertical
        };

        let v = serde_json::to_value(vertical).unwrap();
        assert_eq!(v["slope"], "inf");
        assert_eq!(v["dx"], 0.0);
        assert!(serde_json::to_value(unset).unwrap()["slope"].is_null());

        let back: SlopeMeasurement = serde_json::from_value(v).unwrap();
        assert_eq!(back.slope, Some(f64::INFINITY));
        let back: SlopeMeasurement =
            serde_json::from_value(serde_json::to_value(unset).unwrap()).unwrap();
        assert_eq!(back.slope, None);

        let mut finite = serde_json::to_value(vertical).unwrap();
        finite["slope"] = serde_json::json!(-0.5);
        let back: SlopeMeasurement = serde_json::from_value(finite.clone()).unwrap();
        assert_eq!(back.slope, Some(-0.5));
        finite["slope"] = serde_json::json!("steep");
        assert!(serde_json::from_value::<SlopeMeasurement>(finite).is_err());
    }

    #[test]
    fn restart_discards_previous_result() {
        let mut m = SlopeMeasurer::new();
        m.start();
        m.click(Point2::new(0.0, 0.0), &Linear);
        m.click(Point2::new(1.0, 1.0), &Linear);
        m.start();
        assert!(m.result().is_none());
        assert!(m.first_sample().is_none());
        assert_eq!(m.phase(), SlopePhase::WaitFirst);
    }
}
