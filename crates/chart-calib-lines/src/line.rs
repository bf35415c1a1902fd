use chart_calib_core::{angular_dist_pi, AxisSegment};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Rough orientation of a detected line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Orientation of the line whose normal has angle `theta`.
    ///
    /// A normal close to 90° belongs to a horizontal line, a normal close to
    /// 0°/180° to a vertical one. Ties resolve to vertical.
    pub fn from_normal_angle(theta: f64) -> Self {
        let to_vertical_line = angular_dist_pi(theta, 0.0);
        let to_horizontal_line = angular_dist_pi(theta, FRAC_PI_2);
        if to_horizontal_line < to_vertical_line {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

/// A straight line found in the image, in Hough normal form plus the visible
/// segment clipped to the image borders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedLine {
    /// Angle of the line normal, radians.
    pub theta: f64,
    /// Signed distance from the image origin along the normal, pixels.
    pub rho: f64,
    pub votes: u32,
    pub segment: AxisSegment,
    pub orientation: Orientation,
}

impl DetectedLine {
    #[inline]
    pub fn length(&self) -> f64 {
        self.segment.length()
    }

    /// Segment angle against the image x axis, in [0, π/2].
    pub fn angle_from_horizontal(&self) -> f64 {
        let d = self.segment.p2 - self.segment.p1;
        d.y.abs().atan2(d.x.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_angle_maps_to_line_orientation() {
        assert_eq!(
            Orientation::from_normal_angle(FRAC_PI_2),
            Orientation::Horizontal
        );
        assert_eq!(
            Orientation::from_normal_angle(95f64.to_radians()),
            Orientation::Horizontal
        );
        assert_eq!(Orientation::from_normal_angle(0.0), Orientation::Vertical);
        assert_eq!(
            Orientation::from_normal_angle(-8f64.to_radians()),
            Orientation::Vertical
        );
    }

    #[test]
    fn segment_angle_ignores_direction() {
        let line = DetectedLine {
            theta: 0.0,
            rho: 0.0,
            votes: 1,
            segment: AxisSegment::from_coords(10.0, 10.0, 0.0, 20.0),
            orientation: Orientation::Vertical,
        };
        assert!((line.angle_from_horizontal() - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }
}
