//! Axis geometry: segments, 1-D bases along an axis, projection onto them.
//!
//! A basis is an origin plus a unit direction; projecting a pixel onto it
//! yields the signed offset `t` (in pixels) that calibration maps to data
//! values.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Determinant magnitude below which two lines are treated as parallel.
pub const PARALLEL_EPS: f64 = 1e-6;

/// Direction used when both axis endpoints coincide.
#[inline]
pub fn fallback_direction() -> Vector2<f64> {
    Vector2::new(1.0, 0.0)
}

/// A segment between two pixel positions, drawn by hand or suggested.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisSegment {
    pub p1: Point2<f64>,
    pub p2: Point2<f64>,
}

impl AxisSegment {
    pub fn new(p1: Point2<f64>, p2: Point2<f64>) -> Self {
        Self { p1, p2 }
    }

    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point2::new(x1, y1), Point2::new(x2, y2))
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.p2 - self.p1).norm()
    }

    /// Perpendicular distance from `p` to the infinite line through the segment.
    pub fn distance_to(&self, p: Point2<f64>) -> f64 {
        let d = self.p2 - self.p1;
        let num = (d.y * p.x - d.x * p.y + self.p2.x * self.p1.y - self.p2.y * self.p1.x).abs();
        let den = d.norm();
        if den > 0.0 {
            num / den
        } else {
            num
        }
    }

    /// Intersection of the two infinite lines, `None` when (nearly) parallel.
    pub fn intersect(&self, other: &AxisSegment) -> Option<Point2<f64>> {
        let (x1, y1, x2, y2) = (self.p1.x, self.p1.y, self.p2.x, self.p2.y);
        let (x3, y3, x4, y4) = (other.p1.x, other.p1.y, other.p2.x, other.p2.y);

        let det = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
        if det.abs() < PARALLEL_EPS {
            return None;
        }
        let a = x1 * y2 - y1 * x2;
        let b = x3 * y4 - y3 * x4;
        Some(Point2::new(
            (a * (x3 - x4) - (x1 - x2) * b) / det,
            (a * (y3 - y4) - (y1 - y2) * b) / det,
        ))
    }
}

/// 1-D coordinate system along an axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisBasis {
    pub origin: Point2<f64>,
    /// Unit direction from the segment's first to second endpoint.
    pub dir: Vector2<f64>,
    /// Segment length in pixels, never below 1.
    pub length: f64,
}

/// Result of projecting a pixel onto an [`AxisBasis`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Signed offset along the basis direction, measured from the origin.
    pub t: f64,
    /// Foot of the perpendicular, `origin + t * dir`.
    pub point: Point2<f64>,
}

impl AxisBasis {
    /// Build a basis along `segment`, anchored at `origin` or at `segment.p1`.
    pub fn from_segment(segment: &AxisSegment, origin: Option<Point2<f64>>) -> Self {
        let d = segment.p2 - segment.p1;
        let len = d.norm();
        let dir = if len > 0.0 { d / len } else { fallback_direction() };
        Self {
            origin: origin.unwrap_or(segment.p1),
            dir,
            length: len.max(1.0),
        }
    }

    #[inline]
    pub fn project(&self, p: Point2<f64>) -> Projection {
        let t = (p - self.origin).dot(&self.dir);
        Projection {
            t,
            point: self.point_at(t),
        }
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> Point2<f64> {
        self.origin + self.dir * t
    }
}

/// Shared origin for an x/y axis pair: their intersection, or the first
/// endpoint of the x axis when the two are parallel.
pub fn axes_origin(x_axis: &AxisSegment, y_axis: &AxisSegment) -> Point2<f64> {
    x_axis.intersect(y_axis).unwrap_or(x_axis.p1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn projection_is_idempotent() {
        let seg = AxisSegment::from_coords(10.0, 200.0, 310.0, 180.0);
        let basis = AxisBasis::from_segment(&seg, Some(Point2::new(12.0, 199.0)));
        for p in [
            Point2::new(50.0, 20.0),
            Point2::new(-30.0, 400.0),
            Point2::new(305.5, 181.25),
        ] {
            let first = basis.project(p);
            let again = basis.project(first.point);
            assert_abs_diff_eq!(again.t, first.t, epsilon = 1e-9);
            assert_abs_diff_eq!(again.point.x, first.point.x, epsilon = 1e-9);
            assert_abs_diff_eq!(again.point.y, first.point.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn basis_has_unit_direction_and_default_origin() {
        let seg = AxisSegment::from_coords(0.0, 0.0, 30.0, 40.0);
        let basis = AxisBasis::from_segment(&seg, None);
        assert_abs_diff_eq!(basis.dir.norm(), 1.0, epsilon = 1e-12);
        assert_eq!(basis.origin, seg.p1);
        assert_abs_diff_eq!(basis.length, 50.0);
        assert_abs_diff_eq!(basis.project(Point2::new(30.0, 40.0)).t, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_segment_uses_fallback_direction() {
        let seg = AxisSegment::from_coords(5.0, 5.0, 5.0, 5.0);
        let basis = AxisBasis::from_segment(&seg, None);
        assert_eq!(basis.dir, fallback_direction());
        assert_eq!(basis.length, 1.0);
        let proj = basis.project(Point2::new(8.0, 100.0));
        assert_abs_diff_eq!(proj.t, 3.0);
    }

    #[test]
    fn intersects_perpendicular_axes() {
        let x_axis = AxisSegment::from_coords(0.0, 100.0, 200.0, 100.0);
        let y_axis = AxisSegment::from_coords(20.0, 0.0, 20.0, 150.0);
        let p = x_axis.intersect(&y_axis).unwrap();
        assert_abs_diff_eq!(p.x, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 100.0, epsilon = 1e-9);
        assert_eq!(axes_origin(&x_axis, &y_axis), p);
    }

    #[test]
    fn parallel_axes_fall_back_to_first_endpoint() {
        let x_axis = AxisSegment::from_coords(3.0, 10.0, 200.0, 10.0);
        let other = AxisSegment::from_coords(0.0, 50.0, 100.0, 50.0);
        assert!(x_axis.intersect(&other).is_none());
        assert_eq!(axes_origin(&x_axis, &other), Point2::new(3.0, 10.0));
    }

    #[test]
    fn point_line_distance() {
        let seg = AxisSegment::from_coords(0.0, 0.0, 10.0, 0.0);
        assert_abs_diff_eq!(seg.distance_to(Point2::new(4.0, -7.0)), 7.0);
        let y_axis = AxisSegment::from_coords(2.0, 0.0, 2.0, 10.0);
        assert_abs_diff_eq!(y_axis.distance_to(Point2::new(5.0, 3.0)), 3.0);
    }
}
