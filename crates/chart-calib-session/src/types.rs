use std::fmt;
use std::ops::{Index, IndexMut};

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Which chart axis a marker or mapping belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    X,
    Y,
}

impl AxisKind {
    pub const BOTH: [AxisKind; 2] = [AxisKind::X, AxisKind::Y];

    pub fn other(self) -> Self {
        match self {
            AxisKind::X => AxisKind::Y,
            AxisKind::Y => AxisKind::X,
        }
    }

    /// Question shown to the user when a tick on this axis needs a value.
    pub fn prompt(self) -> &'static str {
        match self {
            AxisKind::X => "What is x at this point?",
            AxisKind::Y => "What is y at this point?",
        }
    }
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisKind::X => "x",
            AxisKind::Y => "y",
        })
    }
}

/// One value per axis, indexable by [`AxisKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerAxis<T> {
    pub x: T,
    pub y: T,
}

impl<T> Index<AxisKind> for PerAxis<T> {
    type Output = T;

    fn index(&self, axis: AxisKind) -> &T {
        match axis {
            AxisKind::X => &self.x,
            AxisKind::Y => &self.y,
        }
    }
}

impl<T> IndexMut<AxisKind> for PerAxis<T> {
    fn index_mut(&mut self, axis: AxisKind) -> &mut T {
        match axis {
            AxisKind::X => &mut self.x,
            AxisKind::Y => &mut self.y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A tick point confirmed on one axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub axis: AxisKind,
    /// Where the user clicked.
    pub click: Point2<f64>,
    /// The click projected onto the axis.
    pub projected: Point2<f64>,
    /// Signed offset along the axis basis, pixels.
    pub t: f64,
    /// Declared data value; `None` until the user provides one.
    pub value: Option<f64>,
}

/// Affine pixel-offset to data-value map, `value = a * t + b`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisMapping {
    pub a: f64,
    pub b: f64,
}

impl AxisMapping {
    #[inline]
    pub fn eval(&self, t: f64) -> f64 {
        self.a * t + self.b
    }
}

/// Calibrated coordinates of a pixel; an axis without a mapping is `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibratedPoint {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl CalibratedPoint {
    /// Both coordinates, when both axes are calibrated.
    pub fn both(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }
}

/// Anything that can turn a pixel into calibrated chart values.
pub trait ValueMapper {
    fn pixel_to_value(&self, p: Point2<f64>) -> CalibratedPoint;
}
