//! Angle helpers on the circle with period π.

use std::f64::consts::{FRAC_PI_2, PI};

/// Wrap an angle to [0, π).
pub fn wrap_angle_pi(theta: f64) -> f64 {
    let mut t = theta % PI;
    if t < 0.0 {
        t += PI;
    }
    t
}

/// Smallest angular distance on the circle with period π (result in [0, π/2]).
pub fn angular_dist_pi(a: f64, b: f64) -> f64 {
    let mut d = a - b;
    // wrap to [-π/2, π/2]
    while d > FRAC_PI_2 {
        d -= PI;
    }
    while d < -FRAC_PI_2 {
        d += PI;
    }
    d.abs()
}
