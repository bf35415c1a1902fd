//! Hough transform restricted to axis-like angles.
//!
//! Only normals within `angle_margin_deg` of 0° and of 90° receive votes, so
//! the detector never reports diagonal lines. Peaks are 1-D local maxima
//! along rho inside each angle row; every peak is turned into a finite
//! segment by clipping its infinite line against the image borders.

use chart_calib_core::{AxisSegment, EdgeMap};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{DetectedLine, LinesError, Orientation};

/// Trig values below this are treated as zero when clipping to the borders.
const BORDER_EPS: f64 = 1e-6;

/// Hough voting and peak selection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// Angular resolution of the accumulator (degrees).
    pub theta_step_deg: f64,
    /// Distance resolution of the accumulator (pixels).
    pub rho_step: f64,
    /// Half-width of each angle band around 0° and 90° (degrees).
    pub angle_margin_deg: f64,
    /// Minimal accumulator votes for a peak, also applied to final lines.
    pub vote_threshold: u32,
    /// Keep at most this many strongest peaks that yield a segment.
    pub max_lines: usize,
    /// Visit every `sample_step`-th pixel in x and y while voting.
    pub sample_step: usize,
    /// Minimal segment length as a fraction of `max(width, height)`.
    pub min_length_frac: f64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            theta_step_deg: 1.0,
            rho_step: 1.0,
            angle_margin_deg: 10.0,
            vote_threshold: 80,
            max_lines: 20,
            sample_step: 1,
            min_length_frac: 0.6,
        }
    }
}

impl HoughParams {
    pub fn validate(&self) -> Result<(), LinesError> {
        if !(self.theta_step_deg.is_finite() && self.theta_step_deg > 0.0) {
            return Err(LinesError::invalid("theta_step_deg", "must be positive"));
        }
        if !(self.rho_step.is_finite() && self.rho_step > 0.0) {
            return Err(LinesError::invalid("rho_step", "must be positive"));
        }
        if !(0.0..45.0).contains(&self.angle_margin_deg) {
            return Err(LinesError::invalid(
                "angle_margin_deg",
                "must be in [0, 45) so the bands stay disjoint",
            ));
        }
        if self.sample_step == 0 {
            return Err(LinesError::invalid("sample_step", "must be at least 1"));
        }
        if !self.min_length_frac.is_finite() || self.min_length_frac < 0.0 {
            return Err(LinesError::invalid("min_length_frac", "must be non-negative"));
        }
        Ok(())
    }

    /// Candidate normal angles (radians): the band around 0° then the band
    /// around 90°, both stepped by `theta_step_deg`. Empty for invalid params.
    pub fn candidate_angles(&self) -> Vec<f64> {
        if self.validate().is_err() {
            return Vec::new();
        }
        let steps = (2.0 * self.angle_margin_deg / self.theta_step_deg + 1e-9).floor() as usize;
        let mut thetas = Vec::with_capacity(2 * (steps + 1));
        for center in [0.0, 90.0] {
            for k in 0..=steps {
                let deg = center - self.angle_margin_deg + k as f64 * self.theta_step_deg;
                thetas.push(deg.to_radians());
            }
        }
        thetas
    }
}

/// Vote grid indexed by (angle, rho bucket).
#[derive(Clone, Debug)]
pub struct HoughAccumulator {
    pub thetas: Vec<f64>,
    /// Rho buckets cover `[-rho_max, rho_max]`.
    pub rho_max: f64,
    pub rho_step: f64,
    pub num_rho: usize,
    /// Row-major, `thetas.len() * num_rho`.
    pub votes: Vec<u32>,
}

impl HoughAccumulator {
    pub fn new(thetas: Vec<f64>, width: usize, height: usize, rho_step: f64) -> Self {
        let rho_max = (width as f64).hypot(height as f64);
        let num_rho = ((2.0 * rho_max) / rho_step).ceil() as usize;
        let votes = vec![0; thetas.len() * num_rho];
        Self {
            thetas,
            rho_max,
            rho_step,
            num_rho,
            votes,
        }
    }

    #[inline]
    pub fn row(&self, theta_index: usize) -> &[u32] {
        &self.votes[theta_index * self.num_rho..(theta_index + 1) * self.num_rho]
    }

    #[inline]
    fn rho_index(&self, rho: f64) -> Option<usize> {
        let ri = ((rho + self.rho_max) / self.rho_step).round();
        if ri >= 0.0 && (ri as usize) < self.num_rho {
            Some(ri as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn rho_at(&self, rho_index: usize) -> f64 {
        rho_index as f64 * self.rho_step - self.rho_max
    }

    /// Cast one vote per candidate angle for every (sampled) edge pixel.
    pub fn accumulate(&mut self, edges: &EdgeMap, sample_step: usize) {
        let trig: Vec<(f64, f64)> = self.thetas.iter().map(|t| (t.cos(), t.sin())).collect();
        let step = sample_step.max(1);
        for y in (0..edges.height).step_by(step) {
            for x in (0..edges.width).step_by(step) {
                if !edges.is_edge(x, y) {
                    continue;
                }
                for (ti, &(c, s)) in trig.iter().enumerate() {
                    let rho = x as f64 * c + y as f64 * s;
                    if let Some(ri) = self.rho_index(rho) {
                        self.votes[ti * self.num_rho + ri] += 1;
                    }
                }
            }
        }
    }
}

/// A local maximum of the accumulator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoughPeak {
    pub theta_index: usize,
    pub rho_index: usize,
    pub theta: f64,
    pub rho: f64,
    pub votes: u32,
}

/// Peaks with at least `vote_threshold` votes that are not lower than either
/// rho neighbour in their angle row, strongest first.
pub fn find_peaks(acc: &HoughAccumulator, vote_threshold: u32) -> Vec<HoughPeak> {
    let mut peaks = Vec::new();
    for (ti, &theta) in acc.thetas.iter().enumerate() {
        let row = acc.row(ti);
        for (ri, &votes) in row.iter().enumerate() {
            if votes < vote_threshold {
                continue;
            }
            let left = if ri > 0 { row[ri - 1] } else { 0 };
            let right = row.get(ri + 1).copied().unwrap_or(0);
            if votes >= left && votes >= right {
                peaks.push(HoughPeak {
                    theta_index: ti,
                    rho_index: ri,
                    theta,
                    rho: acc.rho_at(ri),
                    votes,
                });
            }
        }
    }
    // stable: equal votes keep scan order
    peaks.sort_by(|a, b| b.votes.cmp(&a.votes));
    peaks
}

/// Clip the line `x cos θ + y sin θ = ρ` to `[0, width] × [0, height]`.
///
/// Returns the two mutually farthest border crossings, or `None` when the
/// line touches the image in fewer than two points.
pub fn segment_from_polar(theta: f64, rho: f64, width: f64, height: f64) -> Option<AxisSegment> {
    let (sin_t, cos_t) = theta.sin_cos();
    let mut points: Vec<Point2<f64>> = Vec::with_capacity(4);

    if sin_t.abs() > BORDER_EPS {
        let y0 = rho / sin_t;
        if (0.0..=height).contains(&y0) {
            points.push(Point2::new(0.0, y0));
        }
        let yw = (rho - width * cos_t) / sin_t;
        if (0.0..=height).contains(&yw) {
            points.push(Point2::new(width, yw));
        }
    }
    if cos_t.abs() > BORDER_EPS {
        let x0 = rho / cos_t;
        if (0.0..=width).contains(&x0) {
            points.push(Point2::new(x0, 0.0));
        }
        let xh = (rho - height * sin_t) / cos_t;
        if (0.0..=width).contains(&xh) {
            points.push(Point2::new(xh, height));
        }
    }

    if points.len() < 2 {
        return None;
    }

    let mut best = (0, 1);
    let mut best_d2 = -1.0;
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            let d2 = (points[i] - points[j]).norm_squared();
            if d2 > best_d2 {
                best_d2 = d2;
                best = (i, j);
            }
        }
    }
    Some(AxisSegment::new(points[best.0], points[best.1]))
}

/// Detect long, axis-like straight lines in an edge map.
///
/// An empty result means "no axes detected" and is not an error.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(edges, params), fields(width = edges.width, height = edges.height))
)]
pub fn find_lines(edges: &EdgeMap, params: &HoughParams) -> Vec<DetectedLine> {
    let (w, h) = (edges.width, edges.height);
    if w == 0 || h == 0 {
        return Vec::new();
    }
    if let Err(err) = params.validate() {
        log::warn!("skipping line search: {err}");
        return Vec::new();
    }

    let mut acc = HoughAccumulator::new(params.candidate_angles(), w, h, params.rho_step);
    acc.accumulate(edges, params.sample_step);
    let peaks = find_peaks(&acc, params.vote_threshold);

    let mut lines = Vec::new();
    for peak in &peaks {
        if lines.len() >= params.max_lines {
            break;
        }
        let Some(segment) = segment_from_polar(peak.theta, peak.rho, w as f64, h as f64) else {
            continue;
        };
        lines.push(DetectedLine {
            theta: peak.theta,
            rho: peak.rho,
            votes: peak.votes,
            segment,
            orientation: Orientation::from_normal_angle(peak.theta),
        });
    }

    let min_len = params.min_length_frac * w.max(h) as f64;
    lines.retain(|l| l.length() >= min_len && l.votes >= params.vote_threshold);

    log::debug!(
        "hough: {} peaks, {} lines after length/vote filter (min_len={min_len:.1})",
        peaks.len(),
        lines.len()
    );
    lines
}
