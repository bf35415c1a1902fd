//! Collapse near-duplicate lines.
//!
//! First-fit clustering in input order: each line joins the first cluster
//! whose (theta, rho) is within tolerance, otherwise it seeds a new one.
//! The result depends on input order and is not a global optimum.

use serde::{Deserialize, Serialize};

use crate::hough::segment_from_polar;
use crate::{DetectedLine, LinesError, Orientation};

/// Merge tolerances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Maximal rho difference (pixels, exclusive).
    pub rho_tolerance: f64,
    /// Maximal theta difference (degrees, exclusive).
    pub angle_tolerance_deg: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            rho_tolerance: 5.0,
            angle_tolerance_deg: 3.0,
        }
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<(), LinesError> {
        if !(self.rho_tolerance.is_finite() && self.rho_tolerance >= 0.0) {
            return Err(LinesError::invalid("rho_tolerance", "must be non-negative"));
        }
        if !(self.angle_tolerance_deg.is_finite() && self.angle_tolerance_deg >= 0.0) {
            return Err(LinesError::invalid(
                "angle_tolerance_deg",
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Merge near-duplicate lines.
///
/// A merged line takes the `votes * length` weighted mean of theta and rho
/// and the sum of votes. Its segment stays the one of the cluster's first
/// line; use [`refit_segments`] to re-derive it from the merged parameters.
/// Inputs are not modified.
pub fn cluster_lines(lines: &[DetectedLine], params: &ClusterParams) -> Vec<DetectedLine> {
    let angle_tol = params.angle_tolerance_deg.to_radians();
    let mut merged: Vec<DetectedLine> = Vec::with_capacity(lines.len());

    for line in lines {
        let target = merged.iter_mut().find(|c| {
            (line.theta - c.theta).abs() < angle_tol && (line.rho - c.rho).abs() < params.rho_tolerance
        });

        match target {
            Some(cluster) => {
                let (mut w1, mut w2) = (
                    cluster.votes as f64 * cluster.length(),
                    line.votes as f64 * line.length(),
                );
                if w1 + w2 <= 0.0 {
                    w1 = 1.0;
                    w2 = 1.0;
                }
                let w_sum = w1 + w2;
                cluster.theta = (cluster.theta * w1 + line.theta * w2) / w_sum;
                cluster.rho = (cluster.rho * w1 + line.rho * w2) / w_sum;
                cluster.votes += line.votes;
                cluster.orientation = Orientation::from_normal_angle(cluster.theta);
            }
            None => merged.push(*line),
        }
    }

    log::debug!("clustered {} lines into {}", lines.len(), merged.len());
    merged
}

/// Recompute each segment by clipping the line's (theta, rho) to the image.
///
/// Lines whose normal form no longer crosses the image keep their segment.
pub fn refit_segments(lines: &mut [DetectedLine], width: usize, height: usize) {
    for line in lines {
        if let Some(seg) = segment_from_polar(line.theta, line.rho, width as f64, height as f64) {
            line.segment = seg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chart_calib_core::AxisSegment;
    use std::f64::consts::FRAC_PI_2;

    fn horizontal(rho: f64, theta_deg: f64, votes: u32, len: f64) -> DetectedLine {
        DetectedLine {
            theta: theta_deg.to_radians(),
            rho,
            votes,
            segment: AxisSegment::from_coords(0.0, rho, len, rho),
            orientation: Orientation::Horizontal,
        }
    }

    #[test]
    fn merges_close_lines_with_weighted_mean() {
        let lines = [
            horizontal(50.0, 90.0, 100, 200.0),
            horizontal(52.0, 91.0, 300, 200.0),
        ];
        let merged = cluster_lines(&lines, &ClusterParams::default());
        assert_eq!(merged.len(), 1);
        let m = merged[0];
        assert_eq!(m.votes, 400);
        assert_abs_diff_eq!(m.rho, 51.5, epsilon = 1e-9);
        assert_abs_diff_eq!(m.theta.to_degrees(), 90.75, epsilon = 1e-9);
        // segment of the seed line is kept
        assert_eq!(m.segment, lines[0].segment);
        // inputs untouched
        assert_eq!(lines[0].votes, 100);
    }

    #[test]
    fn keeps_distinct_lines_apart() {
        let lines = [
            horizontal(50.0, 90.0, 100, 200.0),
            horizontal(56.0, 90.0, 100, 200.0),
            horizontal(50.0, 94.0, 100, 200.0),
        ];
        let merged = cluster_lines(&lines, &ClusterParams::default());
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn first_fit_follows_input_order() {
        // 3 joins the cluster seeded by 0 even though it is closer to 1's rho.
        let lines = [
            horizontal(10.0, 90.0, 100, 100.0),
            horizontal(16.0, 90.0, 100, 100.0),
            horizontal(30.0, 90.0, 100, 100.0),
            horizontal(14.5, 90.0, 100, 100.0),
        ];
        let merged = cluster_lines(&lines, &ClusterParams::default());
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].votes, 200);
        assert_abs_diff_eq!(merged[0].rho, 12.25, epsilon = 1e-9);
        assert_eq!(merged[1].votes, 100);
    }

    #[test]
    fn refit_clips_merged_line_to_image() {
        let mut lines = vec![horizontal(40.0, 90.0, 10, 50.0)];
        lines[0].theta = FRAC_PI_2;
        refit_segments(&mut lines, 120, 80);
        assert_abs_diff_eq!(lines[0].length(), 120.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lines[0].segment.p1.y, 40.0, epsilon = 1e-9);
    }
}
