use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::DetectedLine;

const ANGLE_WEIGHT: f64 = 0.6;
const LENGTH_WEIGHT: f64 = 0.25;
const VOTES_WEIGHT: f64 = 0.15;

/// Best x (horizontal) and y (vertical) axis candidates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisSuggestion {
    pub x_axis: Option<DetectedLine>,
    pub y_axis: Option<DetectedLine>,
}

impl AxisSuggestion {
    pub fn is_complete(&self) -> bool {
        self.x_axis.is_some() && self.y_axis.is_some()
    }
}

struct Normalizer {
    max_len: f64,
    max_votes: f64,
}

impl Normalizer {
    fn new(lines: &[DetectedLine]) -> Self {
        let max_len = lines.iter().map(|l| l.length()).fold(0.0, f64::max);
        let max_votes = lines.iter().map(|l| l.votes.max(1)).max().unwrap_or(1);
        Self {
            max_len: if max_len > 0.0 { max_len } else { 1.0 },
            max_votes: max_votes as f64,
        }
    }

    fn score(&self, line: &DetectedLine, closeness: f64) -> f64 {
        ANGLE_WEIGHT * closeness
            + LENGTH_WEIGHT * line.length() / self.max_len
            + VOTES_WEIGHT * line.votes as f64 / self.max_votes
    }

    fn horizontal(&self, line: &DetectedLine) -> f64 {
        let angle = line.angle_from_horizontal();
        self.score(line, 1.0 - angle / FRAC_PI_2)
    }

    fn vertical(&self, line: &DetectedLine) -> f64 {
        let angle = line.angle_from_horizontal();
        self.score(line, 1.0 - (FRAC_PI_2 - angle).abs() / FRAC_PI_2)
    }
}

/// Index of the highest score; the first one wins ties.
fn best_index(scores: impl Iterator<Item = (usize, f64)>) -> Option<usize> {
    let mut best = None;
    let mut best_score = f64::NEG_INFINITY;
    for (i, s) in scores {
        if s > best_score {
            best_score = s;
            best = Some(i);
        }
    }
    best
}

/// Pick the most axis-like horizontal and vertical lines.
///
/// Scores mix angle closeness (0.6), relative length (0.25) and relative
/// votes (0.15). When one line wins both roles it keeps the x role and the y
/// role goes to the best remaining line, or to nobody if there is none.
pub fn suggest_axes(lines: &[DetectedLine]) -> AxisSuggestion {
    if lines.is_empty() {
        return AxisSuggestion::default();
    }
    let norm = Normalizer::new(lines);

    let best_h = best_index(lines.iter().map(|l| norm.horizontal(l)).enumerate());
    let mut best_v = best_index(lines.iter().map(|l| norm.vertical(l)).enumerate());

    if best_h.is_some() && best_h == best_v {
        best_v = best_index(
            lines
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != best_h)
                .map(|(i, l)| (i, norm.vertical(l))),
        );
    }

    let suggestion = AxisSuggestion {
        x_axis: best_h.map(|i| lines[i]),
        y_axis: best_v.map(|i| lines[i]),
    };
    log::debug!(
        "axis suggestion from {} lines: x={:?} y={:?}",
        lines.len(),
        best_h,
        best_v
    );
    suggestion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Orientation;
    use chart_calib_core::AxisSegment;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64, votes: u32) -> DetectedLine {
        DetectedLine {
            theta: 0.0,
            rho: 0.0,
            votes,
            segment: AxisSegment::from_coords(x1, y1, x2, y2),
            orientation: Orientation::Horizontal,
        }
    }

    #[test]
    fn empty_input_suggests_nothing() {
        let s = suggest_axes(&[]);
        assert!(s.x_axis.is_none() && s.y_axis.is_none());
    }

    #[test]
    fn picks_horizontal_and_vertical() {
        let h = line(0.0, 180.0, 300.0, 182.0, 200);
        let v = line(20.0, 0.0, 21.0, 200.0, 150);
        let diag = line(0.0, 0.0, 200.0, 200.0, 400);
        let s = suggest_axes(&[diag, h, v]);
        assert_eq!(s.x_axis, Some(h));
        assert_eq!(s.y_axis, Some(v));
        assert!(s.is_complete());
    }

    #[test]
    fn tied_line_never_fills_both_roles() {
        let a = line(0.0, 0.0, 100.0, 100.0, 50);
        let b = line(0.0, 100.0, 100.0, 0.0, 50);
        let s = suggest_axes(&[a, b]);
        assert_eq!(s.x_axis, Some(a));
        assert_eq!(s.y_axis, Some(b));
    }

    #[test]
    fn single_line_keeps_x_role_only() {
        let a = line(0.0, 0.0, 100.0, 100.0, 50);
        let s = suggest_axes(&[a]);
        assert_eq!(s.x_axis, Some(a));
        assert!(s.y_axis.is_none());
    }

    #[test]
    fn longer_line_wins_among_equal_angles() {
        let short = line(0.0, 50.0, 120.0, 50.0, 100);
        let long = line(0.0, 150.0, 300.0, 150.0, 100);
        let s = suggest_axes(&[short, long]);
        assert_eq!(s.x_axis, Some(long));
        // vertical role falls back to the remaining line
        assert_eq!(s.y_axis, Some(short));
    }
}
