//! Text helpers for readouts and result panels.

use crate::slope::SlopeMeasurement;
use crate::types::{AxisKind, AxisMapping, PerAxis};

/// Render a value for display.
///
/// Non-finite values render as `—`; magnitudes at or above `1e5` or below
/// `1e-3` (but nonzero) use scientific notation with three decimals; anything
/// else is rounded to six decimals.
pub fn format_value(v: f64) -> String {
    if !v.is_finite() {
        return "—".to_string();
    }
    let abs = v.abs();
    if abs >= 1e5 || (abs != 0.0 && abs < 1e-3) {
        return scientific(v);
    }
    let rounded = (v * 1e6).round() / 1e6;
    // avoid "-0"
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}

/// Three-decimal scientific notation with a signed exponent (`1.235e+5`).
fn scientific(v: f64) -> String {
    let text = format!("{v:.3e}");
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

/// Optional value, `—` when missing.
pub fn format_optional(v: Option<f64>) -> String {
    v.map_or_else(|| "—".to_string(), format_value)
}

/// One line per resolved mapping, plus the slope when it is finite.
pub fn mapping_summary(
    mappings: &PerAxis<Option<AxisMapping>>,
    slope: Option<&SlopeMeasurement>,
) -> String {
    let mut parts = Vec::new();
    for axis in AxisKind::BOTH {
        if let Some(m) = mappings[axis] {
            parts.push(format!(
                "{} mapping: {} = {} * t + {}",
                axis.to_string().to_uppercase(),
                axis,
                m.a,
                m.b
            ));
        }
    }
    if let Some(m) = slope {
        if let Some(s) = m.slope.filter(|s| s.is_finite()) {
            parts.push(format!(
                "Slope: {} (Δy={}, Δx={})",
                format_value(s),
                format_value(m.dy),
                format_value(m.dx)
            ));
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slope::SlopeSample;
    use crate::types::CalibratedPoint;
    use nalgebra::Point2;

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(f64::NAN), "—");
        assert_eq!(format_value(f64::NEG_INFINITY), "—");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(60.0), "60");
        assert_eq!(format_value(1.23456789), "1.234568");
        assert_eq!(format_value(-0.5), "-0.5");
        assert_eq!(format_value(123456.0), "1.235e+5");
        assert_eq!(format_value(-2.5e12), "-2.500e+12");
        assert_eq!(format_value(0.0001234), "1.234e-4");
        assert_eq!(format_optional(None), "—");
    }

    #[test]
    fn summary_lists_resolved_mappings_and_finite_slope() {
        let mappings = PerAxis {
            x: Some(AxisMapping { a: 1.0, b: 10.0 }),
            y: None,
        };
        assert_eq!(mapping_summary(&mappings, None), "X mapping: x = 1 * t + 10");

        let sample = SlopeSample {
            pixel: Point2::origin(),
            value: CalibratedPoint::default(),
        };
        let mut m = SlopeMeasurement {
            points: [sample, sample],
            dx: 10.0,
            dy: 20.0,
            slope: Some(2.0),
            calibrated: true,
        };
        assert_eq!(
            mapping_summary(&mappings, Some(&m)),
            "X mapping: x = 1 * t + 10\nSlope: 2 (Δy=20, Δx=10)"
        );
        m.slope = Some(f64::INFINITY);
        assert_eq!(mapping_summary(&PerAxis::default(), Some(&m)), "");
    }
}
