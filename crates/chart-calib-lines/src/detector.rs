//! End-to-end axis detection: edges → Hough lines → clusters → suggestion.

use chart_calib_core::{detect_edges, EdgeParams, RgbaImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::cluster::{cluster_lines, refit_segments, ClusterParams};
use crate::hough::{find_lines, HoughParams};
use crate::suggest::{suggest_axes, AxisSuggestion};
use crate::{DetectedLine, LinesError};

/// Configuration for the whole detection pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisDetectorParams {
    pub edges: EdgeParams,
    pub hough: HoughParams,
    pub cluster: ClusterParams,
    /// Re-derive merged segments from their averaged (theta, rho).
    pub refit_endpoints: bool,
}

impl Default for AxisDetectorParams {
    fn default() -> Self {
        Self {
            edges: EdgeParams::default(),
            hough: HoughParams::default(),
            cluster: ClusterParams::default(),
            refit_endpoints: true,
        }
    }
}

impl AxisDetectorParams {
    pub fn validate(&self) -> Result<(), LinesError> {
        if !self.edges.threshold.is_finite() {
            return Err(LinesError::invalid("edges.threshold", "must be finite"));
        }
        self.hough.validate()?;
        self.cluster.validate()
    }
}

/// Output of one detection run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AxisDetection {
    pub width: usize,
    pub height: usize,
    pub edge_pixels: usize,
    /// Lines straight out of the Hough stage, strongest first.
    pub lines: Vec<DetectedLine>,
    /// Lines after merging near-duplicates.
    pub clustered: Vec<DetectedLine>,
    pub suggestion: AxisSuggestion,
}

/// Automatic axis detector.
#[derive(Clone, Debug, Default)]
pub struct AxisDetector {
    params: AxisDetectorParams,
}

impl AxisDetector {
    pub fn new(params: AxisDetectorParams) -> Result<Self, LinesError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &AxisDetectorParams {
        &self.params
    }

    /// Run the pipeline on an RGBA raster.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn detect(&self, image: &RgbaImageView<'_>) -> AxisDetection {
        let edges = detect_edges(image, &self.params.edges);
        let edge_pixels = edges.count();
        if edge_pixels == 0 {
            log::warn!("no edge pixels above threshold {}", self.params.edges.threshold);
            return AxisDetection {
                width: image.width,
                height: image.height,
                ..Default::default()
            };
        }

        let lines = find_lines(&edges, &self.params.hough);
        let mut clustered = cluster_lines(&lines, &self.params.cluster);
        if self.params.refit_endpoints {
            refit_segments(&mut clustered, image.width, image.height);
        }
        let suggestion = suggest_axes(&clustered);
        if !suggestion.is_complete() {
            log::warn!(
                "axis detection incomplete: {} lines, {} clusters",
                lines.len(),
                clustered.len()
            );
        }

        AxisDetection {
            width: image.width,
            height: image.height,
            edge_pixels,
            lines,
            clustered,
            suggestion,
        }
    }
}
