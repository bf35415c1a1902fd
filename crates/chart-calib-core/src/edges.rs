//! Sobel edge map.
//!
//! Luminance is taken from RGB with Rec. 601 weights, convolved with the 3×3
//! Sobel pair and thresholded on gradient magnitude. The outermost ring of
//! pixels has no full neighbourhood and is always reported as non-edge.

use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::image::{luminance, RgbaImageView};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Edge detector settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    /// A pixel is an edge iff its gradient magnitude is strictly above this.
    pub threshold: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self { threshold: 80.0 }
    }
}

/// Binary edge map, one byte per pixel (1 = edge).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl EdgeMap {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Per-pixel luminance plane of an RGBA view.
pub fn luminance_plane(src: &RgbaImageView<'_>) -> Vec<f32> {
    src.data
        .chunks_exact(4)
        .map(|px| luminance(px[0], px[1], px[2]))
        .collect()
}

/// Compute the binary edge map of `src`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(src, params), fields(width = src.width, height = src.height))
)]
pub fn detect_edges(src: &RgbaImageView<'_>, params: &EdgeParams) -> EdgeMap {
    let w = src.width;
    let h = src.height;
    let mut edges = EdgeMap::empty(w, h);
    if w < 3 || h < 3 {
        return edges;
    }

    let gray = luminance_plane(src);
    let threshold = params.threshold;

    for y in 1..h - 1 {
        let rows = [
            &gray[(y - 1) * w..y * w],
            &gray[y * w..(y + 1) * w],
            &gray[(y + 1) * w..(y + 2) * w],
        ];
        for x in 1..w - 1 {
            let mut gx = 0.0f32;
            let mut gy = 0.0f32;
            for (ky, row) in rows.iter().enumerate() {
                let kx_row = &SOBEL_KERNEL_X[ky];
                let ky_row = &SOBEL_KERNEL_Y[ky];
                gx += row[x - 1] * kx_row[0] + row[x] * kx_row[1] + row[x + 1] * kx_row[2];
                gy += row[x - 1] * ky_row[0] + row[x] * ky_row[1] + row[x + 1] * ky_row[2];
            }
            if (gx * gx + gy * gy).sqrt() > threshold {
                edges.data[y * w + x] = 1;
            }
        }
    }

    log::debug!("edge map {w}x{h}: {} edge pixels", edges.count());
    edges
}
