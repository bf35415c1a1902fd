use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::ImageError;

/// Smallest selection (in viewport units) accepted by [`crop_region`].
pub const MIN_SELECTION_SIZE: f64 = 5.0;

/// Borrowed RGBA raster, row-major, 4 bytes per pixel.
#[derive(Clone, Copy, Debug)]
pub struct RgbaImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = w*h*4
}

/// Byte length of a `width x height` RGBA buffer. Empty or overflowing
/// dimensions are invalid.
fn rgba_len(width: usize, height: usize) -> Result<usize, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or(ImageError::InvalidDimensions { width, height })
}

impl<'a> RgbaImageView<'a> {
    /// Wrap a raw buffer, checking that its length matches the dimensions.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        let expected = rgba_len(width, height)?;
        if data.len() != expected {
            return Err(ImageError::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

/// Owned RGBA raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbaImage {
    /// Image of the given size filled with one color.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Result<Self, ImageError> {
        let len = rgba_len(width, height)?;
        let data = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        RgbaImageView::new(width, height, &data)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn view(&self) -> RgbaImageView<'_> {
        RgbaImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = (y * self.width + x) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }
}

/// Rec. 601 luma of an RGB triple.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Selection rectangle in viewport units (CSS pixels for a browser capture).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Cut the selected region out of a full capture.
///
/// `scale` converts viewport units into capture pixels (capture size divided
/// by viewport size, i.e. the device pixel ratio for a screen grab). The
/// scaled rectangle is rounded to whole pixels and clipped to the capture.
pub fn crop_region(
    src: &RgbaImageView<'_>,
    rect: &SelectionRect,
    scale: Vector2<f64>,
) -> Result<RgbaImage, ImageError> {
    if rect.width < MIN_SELECTION_SIZE || rect.height < MIN_SELECTION_SIZE {
        return Err(ImageError::SelectionTooSmall {
            width: rect.width,
            height: rect.height,
        });
    }

    let sx = (rect.left * scale.x).round().max(0.0) as usize;
    let sy = (rect.top * scale.y).round().max(0.0) as usize;
    let sw = (rect.width * scale.x).round() as usize;
    let sh = (rect.height * scale.y).round() as usize;

    let x_end = (sx + sw).min(src.width);
    let y_end = (sy + sh).min(src.height);
    if sx >= x_end || sy >= y_end {
        return Err(ImageError::CropOutOfBounds {
            x: sx,
            y: sy,
            width: src.width,
            height: src.height,
        });
    }

    let out_w = x_end - sx;
    let out_h = y_end - sy;
    let mut data = Vec::with_capacity(out_w * out_h * 4);
    for y in sy..y_end {
        let row = (y * src.width + sx) * 4;
        data.extend_from_slice(&src.data[row..row + out_w * 4]);
    }

    Ok(RgbaImage {
        width: out_w,
        height: out_h,
        data,
    })
}
