/// Errors for malformed raster inputs.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    #[error("invalid RGBA buffer length (expected {expected} bytes, got {got})")]
    BufferSize { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("selection too small ({width}x{height}), need at least 5x5")]
    SelectionTooSmall { width: f64, height: f64 },

    #[error("crop origin ({x}, {y}) lies outside the {width}x{height} capture")]
    CropOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}
