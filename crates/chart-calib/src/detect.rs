use std::path::Path;

use crate::{core, lines, session};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("failed to read image: {0}")]
    Decode(#[from] ::image::ImageError),

    #[error("invalid RGBA image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Image(#[from] core::ImageError),

    #[error(transparent)]
    Lines(#[from] lines::LinesError),

    #[error(transparent)]
    Session(#[from] session::SessionError),
}

/// Borrow an `image::RgbaImage` as the lightweight `chart-calib-core` view.
pub fn rgba_view(img: &::image::RgbaImage) -> core::RgbaImageView<'_> {
    core::RgbaImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy an `image::RgbaImage` into an owned `chart-calib-core` raster.
pub fn to_core_image(img: &::image::RgbaImage) -> core::RgbaImage {
    core::RgbaImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Decode a PNG/JPEG/... file into RGBA8.
pub fn load_rgba(path: impl AsRef<Path>) -> Result<::image::RgbaImage, DetectError> {
    let path = path.as_ref();
    log::debug!("loading {}", path.display());
    Ok(::image::open(path)?.to_rgba8())
}

/// Build an `image::RgbaImage` from a raw RGBA buffer.
pub fn rgba_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::RgbaImage, DetectError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(DetectError::InvalidDimensions { width, height });
    };
    // validates the length
    core::RgbaImageView::new(w, h, pixels)?;
    ::image::RgbaImage::from_raw(width, height, pixels.to_vec())
        .ok_or(DetectError::InvalidDimensions { width, height })
}

/// Run the axis detector end-to-end: edges -> Hough lines -> clusters ->
/// axis suggestion.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_axes(
    img: &::image::RgbaImage,
    params: lines::AxisDetectorParams,
) -> Result<lines::AxisDetection, DetectError> {
    let detector = lines::AxisDetector::new(params)?;
    Ok(detector.detect(&rgba_view(img)))
}

/// Convenience overload using `AxisDetectorParams::default()`.
pub fn detect_axes_default(img: &::image::RgbaImage) -> lines::AxisDetection {
    lines::AxisDetector::default().detect(&rgba_view(img))
}

pub fn detect_axes_from_rgba_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    params: lines::AxisDetectorParams,
) -> Result<lines::AxisDetection, DetectError> {
    let img = rgba_image_from_slice(width, height, pixels)?;
    detect_axes(&img, params)
}

pub fn detect_axes_in_file(
    path: impl AsRef<Path>,
    params: lines::AxisDetectorParams,
) -> Result<lines::AxisDetection, DetectError> {
    let img = load_rgba(path)?;
    detect_axes(&img, params)
}

/// Open a calibration session on an image file. Calibration starts with
/// manual axis drawing.
pub fn session_from_file(
    path: impl AsRef<Path>,
    params: session::SessionParams,
) -> Result<session::ChartSession, DetectError> {
    let img = load_rgba(path)?;
    let mut session = session::ChartSession::new(params)?;
    session.load_image(to_core_image(&img));
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_buffer_length_is_checked() {
        let err = rgba_image_from_slice(4, 4, &[0; 15]).unwrap_err();
        assert!(matches!(
            err,
            DetectError::Image(core::ImageError::BufferSize { expected: 64, got: 15 })
        ));
        let ok = rgba_image_from_slice(2, 1, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(ok.get_pixel(1, 0).0, [5, 6, 7, 8]);
    }

    #[test]
    fn view_shares_the_buffer() {
        let img = ::image::RgbaImage::from_pixel(3, 2, ::image::Rgba([9, 8, 7, 255]));
        let view = rgba_view(&img);
        assert_eq!((view.width, view.height), (3, 2));
        assert_eq!(view.pixel(2, 1), [9, 8, 7, 255]);
        assert_eq!(to_core_image(&img).view().pixel(0, 0), [9, 8, 7, 255]);
    }

    #[test]
    fn invalid_params_surface_as_errors() {
        let img = ::image::RgbaImage::new(8, 8);
        let params = lines::AxisDetectorParams {
            cluster: lines::ClusterParams {
                rho_tolerance: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(detect_axes(&img, params), Err(DetectError::Lines(_))));
    }
}
