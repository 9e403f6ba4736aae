use ndarray::Array2;

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};
use crate::error::{FocusError, Result};
use crate::frame::PixelBuffer;

/// Numeric backend that turns a rasterized frame into a focus score.
///
/// Implementations must be stateless with respect to calls: scoring is
/// reentrant and concurrent calls on independent buffers are safe.
pub trait SharpnessScorer: Send + Sync {
    /// Score a frame. Higher means sharper; results are always finite and
    /// non-negative. Any internal numeric fault is converted to
    /// `ProcessingFailed` here, never propagated raw.
    fn score(&self, buffer: &PixelBuffer) -> Result<f64>;
}

/// The stock scorer: variance of the Laplacian-filtered grayscale image.
#[derive(Clone, Copy, Debug, Default)]
pub struct LaplacianScorer;

impl SharpnessScorer for LaplacianScorer {
    fn score(&self, buffer: &PixelBuffer) -> Result<f64> {
        let gray = luma_plane(buffer)?;
        Ok(laplacian_variance(&gray))
    }
}

/// Convert an RGBA buffer to a single-channel grayscale plane in [0.0, 1.0]
/// using BT.601 luma weighting.
///
/// A buffer whose data length disagrees with its dimensions is a
/// `ProcessingFailed` fault at this boundary.
pub fn luma_plane(buffer: &PixelBuffer) -> Result<Array2<f32>> {
    if buffer.data.len() != buffer.expected_len() {
        return Err(FocusError::ProcessingFailed {
            detail: format!(
                "pixel buffer is {} bytes but {}x{} RGBA needs {}",
                buffer.data.len(),
                buffer.width,
                buffer.height,
                buffer.expected_len()
            ),
        });
    }

    let mut gray = Array2::<f32>::zeros((buffer.height, buffer.width));
    for row in 0..buffer.height {
        for col in 0..buffer.width {
            let idx = (row * buffer.width + col) * 4;
            let r = buffer.data[idx] as f32;
            let g = buffer.data[idx + 1] as f32;
            let b = buffer.data[idx + 2] as f32;
            gray[[row, col]] = (LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b) / 255.0;
        }
    }
    Ok(gray)
}

/// Variance of the response to the 3x3 Laplacian kernel:
///   0  1  0
///   1 -4  1
///   0  1  0
/// Accumulation is in f64. Population variance over the interior (the
/// one-pixel border has no full neighborhood). Images too small to have an
/// interior score 0.0, as do fully uniform images; a non-finite result from
/// a degenerate input is mapped to 0.0 rather than propagated.
pub fn laplacian_variance(data: &Array2<f32>) -> f64 {
    let (h, w) = data.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let count = ((h - 2) * (w - 2)) as f64;

    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let lap = -4.0 * data[[row, col]] as f64
                + data[[row - 1, col]] as f64
                + data[[row + 1, col]] as f64
                + data[[row, col - 1]] as f64
                + data[[row, col + 1]] as f64;
            sum += lap;
            sum_sq += lap * lap;
        }
    }

    let mean = sum / count;
    let variance = sum_sq / count - mean * mean;
    if variance.is_finite() {
        // sum_sq/count - mean^2 can round a hair below zero on near-uniform
        // input; the score contract is >= 0.
        variance.max(0.0)
    } else {
        0.0
    }
}
