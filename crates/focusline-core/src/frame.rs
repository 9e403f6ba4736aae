use serde::Serialize;

use crate::timecode::format_timestamp;

/// One rasterized video frame: tightly packed RGBA, 8 bits per channel,
/// row-major. Dimensions always come from the source frame, never from a
/// previously rasterized buffer.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl PixelBuffer {
    /// Expected byte length for the stated dimensions.
    pub fn expected_len(&self) -> usize {
        self.width * self.height * 4
    }
}

/// Sharpness of a single frame at a single point in time.
///
/// `score` is the Laplacian variance of the frame's grayscale image; higher
/// means more in-focus. Always finite and non-negative.
#[derive(Clone, Debug, Serialize)]
pub struct SharpnessRecord {
    pub timestamp_us: i64,
    pub timestamp_label: String,
    pub score: f64,
}

impl SharpnessRecord {
    pub fn new(timestamp_us: i64, score: f64) -> Self {
        Self {
            timestamp_us,
            timestamp_label: format_timestamp(timestamp_us),
            score,
        }
    }
}
