use crate::decode::{ChannelOrder, FrameView};
use crate::error::{FocusError, Result};
use crate::frame::PixelBuffer;

/// Draw a decoded frame into a fresh RGBA8 buffer.
///
/// The target is allocated at exactly the source frame's dimensions; nothing
/// from any earlier frame is reused, so a mid-stream resolution change can
/// never leak stale pixels. Allocation goes through `try_reserve_exact` and
/// surfaces failure as `ResourceExhausted` instead of aborting the process.
pub fn rasterize(frame: &FrameView<'_>) -> Result<PixelBuffer> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let pixels = width * height;

    let mut data = Vec::new();
    data.try_reserve_exact(pixels * 4)
        .map_err(|_| FocusError::ResourceExhausted)?;

    let bytes_per_sample = frame.format.bytes_per_sample();
    let samples_per_pixel = frame.format.samples_per_pixel();
    let max_val = ((1u32 << frame.format.bit_depth) - 1) as f32;

    let sample_at = |sample_index: usize| -> u8 {
        let offset = sample_index * bytes_per_sample;
        let raw = if bytes_per_sample == 1 {
            frame.bytes[offset] as f32
        } else {
            let pair = [frame.bytes[offset], frame.bytes[offset + 1]];
            if frame.format.little_endian {
                u16::from_le_bytes(pair) as f32
            } else {
                u16::from_be_bytes(pair) as f32
            }
        };
        (raw / max_val * 255.0).round() as u8
    };

    match frame.format.order {
        ChannelOrder::Mono => {
            for px in 0..pixels {
                let v = sample_at(px);
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        ChannelOrder::Rgb => {
            for px in 0..pixels {
                let base = px * samples_per_pixel;
                data.extend_from_slice(&[sample_at(base), sample_at(base + 1), sample_at(base + 2), 255]);
            }
        }
        ChannelOrder::Bgr => {
            for px in 0..pixels {
                let base = px * samples_per_pixel;
                data.extend_from_slice(&[sample_at(base + 2), sample_at(base + 1), sample_at(base), 255]);
            }
        }
    }

    Ok(PixelBuffer {
        data,
        width,
        height,
    })
}
