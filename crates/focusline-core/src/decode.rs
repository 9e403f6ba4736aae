use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::asset::VideoAsset;
use crate::consts::{DEFAULT_FRAME_INTERVAL_US, TICKS_PER_MICROSECOND};
use crate::error::{FocusError, Result};

pub const CONTAINER_HEADER_SIZE: usize = 178;
const CONTAINER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// Channel layout of the raw pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Single plane. Covers mono and undemosaiced Bayer sources.
    Mono,
    Rgb,
    Bgr,
}

/// Everything the rasterizer needs to interpret a frame's raw bytes.
#[derive(Clone, Copy, Debug)]
pub struct FrameFormat {
    pub order: ChannelOrder,
    /// Significant bits per sample (1..=16).
    pub bit_depth: u32,
    /// Byte order of 16-bit samples.
    pub little_endian: bool,
}

impl FrameFormat {
    pub fn bytes_per_sample(&self) -> usize {
        if self.bit_depth <= 8 {
            1
        } else {
            2
        }
    }

    pub fn samples_per_pixel(&self) -> usize {
        match self.order {
            ChannelOrder::Mono => 1,
            ChannelOrder::Rgb | ChannelOrder::Bgr => 3,
        }
    }
}

/// Parsed container header (178 bytes, `LUCAM-RECORDER` layout).
#[derive(Clone, Debug)]
pub struct ContainerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
}

impl ContainerHeader {
    pub fn format(&self) -> FrameFormat {
        let order = match self.color_id {
            100 => ChannelOrder::Rgb,
            101 => ChannelOrder::Bgr,
            _ => ChannelOrder::Mono,
        };
        FrameFormat {
            order,
            bit_depth: self.pixel_depth,
            little_endian: self.little_endian,
        }
    }

    /// Total bytes of one frame's pixel data.
    pub fn frame_byte_size(&self) -> Result<usize> {
        let format = self.format();
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(format.bytes_per_sample() * format.samples_per_pixel()))
            .ok_or_else(|| {
                FocusError::UnsupportedFormat(format!(
                    "frame size overflows for {}x{}",
                    self.width, self.height
                ))
            })
    }

    /// Human-readable color mode, for diagnostics.
    pub fn color_label(&self) -> &'static str {
        match self.color_id {
            0 => "mono",
            8 => "Bayer RGGB (read as mono)",
            9 => "Bayer GRBG (read as mono)",
            10 => "Bayer GBRG (read as mono)",
            11 => "Bayer BGGR (read as mono)",
            100 => "RGB",
            101 => "BGR",
            _ => "unknown (read as mono)",
        }
    }
}

/// One decoded frame, borrowing its raw bytes from the asset blob.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub index: usize,
    /// Microseconds since the start of the video. Strictly increasing
    /// across the frames a stream yields.
    pub timestamp_us: i64,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub bytes: &'a [u8],
}

/// Lazy frame decoder over an in-memory video blob.
///
/// Frames come out one at a time in presentation order; memory stays bounded
/// by one frame view (zero-copy) plus fixed overhead. If the declared frame
/// range runs off the end of the blob, the iterator yields the good prefix,
/// then exactly one `TruncatedStream` error, then `None`. Each analysis run
/// opens a fresh stream; there is no seeking.
#[derive(Debug)]
pub struct FrameStream<'a> {
    blob: &'a [u8],
    header: ContainerHeader,
    frame_size: usize,
    /// Per-frame timestamps from the trailer, already relative, in
    /// microseconds. `None` means timestamps are synthesized.
    timestamps: Option<Vec<i64>>,
    next: usize,
    finished: bool,
}

impl<'a> FrameStream<'a> {
    /// Open a decode pass over an asset's blob.
    ///
    /// Fails with `UnsupportedFormat` if the header cannot be parsed at all;
    /// truncation of the frame data itself is reported later, mid-stream.
    pub fn open(asset: &'a VideoAsset) -> Result<Self> {
        Self::from_bytes(asset.bytes())
    }

    pub fn from_bytes(blob: &'a [u8]) -> Result<Self> {
        if blob.len() < CONTAINER_HEADER_SIZE {
            return Err(FocusError::UnsupportedFormat(
                "file too small to hold a video header".into(),
            ));
        }
        if &blob[0..14] != CONTAINER_MAGIC {
            return Err(FocusError::UnsupportedFormat(
                "missing LUCAM-RECORDER signature".into(),
            ));
        }

        let header = parse_header(&blob[..CONTAINER_HEADER_SIZE])?;
        let frame_size = header.frame_byte_size()?;
        let timestamps = read_trailer_timestamps(blob, &header, frame_size);

        debug!(
            width = header.width,
            height = header.height,
            frames = header.frame_count,
            trailer = timestamps.is_some(),
            "opened video container"
        );

        Ok(Self {
            blob,
            header,
            frame_size,
            timestamps,
            next: 0,
            finished: false,
        })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Number of frames the header declares. The stream may yield fewer if
    /// the blob is truncated.
    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    pub fn has_timestamp_trailer(&self) -> bool {
        self.timestamps.is_some()
    }

    /// Timestamp of the last declared frame; an estimate of total duration.
    pub fn duration_us(&self) -> i64 {
        let last = self.frame_count().saturating_sub(1);
        self.timestamp_for(last)
    }

    fn timestamp_for(&self, index: usize) -> i64 {
        match &self.timestamps {
            Some(ts) => ts[index],
            None => index as i64 * DEFAULT_FRAME_INTERVAL_US,
        }
    }
}

impl<'a> Iterator for FrameStream<'a> {
    type Item = Result<FrameView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.next >= self.frame_count() {
            return None;
        }

        let index = self.next;
        let span = index
            .checked_mul(self.frame_size)
            .and_then(|offset| offset.checked_add(CONTAINER_HEADER_SIZE))
            .and_then(|start| start.checked_add(self.frame_size).map(|end| (start, end)));
        let Some((start, end)) = span else {
            self.finished = true;
            return Some(Err(FocusError::TruncatedStream {
                frames_decoded: index,
            }));
        };
        if end > self.blob.len() {
            // Good prefix already delivered; report the cut once.
            self.finished = true;
            return Some(Err(FocusError::TruncatedStream {
                frames_decoded: index,
            }));
        }

        self.next += 1;
        Some(Ok(FrameView {
            index,
            timestamp_us: self.timestamp_for(index),
            width: self.header.width,
            height: self.header.height,
            format: self.header.format(),
            bytes: &self.blob[start..end],
        }))
    }
}

fn parse_header(buf: &[u8]) -> Result<ContainerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let read_err =
        |_| FocusError::UnsupportedFormat("video header ended unexpectedly".to_string());
    let _lu_id = cursor.read_i32::<LittleEndian>().map_err(read_err)?;
    let color_id = cursor.read_i32::<LittleEndian>().map_err(read_err)?;
    let le_flag = cursor.read_i32::<LittleEndian>().map_err(read_err)?;
    let width = cursor.read_i32::<LittleEndian>().map_err(read_err)? as u32;
    let height = cursor.read_i32::<LittleEndian>().map_err(read_err)? as u32;
    let pixel_depth = cursor.read_i32::<LittleEndian>().map_err(read_err)? as u32;
    let frame_count = cursor.read_i32::<LittleEndian>().map_err(read_err)? as u32;

    if width == 0 || height == 0 {
        return Err(FocusError::UnsupportedFormat(format!(
            "invalid frame dimensions {width}x{height}"
        )));
    }
    if pixel_depth == 0 || pixel_depth > 16 {
        return Err(FocusError::UnsupportedFormat(format!(
            "unsupported pixel depth {pixel_depth}"
        )));
    }
    if frame_count == 0 {
        return Err(FocusError::UnsupportedFormat(
            "container declares no frames".into(),
        ));
    }

    // LittleEndian field = 0 nominally means big-endian pixel data, but most
    // writers use 0 for little-endian. Follow Siril's convention.
    let little_endian = le_flag != 1;

    Ok(ContainerHeader {
        color_id,
        little_endian,
        width,
        height,
        pixel_depth,
        frame_count,
    })
}

/// Read the optional per-frame timestamp trailer.
///
/// Returns relative microsecond values only when the trailer is complete and
/// strictly increasing after conversion; anything else falls back to
/// synthesized timestamps so the stream's ordering guarantee never depends
/// on the input.
fn read_trailer_timestamps(
    blob: &[u8],
    header: &ContainerHeader,
    frame_size: usize,
) -> Option<Vec<i64>> {
    let count = header.frame_count as usize;
    let trailer_start = frame_size
        .checked_mul(count)?
        .checked_add(CONTAINER_HEADER_SIZE)?;
    let trailer_end = trailer_start.checked_add(count.checked_mul(8)?)?;
    if trailer_end > blob.len() {
        return None;
    }

    let mut ticks = Vec::with_capacity(count);
    for i in 0..count {
        let offset = trailer_start + i * 8;
        let raw: [u8; 8] = blob[offset..offset + 8].try_into().ok()?;
        ticks.push(u64::from_le_bytes(raw));
    }

    let origin = *ticks.first()?;
    let mut relative = Vec::with_capacity(count);
    for tick in ticks {
        let us = tick.checked_sub(origin)? / TICKS_PER_MICROSECOND as u64;
        let us = i64::try_from(us).ok()?;
        if let Some(&prev) = relative.last() {
            if us <= prev {
                return None;
            }
        }
        relative.push(us);
    }
    Some(relative)
}
