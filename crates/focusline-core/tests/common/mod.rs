#![allow(dead_code)]

/// Build a video container header (178 bytes, LUCAM-RECORDER layout).
///
/// `color_id`: 0=MONO, 8..=11=Bayer variants, 100=RGB, 101=BGR.
/// Append frame pixel data (and optionally a timestamp trailer) after
/// calling this.
pub fn build_header(
    width: u32,
    height: u32,
    bit_depth: u32,
    frame_count: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(178);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // Width
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    // Height
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    // PixelDepth
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    // FrameCount
    buf.extend_from_slice(&(frame_count as i32).to_le_bytes());
    // Observer / Instrument / Telescope (40 bytes each)
    buf.extend_from_slice(&[0u8; 40]);
    buf.extend_from_slice(&[0u8; 40]);
    buf.extend_from_slice(&[0u8; 40]);
    // DateTime / DateTimeUTC
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), 178);
    buf
}

/// Complete mono 8-bit video blob from per-frame pixel data.
pub fn build_mono_video(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_header(width, height, 8, frames.len(), 0);
    for frame in frames {
        assert_eq!(frame.len(), (width * height) as usize);
        buf.extend_from_slice(frame);
    }
    buf
}

/// Append a per-frame timestamp trailer (100 ns ticks, little-endian).
pub fn append_trailer(buf: &mut Vec<u8>, ticks: &[u64]) {
    for tick in ticks {
        buf.extend_from_slice(&tick.to_le_bytes());
    }
}

/// Single-value frame.
pub fn uniform_frame(width: u32, height: u32, value: u8) -> Vec<u8> {
    vec![value; (width * height) as usize]
}

/// Maximal-contrast checkerboard frame.
pub fn checkerboard_frame(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        for col in 0..width {
            data.push(if (row + col) % 2 == 0 { 255 } else { 0 });
        }
    }
    data
}

/// Textured frame whose first pixel carries a marker value, so tests can
/// make an injected scorer fail on specific frames.
pub fn marked_frame(width: u32, height: u32, marker: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        for col in 0..width {
            data.push(((row * 13 + col * 7) % 200) as u8);
        }
    }
    data[0] = marker;
    data
}
