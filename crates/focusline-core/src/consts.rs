/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Number of frames decoded and scored together per batch. Bounds memory
/// (only one batch of pixel buffers is alive at a time) while still giving
/// Rayon something to chew on.
pub const SCORE_BATCH_SIZE: usize = 8;

/// How many frames in a row may fail scoring before the whole run is
/// abandoned. Protects against looping over a systematically broken stream.
pub const MAX_CONSECUTIVE_FRAME_FAILURES: usize = 5;

/// Frame interval assumed when the container carries no usable per-frame
/// timestamps: 30 fps.
pub const DEFAULT_FRAME_INTERVAL_US: i64 = 33_333;

/// SER trailer timestamps are in 100 ns ticks.
pub const TICKS_PER_MICROSECOND: i64 = 10;
