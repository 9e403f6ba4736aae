use thiserror::Error;

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("unsupported video format: {0}")]
    UnsupportedFormat(String),

    #[error("video stream ended early after {frames_decoded} frames, the file may be cut off or partially corrupted")]
    TruncatedStream { frames_decoded: usize },

    #[error("video processing failed, try trimming, converting, or resizing your video")]
    ProcessingFailed {
        /// Internal detail, kept out of the user-facing message.
        detail: String,
    },

    #[error("out of memory while preparing a frame buffer, try resizing your video")]
    ResourceExhausted,

    #[error("an analysis run is already in progress")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, FocusError>;
