use std::sync::{Arc, Mutex};

/// An immutable video blob plus its declared media type.
///
/// The bytes live behind an `Arc`, so cloning an asset (e.g. to re-run an
/// analysis after a partial failure) shares the blob without copying. The
/// core never mutates an asset.
#[derive(Clone, Debug)]
pub struct VideoAsset {
    bytes: Arc<[u8]>,
    media_type: String,
}

impl VideoAsset {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::from(bytes),
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Process-wide holder for the "current" uploaded asset.
///
/// Starts empty, is set once per upload, is read when an analysis begins,
/// and is cleared or replaced on the next upload. The holder is an explicit
/// dependency of whoever starts analyses, not a hidden global; callers must
/// not swap the asset while a run against it is active.
#[derive(Debug, Default)]
pub struct AssetSlot {
    current: Mutex<Option<VideoAsset>>,
}

impl AssetSlot {
    /// New, empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held asset.
    pub fn set(&self, asset: VideoAsset) {
        *self.current.lock().expect("asset slot poisoned") = Some(asset);
    }

    /// Drop the held asset, if any.
    pub fn clear(&self) {
        *self.current.lock().expect("asset slot poisoned") = None;
    }

    /// Cheap clone of the held asset (the blob itself is shared).
    pub fn current(&self) -> Option<VideoAsset> {
        self.current.lock().expect("asset slot poisoned").clone()
    }
}
