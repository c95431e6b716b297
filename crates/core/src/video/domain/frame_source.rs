use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// A live or recorded stream of frames (camera, video file).
///
/// Implementations handle device and codec details while the pipeline
/// works with the abstract `Frame` type.
pub trait FrameSource: Send {
    /// Acquires the underlying device or file and returns its metadata.
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Blocks until the next frame is available.
    ///
    /// `Ok(None)` means the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the device or file. Safe to call more than once.
    fn close(&mut self);
}
