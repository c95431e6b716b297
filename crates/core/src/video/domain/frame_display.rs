use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// A labeled box to draw over a displayed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub region: Region,
    pub label: String,
}

/// Output surface for the annotated live feed, plus the keyboard input
/// that comes with it.
pub trait FrameDisplay: Send {
    fn show(&mut self, frame: &Frame, overlays: &[Overlay])
        -> Result<(), Box<dyn std::error::Error>>;

    /// Waits up to `timeout_ms` for a key press.
    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<char>, Box<dyn std::error::Error>>;

    /// Tears down the surface. Safe to call more than once.
    fn close(&mut self);
}
