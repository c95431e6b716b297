/// Properties of an opened frame source.
///
/// Live devices report `fps` when the driver exposes it and never know
/// their frame count, hence `total_frames: None`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: Option<usize>,
    pub codec: String,
    pub source: String,
}
