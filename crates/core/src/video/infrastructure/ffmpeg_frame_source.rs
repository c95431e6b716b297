use std::path::PathBuf;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

#[cfg(target_os = "linux")]
const CAMERA_INPUT_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const CAMERA_INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const CAMERA_INPUT_FORMAT: &str = "vfwcap";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CAMERA_INPUT_FORMAT: &str = "v4l2";

/// An ffmpeg input device: demuxer name, device URL and demuxer options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraDevice {
    pub format: String,
    pub url: String,
    pub options: Vec<(String, String)>,
}

impl CameraDevice {
    /// The platform's capture device number `index`.
    pub fn from_index(index: u32) -> Self {
        let url = if CAMERA_INPUT_FORMAT == "v4l2" {
            format!("/dev/video{index}")
        } else {
            index.to_string()
        };
        Self {
            format: CAMERA_INPUT_FORMAT.to_string(),
            url,
            options: Vec::new(),
        }
    }

    /// Interpret a user-supplied device string.
    ///
    /// A bare number selects the device by index, `video=<name>` selects a
    /// DirectShow device by name, anything else is passed to the platform
    /// capture demuxer as-is (e.g. `/dev/video2`).
    pub fn parse(spec: &str) -> Self {
        if let Ok(index) = spec.parse::<u32>() {
            return Self::from_index(index);
        }
        let format = if spec.starts_with("video=") {
            "dshow"
        } else {
            CAMERA_INPUT_FORMAT
        };
        Self {
            format: format.to_string(),
            url: spec.to_string(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Camera(CameraDevice),
    File(PathBuf),
}

/// Decodes frames from a capture device or a video file via ffmpeg-next
/// (libavdevice + libavformat + libavcodec).
///
/// Converts each decoded frame to RGB24 and wraps it in a [`Frame`]. The
/// device is released on [`FrameSource::close`] or when dropped.
pub struct FfmpegFrameSource {
    kind: SourceKind,
    state: Option<DecodeState>,
    frame_index: usize,
}

struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            state: None,
            frame_index: 0,
        }
    }

    pub fn camera(device: CameraDevice) -> Self {
        Self::new(SourceKind::Camera(device))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(SourceKind::File(path.into()))
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    fn describe(&self) -> String {
        match &self.kind {
            SourceKind::Camera(device) => format!("{}:{}", device.format, device.url),
            SourceKind::File(path) => path.display().to_string(),
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = match &self.kind {
            SourceKind::File(path) => ffmpeg_next::format::input(path)?,
            SourceKind::Camera(device) => open_device(device)?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("No video stream found in {}", self.describe()))?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let scaler = rgb_scaler(&decoder)?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let total_frames = match (&self.kind, stream.frames()) {
            (SourceKind::File(_), n) if n > 0 => Some(n as usize),
            _ => None,
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: self.describe(),
        };

        self.state = Some(DecodeState {
            ictx,
            decoder,
            scaler,
            stream_index,
            flushing: false,
            done: false,
        });
        self.frame_index = 0;
        log::info!(
            "Opened {} ({}x{} @ {:.1} fps)",
            metadata.source,
            metadata.width,
            metadata.height,
            metadata.fps
        );

        Ok(metadata)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(state) = self.state.as_mut() else {
            return Err("FfmpegFrameSource: not opened".into());
        };
        if state.done {
            return Ok(None);
        }

        loop {
            if let Some(frame) = state.try_receive(self.frame_index)? {
                self.frame_index += 1;
                return Ok(Some(frame));
            }

            if state.flushing {
                state.done = true;
                return Ok(None);
            }

            let Some(packet) = read_packet(&mut state.ictx)? else {
                let _ = state.decoder.send_eof();
                state.flushing = true;
                continue;
            };

            if packet.stream() != state.stream_index {
                continue;
            }

            if let Err(e) = state.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
            }
        }
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Released {}", self.describe());
        }
    }
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl DecodeState {
    fn try_receive(
        &mut self,
        index: usize,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;
        let (width, height) = (rgb_frame.width(), rgb_frame.height());
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Some(Frame::new(pixels, width, height, 3, index)))
    }
}

fn open_device(
    device: &CameraDevice,
) -> Result<ffmpeg_next::format::context::Input, Box<dyn std::error::Error>> {
    ffmpeg_next::device::register_all();

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == device.format)
        .ok_or_else(|| format!("ffmpeg capture format '{}' is not available", device.format))?;

    let mut options = ffmpeg_next::Dictionary::new();
    for (key, value) in &device.options {
        options.set(key, value);
    }

    match ffmpeg_next::format::open_with(&device.url, &format, options)? {
        ffmpeg_next::format::context::Context::Input(ictx) => Ok(ictx),
        ffmpeg_next::format::context::Context::Output(_) => {
            Err(format!("{} opened as an output device", device.url).into())
        }
    }
}

/// Outcome of a single demuxer read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PacketRead {
    Ready,
    Retry,
    EndOfStream,
}

/// Only `EAGAIN` is retried. Any other failure (e.g. `ENODEV` from an
/// unplugged camera) is returned to the caller.
pub(crate) fn classify_read(
    result: Result<(), ffmpeg_next::Error>,
) -> Result<PacketRead, ffmpeg_next::Error> {
    match result {
        Ok(()) => Ok(PacketRead::Ready),
        Err(ffmpeg_next::Error::Eof) => Ok(PacketRead::EndOfStream),
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::error::EAGAIN => {
            Ok(PacketRead::Retry)
        }
        Err(e) => Err(e),
    }
}

/// Next demuxed packet, or `None` at end of input.
pub(crate) fn read_packet(
    ictx: &mut ffmpeg_next::format::context::Input,
) -> Result<Option<ffmpeg_next::Packet>, ffmpeg_next::Error> {
    loop {
        let mut packet = ffmpeg_next::Packet::empty();
        match classify_read(packet.read(ictx))? {
            PacketRead::Ready => return Ok(Some(packet)),
            PacketRead::Retry => continue,
            PacketRead::EndOfStream => return Ok(None),
        }
    }
}

/// Scaler converting the decoder's native pixel format to packed RGB24.
pub(crate) fn rgb_scaler(
    decoder: &ffmpeg_next::decoder::Video,
) -> Result<ffmpeg_next::software::scaling::Context, ffmpeg_next::Error> {
    ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg_next::format::Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
}

/// Copy packed RGB rows out of a (possibly padded) ffmpeg frame.
pub(crate) fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::error::{EAGAIN, EIO, ENODEV};
    use ffmpeg_next::Error;
    use rstest::rstest;
    use std::path::Path;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("still.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([10, 20, 30]);
        }
        img.save(&path).unwrap();
        path
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_from_index_uses_v4l2_device_node() {
        let device = CameraDevice::from_index(2);
        assert_eq!(device.format, "v4l2");
        assert_eq!(device.url, "/dev/video2");
    }

    #[test]
    fn test_parse_numeric_is_index() {
        assert_eq!(CameraDevice::parse("0"), CameraDevice::from_index(0));
    }

    #[test]
    fn test_parse_directshow_name() {
        let device = CameraDevice::parse("video=Integrated Camera");
        assert_eq!(device.format, "dshow");
        assert_eq!(device.url, "video=Integrated Camera");
    }

    #[test]
    fn test_parse_path_keeps_platform_format() {
        let device = CameraDevice::parse("/dev/video5");
        assert_eq!(device.format, CAMERA_INPUT_FORMAT);
        assert_eq!(device.url, "/dev/video5");
    }

    #[test]
    fn test_with_option_accumulates() {
        let device = CameraDevice::from_index(0)
            .with_option("video_size", "1280x720")
            .with_option("framerate", "30");
        assert_eq!(device.options.len(), 2);
        assert_eq!(
            device.options[0],
            ("video_size".to_string(), "1280x720".to_string())
        );
    }

    #[rstest]
    #[case(Ok(()), Ok(PacketRead::Ready))]
    #[case(Err(Error::Eof), Ok(PacketRead::EndOfStream))]
    #[case(Err(Error::Other { errno: EAGAIN }), Ok(PacketRead::Retry))]
    #[case(Err(Error::Other { errno: ENODEV }), Err(Error::Other { errno: ENODEV }))]
    #[case(Err(Error::Other { errno: EIO }), Err(Error::Other { errno: EIO }))]
    #[case(Err(Error::InvalidData), Err(Error::InvalidData))]
    fn test_classify_read(
        #[case] result: Result<(), Error>,
        #[case] expected: Result<PacketRead, Error>,
    ) {
        assert_eq!(classify_read(result), expected);
    }

    #[test]
    fn test_source_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FfmpegFrameSource>();
    }

    #[test]
    fn test_next_frame_without_open_errors() {
        let mut source = FfmpegFrameSource::file("/nonexistent/clip.mp4");
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn test_open_nonexistent_file_errors() {
        let mut source = FfmpegFrameSource::file("/nonexistent/clip.mp4");
        assert!(source.open().is_err());
        assert!(!source.is_open());
    }

    #[test]
    fn test_file_source_yields_frames_then_end_of_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 32, 24);
        let mut source = FfmpegFrameSource::file(&path);

        let meta = source.open().unwrap();
        assert_eq!(meta.width, 32);
        assert_eq!(meta.height, 24);

        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.index(), 0);
        assert_eq!(&frame.data()[..3], &[10, 20, 30]);
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 8, 8);
        let mut source = FfmpegFrameSource::file(&path);
        source.open().unwrap();
        assert!(source.is_open());
        source.close();
        source.close();
        assert!(!source.is_open());
    }
}
