use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;
use crate::video::infrastructure::ffmpeg_frame_source::{
    extract_rgb_pixels, read_packet, rgb_scaler,
};

/// Decodes reference photos with ffmpeg into RGB frames.
///
/// ffmpeg is significantly faster than the pure-Rust `image` crate for
/// large phone photos (e.g. 4032x3024 JPEG).
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegImageReader;

impl FfmpegImageReader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageReader for FfmpegImageReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("No image data found in {}", path.display()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().video()?;
        let mut scaler = rgb_scaler(&decoder)?;

        while let Some(packet) = read_packet(&mut ictx)? {
            if packet.stream() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            if let Some(frame) = try_receive_frame(&mut decoder, &mut scaler)? {
                return Ok(frame);
            }
        }

        // Some formats buffer the single frame until EOF.
        let _ = decoder.send_eof();
        try_receive_frame(&mut decoder, &mut scaler)?
            .ok_or_else(|| format!("Failed to decode image {}", path.display()).into())
    }
}

fn try_receive_frame(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_err() {
        return Ok(None);
    }
    let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
    scaler.run(&decoded, &mut rgb_frame)?;
    let (width, height) = (rgb_frame.width(), rgb_frame.height());
    let pixels = extract_rgb_pixels(&rgb_frame, width, height);
    Ok(Some(Frame::new(pixels, width, height, 3, 0)))
}
