use opencv::core::{Mat, Point, Rect, Scalar, CV_8UC3};
use opencv::prelude::*;
use opencv::{highgui, imgproc};

use crate::shared::frame::Frame;
use crate::video::domain::frame_display::{FrameDisplay, Overlay};

const BOX_THICKNESS: i32 = 2;
const LABEL_OFFSET: i32 = 10;
const LABEL_SCALE: f64 = 0.5;

/// Shows the annotated feed in an OpenCV highgui window and reads key
/// presses from it.
///
/// The window is created lazily on the first [`FrameDisplay::show`] and
/// destroyed on [`FrameDisplay::close`] or drop.
pub struct HighguiDisplay {
    window: String,
    opened: bool,
}

impl HighguiDisplay {
    pub fn new(window: impl Into<String>) -> Self {
        Self {
            window: window.into(),
            opened: false,
        }
    }
}

impl FrameDisplay for HighguiDisplay {
    fn show(
        &mut self,
        frame: &Frame,
        overlays: &[Overlay],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !self.opened {
            highgui::named_window(&self.window, highgui::WINDOW_AUTOSIZE)?;
            self.opened = true;
        }

        let mut mat = to_bgr_mat(frame)?;
        for overlay in overlays {
            draw_overlay(&mut mat, overlay)?;
        }
        highgui::imshow(&self.window, &mat)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<char>, Box<dyn std::error::Error>> {
        let key = highgui::wait_key(timeout_ms)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(Some(char::from((key & 0xFF) as u8)))
    }

    fn close(&mut self) {
        if !self.opened {
            return;
        }
        self.opened = false;
        if let Err(e) = highgui::destroy_window(&self.window) {
            log::warn!("Failed to close window '{}': {e}", self.window);
        }
    }
}

impl Drop for HighguiDisplay {
    fn drop(&mut self) {
        self.close();
    }
}

/// Copy an RGB frame into a BGR `Mat` for highgui.
fn to_bgr_mat(frame: &Frame) -> Result<Mat, Box<dyn std::error::Error>> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    let dst = mat.data_bytes_mut()?;
    rgb_to_bgr(frame.data(), dst);
    Ok(mat)
}

fn rgb_to_bgr(src: &[u8], dst: &mut [u8]) {
    for (out, px) in dst.chunks_exact_mut(3).zip(src.chunks_exact(3)) {
        out[0] = px[2];
        out[1] = px[1];
        out[2] = px[0];
    }
}

fn draw_overlay(mat: &mut Mat, overlay: &Overlay) -> Result<(), Box<dyn std::error::Error>> {
    let r = &overlay.region;
    imgproc::rectangle(
        mat,
        Rect::new(r.x, r.y, r.width, r.height),
        Scalar::new(0.0, 255.0, 0.0, 0.0),
        BOX_THICKNESS,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::put_text(
        mat,
        &overlay.label,
        Point::new(r.x, r.y - LABEL_OFFSET),
        imgproc::FONT_HERSHEY_SIMPLEX,
        LABEL_SCALE,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
        1,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}
