use ndarray::ArrayView3;

use crate::shared::region::Region;

/// A single camera/image frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Shrink by an integer factor in each dimension, averaging each
    /// `factor` x `factor` block.
    ///
    /// Trailing rows/columns that don't fill a whole block are dropped.
    /// A factor of 1 (or a frame smaller than one block) returns a copy.
    pub fn downscale(&self, factor: u32) -> Frame {
        if factor <= 1 || self.width < factor || self.height < factor {
            return self.clone();
        }

        let out_w = (self.width / factor) as usize;
        let out_h = (self.height / factor) as usize;
        let f = factor as usize;
        let c = self.channels as usize;
        let src = self.as_ndarray();
        let block = (f * f) as u32;

        let mut data = Vec::with_capacity(out_w * out_h * c);
        for oy in 0..out_h {
            for ox in 0..out_w {
                for ch in 0..c {
                    let mut sum: u32 = 0;
                    for dy in 0..f {
                        for dx in 0..f {
                            sum += src[[oy * f + dy, ox * f + dx, ch]] as u32;
                        }
                    }
                    data.push(((sum + block / 2) / block) as u8);
                }
            }
        }

        Frame::new(data, out_w as u32, out_h as u32, self.channels, self.index)
    }

    /// Copy the pixels under `region`, clamped to the frame bounds.
    ///
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, region: &Region) -> Option<Frame> {
        let x1 = region.x.max(0) as u32;
        let y1 = region.y.max(0) as u32;
        let x2 = (region.right().max(0) as u32).min(self.width);
        let y2 = (region.bottom().max(0) as u32).min(self.height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let c = self.channels as usize;
        let row_bytes = self.width as usize * c;
        let crop_w = (x2 - x1) as usize;
        let mut data = Vec::with_capacity(crop_w * (y2 - y1) as usize * c);
        for y in y1 as usize..y2 as usize {
            let start = y * row_bytes + x1 as usize * c;
            data.extend_from_slice(&self.data[start..start + crop_w * c]);
        }

        Some(Frame::new(data, x2 - x1, y2 - y1, self.channels, self.index))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
