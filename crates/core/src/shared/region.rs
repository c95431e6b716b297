/// A detected face box in pixel coordinates of the frame it was found on.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
}

impl Region {
    /// Build from corner coordinates, rounding each corner to the nearest pixel.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> Self {
        let x = x1.round() as i32;
        let y = y1.round() as i32;
        Self {
            x,
            y,
            width: (x2.round() as i32 - x).max(0),
            height: (y2.round() as i32 - y).max(0),
            confidence,
        }
    }

    /// Map a region found on a frame downscaled by `factor` back onto the
    /// full-resolution frame.
    pub fn scaled(&self, factor: u32) -> Region {
        let f = factor as i32;
        Region {
            x: self.x * f,
            y: self.y * f,
            width: self.width * f,
            height: self.height * f,
            confidence: self.confidence,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}
