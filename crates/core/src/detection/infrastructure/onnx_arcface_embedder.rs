//! ArcFace face embedder using ONNX Runtime.
//!
//! Crops each detected face, resizes it to the network's 112x112 input and
//! returns an L2-normalized identity vector per face.
use std::path::Path;

use crate::detection::domain::embedding::Embedding;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::detection::infrastructure::execution_provider::build_session;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceEmbedder {
    session: ort::session::Session,
}

impl OnnxArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: build_session(model_path)?,
        })
    }

    fn embed_crop(&mut self, crop: &Frame) -> Result<Embedding, Box<dyn std::error::Error>> {
        let tensor = preprocess(crop.data(), crop.width(), crop.height());
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        Ok(Embedding::normalized(embedding_slice.to_vec()))
    }
}

impl FaceEmbedder for OnnxArcFaceEmbedder {
    fn embed(
        &mut self,
        frame: &Frame,
        regions: &[Region],
    ) -> Result<Vec<Embedding>, Box<dyn std::error::Error>> {
        regions
            .iter()
            .map(|region| {
                let crop = frame.crop(region).ok_or_else(|| {
                    format!(
                        "Face region {}x{} at ({}, {}) lies outside the {}x{} frame",
                        region.width,
                        region.height,
                        region.x,
                        region.y,
                        frame.width(),
                        frame.height()
                    )
                })?;
                self.embed_crop(&crop)
            })
            .collect()
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape() {
        let data = vec![128u8; 50 * 50 * 3];
        let tensor = preprocess(&data, 50, 50);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_normalization_range() {
        let white = preprocess(&vec![255u8; 10 * 10 * 3], 10, 10);
        let black = preprocess(&vec![0u8; 10 * 10 * 3], 10, 10);
        assert!((white[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
        assert!((black[[0, 0, 0, 0]] + 1.0).abs() < 0.01);
    }

    #[test]
    fn test_preprocess_keeps_channel_order() {
        // Solid RGB(255, 0, 128) crop
        let mut data = Vec::new();
        for _ in 0..(8 * 8) {
            data.extend_from_slice(&[255, 0, 128]);
        }
        let tensor = preprocess(&data, 8, 8);
        assert!((tensor[[0, 0, 50, 50]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 1, 50, 50]] + 1.0).abs() < 0.01);
        assert!(tensor[[0, 2, 50, 50]].abs() < 0.01);
    }

    #[test]
    fn test_preprocess_non_square_crop_samples_whole_area() {
        // Left half black, right half white, 20x10 crop
        let mut data = Vec::new();
        for _y in 0..10 {
            for x in 0..20 {
                let v = if x < 10 { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        let tensor = preprocess(&data, 20, 10);
        assert!(tensor[[0, 0, 56, 0]] < -0.9);
        assert!(tensor[[0, 0, 56, 111]] > 0.9);
    }
}
