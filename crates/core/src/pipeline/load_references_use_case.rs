use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::embedding::Embedding;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::recognition::domain::reference_store::{ReferenceEntry, ReferenceStore};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::video::domain::image_reader::ImageReader;

#[derive(Error, Debug)]
pub enum ReferenceLoadError {
    #[error("failed to read reference directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode reference image {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("face detection failed on {path}: {message}")]
    Detect { path: PathBuf, message: String },
    #[error("no face found in reference image {path}")]
    NoFaceFound { path: PathBuf },
    #[error("failed to embed face in {path}: {message}")]
    Embed { path: PathBuf, message: String },
}

/// Builds the reference store from a folder with one photo per person:
/// list → decode → detect → embed first face → label with file stem.
pub struct LoadReferencesUseCase {
    reader: Box<dyn ImageReader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
}

impl LoadReferencesUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
    ) -> Self {
        Self {
            reader,
            detector,
            embedder,
        }
    }

    /// Loads every reference image in `dir`, in directory listing order.
    pub fn execute(&mut self, dir: &Path) -> Result<ReferenceStore, ReferenceLoadError> {
        let read_dir_error = |source| ReferenceLoadError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut store = ReferenceStore::new();
        for entry in fs::read_dir(dir).map_err(read_dir_error)? {
            let path = entry.map_err(read_dir_error)?.path();
            let Some(label) = reference_label(&path) else {
                log::warn!("Skipping {}: not an image file", path.display());
                continue;
            };
            let embedding = self.embed_reference(&path)?;
            log::debug!("Loaded reference '{label}' from {}", path.display());
            store.push(ReferenceEntry { label, embedding });
        }

        if store.is_empty() {
            log::warn!(
                "No reference images found in {}; no faces will be recognized",
                dir.display()
            );
        } else {
            log::info!("Loaded {} reference faces from {}", store.len(), dir.display());
        }
        Ok(store)
    }

    /// Hands the detector and embedder back for reuse by the capture loop.
    pub fn into_models(self) -> (Box<dyn FaceDetector>, Box<dyn FaceEmbedder>) {
        (self.detector, self.embedder)
    }

    fn embed_reference(&mut self, path: &Path) -> Result<Embedding, ReferenceLoadError> {
        let frame = self
            .reader
            .read(path)
            .map_err(|e| ReferenceLoadError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let regions = self
            .detector
            .detect(&frame)
            .map_err(|e| ReferenceLoadError::Detect {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let first = regions
            .into_iter()
            .next()
            .ok_or_else(|| ReferenceLoadError::NoFaceFound {
                path: path.to_path_buf(),
            })?;

        self.embedder
            .embed(&frame, std::slice::from_ref(&first))
            .map_err(|e| ReferenceLoadError::Embed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .into_iter()
            .next()
            .ok_or_else(|| ReferenceLoadError::Embed {
                path: path.to_path_buf(),
                message: "embedder returned no vector".to_string(),
            })
    }
}

/// File stem for a regular file with a known image extension.
fn reference_label(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}
