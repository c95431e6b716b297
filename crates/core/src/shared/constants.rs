use crate::shared::model_resolver::ModelSpec;

pub const APP_DIR_NAME: &str = "Attendance";

pub const YOLO_MODEL: ModelSpec = ModelSpec {
    name: "yolo11n-pose_widerface.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx",
};

pub const EMBEDDING_MODEL: ModelSpec = ModelSpec {
    name: "w600k_r50.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx",
};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const DEFAULT_KNOWN_FACES_DIR: &str = "known_faces";
pub const DEFAULT_LEDGER_FILE: &str = "attendance.csv";
pub const DEFAULT_CAMERA_INDEX: u32 = 0;

/// Linear reduction applied to each frame dimension before detection.
pub const DEFAULT_DOWNSCALE: u32 = 4;

/// Maximum cosine distance for two embeddings to count as the same person.
pub const DEFAULT_TOLERANCE: f64 = 0.6;

pub const QUIT_KEY: char = 'q';
pub const KEY_POLL_MS: i32 = 1;
pub const WINDOW_TITLE: &str = "Video";
