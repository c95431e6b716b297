mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use attendance_core::attendance::infrastructure::csv_ledger::CsvLedger;
use attendance_core::attendance::infrastructure::system_clock::SystemClock;
use attendance_core::detection::domain::face_detector::FaceDetector;
use attendance_core::detection::domain::face_embedder::FaceEmbedder;
use attendance_core::detection::infrastructure::onnx_arcface_embedder::OnnxArcFaceEmbedder;
use attendance_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use attendance_core::pipeline::capture_attendance_use_case::{
    CaptureAttendanceUseCase, CaptureConfig,
};
use attendance_core::pipeline::load_references_use_case::LoadReferencesUseCase;
use attendance_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use attendance_core::recognition::domain::face_matcher::FaceMatcher;
use attendance_core::shared::constants::{EMBEDDING_MODEL, WINDOW_TITLE, YOLO_MODEL};
use attendance_core::shared::model_resolver::{self, ModelSpec};
use attendance_core::video::domain::frame_display::FrameDisplay;
use attendance_core::video::domain::frame_source::FrameSource;
use attendance_core::video::infrastructure::ffmpeg_frame_source::{
    CameraDevice, FfmpegFrameSource,
};
use attendance_core::video::infrastructure::ffmpeg_image_reader::FfmpegImageReader;
use attendance_core::video::infrastructure::highgui_display::HighguiDisplay;

use settings::{DedupMode, Settings};

/// Mark attendance by recognizing known faces in a live camera feed.
#[derive(Parser, Debug, Default)]
#[command(name = "attendance")]
struct Cli {
    /// Folder with one photo per person, named after them.
    #[arg(long)]
    known_faces: Option<PathBuf>,

    /// Attendance CSV file to append to.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Camera index or device (e.g. 0, /dev/video2, "video=Integrated Camera").
    #[arg(long, conflicts_with = "input")]
    camera: Option<String>,

    /// Capture size requested from the camera, e.g. 1280x720.
    #[arg(long)]
    camera_resolution: Option<String>,

    /// Read frames from a video file instead of the camera.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Shrink frames by this factor before detection.
    #[arg(long)]
    downscale: Option<u32>,

    /// Maximum face distance accepted as a match (0.0-2.0].
    #[arg(long)]
    tolerance: Option<f64>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Duplicate rule for the ledger.
    #[arg(long, value_enum)]
    dedup: Option<DedupMode>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Run without a preview window.
    #[arg(long)]
    no_display: bool,

    /// Directory with bundled ONNX models.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Settings file (default: <config dir>/Attendance/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Effective options after layering flags over the settings file.
#[derive(Debug, Clone, PartialEq)]
struct Options {
    known_faces: PathBuf,
    ledger: PathBuf,
    source: SourceOption,
    camera_resolution: Option<String>,
    downscale: u32,
    tolerance: f64,
    confidence: f64,
    dedup: DedupMode,
    max_frames: Option<usize>,
    display: bool,
    models_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum SourceOption {
    Camera(String),
    File(PathBuf),
}

impl Options {
    fn merge(cli: Cli, settings: Settings) -> Self {
        let source = match (cli.input, cli.camera) {
            (Some(path), _) => SourceOption::File(path),
            (None, Some(camera)) => SourceOption::Camera(camera),
            (None, None) => SourceOption::Camera(settings.camera),
        };
        Self {
            known_faces: cli.known_faces.unwrap_or(settings.known_faces),
            ledger: cli.ledger.unwrap_or(settings.ledger),
            source,
            camera_resolution: cli.camera_resolution.or(settings.camera_resolution),
            downscale: cli.downscale.unwrap_or(settings.downscale),
            tolerance: cli.tolerance.unwrap_or(settings.tolerance),
            confidence: cli.confidence.unwrap_or(settings.confidence),
            dedup: cli.dedup.unwrap_or(settings.dedup),
            max_frames: cli.max_frames,
            display: settings.display && !cli.no_display,
            models_dir: cli.models_dir.or(settings.models_dir),
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let options = Options::merge(cli, settings);
    validate(&options)?;

    let yolo_path = resolve_model(&YOLO_MODEL, options.models_dir.as_deref())?;
    let arcface_path = resolve_model(&EMBEDDING_MODEL, options.models_dir.as_deref())?;

    log::info!("Loading reference faces from {}", options.known_faces.display());
    let mut loader = LoadReferencesUseCase::new(
        Box::new(FfmpegImageReader::new()),
        build_detector(&yolo_path, options.confidence)?,
        build_embedder(&arcface_path)?,
    );
    let references = loader.execute(&options.known_faces)?;
    let (detector, embedder) = loader.into_models();

    let ledger = CsvLedger::open(&options.ledger, options.dedup.into())?;
    let display: Option<Box<dyn FrameDisplay>> = if options.display {
        Some(Box::new(HighguiDisplay::new(WINDOW_TITLE)))
    } else {
        None
    };
    if !options.display
        && options.max_frames.is_none()
        && matches!(options.source, SourceOption::Camera(_))
    {
        log::warn!("Running a camera without display or --max-frames; stop with Ctrl+C");
    }

    let mut use_case = CaptureAttendanceUseCase::new(
        build_source(&options),
        detector,
        embedder,
        FaceMatcher::new(options.tolerance),
        references,
        Box::new(ledger),
        display,
        Box::new(SystemClock),
        Box::new(StdoutPipelineLogger::default()),
        CaptureConfig {
            downscale: options.downscale,
            max_frames: options.max_frames,
            ..CaptureConfig::default()
        },
    );
    let summary = use_case.execute()?;

    log::info!(
        "{} faces recognized, {} new records in {}",
        summary.faces_recognized,
        summary.records_written,
        options.ledger.display()
    );
    Ok(())
}

fn build_source(options: &Options) -> Box<dyn FrameSource> {
    match &options.source {
        SourceOption::File(path) => Box::new(FfmpegFrameSource::file(path)),
        SourceOption::Camera(spec) => {
            let mut device = CameraDevice::parse(spec);
            if let Some(size) = &options.camera_resolution {
                device = device.with_option("video_size", size);
            }
            Box::new(FfmpegFrameSource::camera(device))
        }
    }
}

fn build_detector(
    model_path: &Path,
    confidence: f64,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    Ok(Box::new(OnnxYoloDetector::new(model_path, confidence)?))
}

fn build_embedder(model_path: &Path) -> Result<Box<dyn FaceEmbedder>, Box<dyn std::error::Error>> {
    Ok(Box::new(OnnxArcFaceEmbedder::new(model_path)?))
}

fn resolve_model(
    spec: &ModelSpec,
    models_dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", spec.name);
    let name = spec.name;
    let path = model_resolver::resolve(
        spec,
        models_dir,
        Some(Box::new(move |downloaded, total| {
            download_progress(name, downloaded, total)
        })),
    )?;
    Ok(path)
}

fn validate(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    if !options.known_faces.is_dir() {
        return Err(format!(
            "Known faces directory not found: {}",
            options.known_faces.display()
        )
        .into());
    }
    if let SourceOption::File(path) = &options.source {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }
    if options.downscale == 0 {
        return Err("Downscale must be at least 1".into());
    }
    if !(options.tolerance > 0.0 && options.tolerance <= 2.0) {
        return Err(format!(
            "Tolerance must be in (0.0, 2.0], got {}",
            options.tolerance
        )
        .into());
    }
    if !(0.0..=1.0).contains(&options.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            options.confidence
        )
        .into());
    }
    if let Some(size) = &options.camera_resolution {
        if !is_resolution(size) {
            return Err(format!("Camera resolution must look like 1280x720, got '{size}'").into());
        }
    }
    if options.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    Ok(())
}

fn is_resolution(size: &str) -> bool {
    size.split_once('x').is_some_and(|(w, h)| {
        w.parse::<u32>().is_ok_and(|w| w > 0) && h.parse::<u32>().is_ok_and(|h| h > 0)
    })
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
