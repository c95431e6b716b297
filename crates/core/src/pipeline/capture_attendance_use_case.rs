use std::time::Instant;

use crate::attendance::domain::attendance_ledger::AttendanceLedger;
use crate::attendance::domain::attendance_record::AttendanceRecord;
use crate::attendance::domain::clock::Clock;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::recognition::domain::reference_store::ReferenceStore;
use crate::shared::constants::{DEFAULT_DOWNSCALE, KEY_POLL_MS, QUIT_KEY};
use crate::shared::frame::Frame;
use crate::video::domain::frame_display::{FrameDisplay, Overlay};
use crate::video::domain::frame_source::FrameSource;

/// Why the capture loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    QuitKey,
    EndOfStream,
    SourceError,
    FrameLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped(StopReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureSummary {
    pub frames: usize,
    pub faces_detected: usize,
    pub faces_recognized: usize,
    pub records_written: usize,
    pub stop_reason: StopReason,
}

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    /// Integer reduction applied to each frame before detection.
    pub downscale: u32,
    pub quit_key: char,
    pub key_poll_ms: i32,
    pub max_frames: Option<usize>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            downscale: DEFAULT_DOWNSCALE,
            quit_key: QUIT_KEY,
            key_poll_ms: KEY_POLL_MS,
            max_frames: None,
        }
    }
}

#[derive(Default)]
struct Tally {
    frames: usize,
    faces_detected: usize,
    faces_recognized: usize,
    records_written: usize,
}

impl Tally {
    fn finish(self, stop_reason: StopReason) -> CaptureSummary {
        CaptureSummary {
            frames: self.frames,
            faces_detected: self.faces_detected,
            faces_recognized: self.faces_recognized,
            records_written: self.records_written,
            stop_reason,
        }
    }
}

/// Live attendance loop: acquire → downscale → detect → embed → match →
/// mark → display → poll quit key.
///
/// The frame source and display are released on every exit path,
/// including errors.
pub struct CaptureAttendanceUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
    matcher: FaceMatcher,
    references: ReferenceStore,
    ledger: Box<dyn AttendanceLedger>,
    display: Option<Box<dyn FrameDisplay>>,
    clock: Box<dyn Clock>,
    logger: Box<dyn PipelineLogger>,
    config: CaptureConfig,
}

impl CaptureAttendanceUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
        matcher: FaceMatcher,
        references: ReferenceStore,
        ledger: Box<dyn AttendanceLedger>,
        display: Option<Box<dyn FrameDisplay>>,
        clock: Box<dyn Clock>,
        logger: Box<dyn PipelineLogger>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            source,
            detector,
            embedder,
            matcher,
            references,
            ledger,
            display,
            clock,
            logger,
            config,
        }
    }

    /// Runs the loop until the quit key, end of stream, an acquisition
    /// error or the frame limit.
    pub fn execute(&mut self) -> Result<CaptureSummary, Box<dyn std::error::Error>> {
        let result = self.run();

        self.source.close();
        if let Some(display) = self.display.as_mut() {
            display.close();
        }
        self.logger.summary();

        result
    }

    fn run(&mut self) -> Result<CaptureSummary, Box<dyn std::error::Error>> {
        let metadata = self.source.open()?;
        self.ledger.ensure_header()?;
        if self.references.is_empty() {
            log::warn!("Reference store is empty; faces will not be recognized");
        }

        let mut tally = Tally::default();
        let reason = loop {
            match self.step(&mut tally, metadata.total_frames)? {
                LoopState::Running => continue,
                LoopState::Stopped(reason) => break reason,
            }
        };
        log::info!(
            "Capture stopped ({reason:?}) after {} frames, {} records written",
            tally.frames,
            tally.records_written
        );
        Ok(tally.finish(reason))
    }

    fn step(
        &mut self,
        tally: &mut Tally,
        total: Option<usize>,
    ) -> Result<LoopState, Box<dyn std::error::Error>> {
        if self.config.max_frames.is_some_and(|limit| tally.frames >= limit) {
            return Ok(LoopState::Stopped(StopReason::FrameLimit));
        }

        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(LoopState::Stopped(StopReason::EndOfStream)),
            Err(e) => {
                log::warn!("Frame acquisition failed: {e}");
                return Ok(LoopState::Stopped(StopReason::SourceError));
            }
        };
        tally.frames += 1;
        self.logger.progress(tally.frames, total);

        let overlays = self.process_frame(&frame, tally)?;

        let Some(display) = self.display.as_mut() else {
            return Ok(LoopState::Running);
        };
        let t = Instant::now();
        display.show(&frame, &overlays)?;
        let key = display.poll_key(self.config.key_poll_ms)?;
        self.logger.timing("display", elapsed_ms(t));

        if key == Some(self.config.quit_key) {
            return Ok(LoopState::Stopped(StopReason::QuitKey));
        }
        Ok(LoopState::Running)
    }

    /// Detects and identifies faces on a downscaled copy of `frame`, marks
    /// attendance for each accepted label and returns full-resolution
    /// overlays.
    fn process_frame(
        &mut self,
        frame: &Frame,
        tally: &mut Tally,
    ) -> Result<Vec<Overlay>, Box<dyn std::error::Error>> {
        let small = frame.downscale(self.config.downscale);
        let scale = if small.width() == frame.width() {
            1
        } else {
            self.config.downscale
        };

        let t = Instant::now();
        let regions = self.detector.detect(&small)?;
        self.logger.timing("detect", elapsed_ms(t));
        self.logger.metric("faces", regions.len() as f64);
        if regions.is_empty() {
            return Ok(Vec::new());
        }
        tally.faces_detected += regions.len();

        let t = Instant::now();
        let embeddings = self.embedder.embed(&small, &regions)?;
        self.logger.timing("embed", elapsed_ms(t));
        if embeddings.len() != regions.len() {
            return Err(format!(
                "embedder returned {} vectors for {} faces",
                embeddings.len(),
                regions.len()
            )
            .into());
        }

        let t = Instant::now();
        let mut overlays = Vec::new();
        for (embedding, region) in embeddings.iter().zip(&regions) {
            let Some(label) = self.matcher.identify(&self.references, embedding) else {
                continue;
            };
            tally.faces_recognized += 1;

            let record = AttendanceRecord::new(label, self.clock.now());
            if self.ledger.append(&record)? {
                tally.records_written += 1;
            }
            overlays.push(Overlay {
                region: region.scaled(scale),
                label: label.to_string(),
            });
        }
        self.logger.timing("match", elapsed_ms(t));

        log::debug!(
            "Frame {}: {} faces, {} recognized",
            frame.index(),
            regions.len(),
            overlays.len()
        );
        Ok(overlays)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
