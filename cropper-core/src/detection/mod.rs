// ============================================================================
// cropper-core/src/detection/mod.rs
// ============================================================================
//
// DIMENSION DETECTION: Finding the visible picture area of a video
//
// The detector probes five evenly spaced points of the file with ffmpeg's
// cropdetect filter, votes on each crop component independently, and checks
// the result against a table of known display aspect ratios.
//
// KEY COMPONENTS:
// - DimensionDetector: the detection pipeline, generic over the ffmpeg and
//   ffprobe collaborators
// - Detect: object-safe entry point used by the crop executor and the server
// - aspect: known ratio table and near-miss snapping
// - crop_analysis: cropdetect parsing and per-axis modes

pub mod aspect;
pub mod crop_analysis;
pub mod rectangle;

pub use aspect::{KNOWN_RATIOS, KnownRatio, match_known_ratio, snap_to_aspect};
pub use rectangle::{CropRectangle, CropWindow};

use crate::error::{CoreResult, DetectionError};
use crate::external::{FfmpegProcess, FfmpegSpawner, FfprobeExecutor, MediaInfo, ToolPaths};
use crop_analysis::{CropTally, CropValues, last_crop};

use ffmpeg_sidecar::event::FfmpegEvent;
use rayon::prelude::*;
use std::path::Path;

/// Fractions of the duration at which cropdetect is run.
pub const PROBE_POSITIONS: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];

/// Seconds of video analysed per probe.
pub const PROBE_WINDOW_SECS: u32 = 5;

/// Anything that can report the visible picture area of a file.
pub trait Detect: Send + Sync {
    fn detect(&self, file: &Path) -> CoreResult<CropRectangle>;
}

/// Detects the crop rectangle of a video with ffmpeg's cropdetect filter.
#[derive(Debug, Clone)]
pub struct DimensionDetector<S: FfmpegSpawner, P: FfprobeExecutor> {
    spawner: S,
    prober: P,
    tools: ToolPaths,
    snap_to_aspect: bool,
}

impl<S: FfmpegSpawner, P: FfprobeExecutor> DimensionDetector<S, P> {
    pub fn new(spawner: S, prober: P, tools: ToolPaths) -> Self {
        Self {
            spawner,
            prober,
            tools,
            snap_to_aspect: true,
        }
    }

    /// Enables or disables snapping near-miss rectangles onto the matched ratio.
    pub fn with_snap_to_aspect(mut self, enable: bool) -> Self {
        self.snap_to_aspect = enable;
        self
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Runs the full detection pipeline on `file`.
    pub fn detect(&self, file: &Path) -> CoreResult<CropRectangle> {
        self.analyze(file).map(|(rect, _)| rect)
    }

    /// Like [`detect`](Self::detect), also returning the ffprobe facts read on
    /// the way so callers need not probe the file again.
    pub fn analyze(&self, file: &Path) -> CoreResult<(CropRectangle, MediaInfo)> {
        let media = self.prober.probe(file)?;
        let duration = media.duration;
        log::debug!(
            "Sampling crop at {} points of {} ({:.1}s)",
            PROBE_POSITIONS.len(),
            file.display(),
            duration
        );

        let samples: Vec<Option<CropValues>> = PROBE_POSITIONS
            .par_iter()
            .map(|&position| self.probe(file, duration * position))
            .collect::<CoreResult<_>>()?;

        let tally: CropTally = samples.iter().flatten().collect();
        log::debug!("Collected {} crop samples for {}", tally.samples(), file.display());

        let (width, height, left, top) = tally.resolve();
        if width <= 0 || height <= 0 {
            log::warn!("No crop found for {} ({}:{}:{}:{})", file.display(), width, height, left, top);
            return Err(DetectionError::NoCropFound.into());
        }

        let dims = media.dimensions;
        let invalid_geometry = || DetectionError::InvalidGeometry {
            width,
            height,
            left,
            top,
            file_width: dims.width,
            file_height: dims.height,
        };
        let to_px = |value: i64| u32::try_from(value).map_err(|_| invalid_geometry());

        let mut rect = CropRectangle {
            file_x: dims.width,
            file_y: dims.height,
            x: to_px(width)?,
            y: to_px(height)?,
            x_offset: to_px(left)?,
            y_offset: to_px(top)?,
            aspect: None,
        };

        let known = match_known_ratio(rect.x, rect.y).ok_or(DetectionError::UnexpectedRatio {
            width: rect.x,
            height: rect.y,
            ratio: f64::from(rect.x) / f64::from(rect.y),
        })?;
        rect.aspect = Some(known.label.to_string());
        if self.snap_to_aspect {
            snap_to_aspect(&mut rect, known.value);
        }

        if !rect.window().fits(rect.file_x, rect.file_y) {
            return Err(invalid_geometry().into());
        }

        log::info!(
            "Detected crop {} ({}) for {}",
            rect.window(),
            known.label,
            file.display()
        );
        Ok((rect, media))
    }

    /// Runs cropdetect once and returns the last crop it printed.
    fn probe(&self, file: &Path, start_secs: f64) -> CoreResult<Option<CropValues>> {
        log::trace!("Sampling crop at {:.2}s", start_secs);

        let mut cmd = self.tools.ffmpeg_command();
        cmd.args(["-ss", &format!("{start_secs:.2}")]);
        cmd.input(file.to_string_lossy().into_owned());
        cmd.args([
            "-t",
            &PROBE_WINDOW_SECS.to_string(),
            "-vf",
            "cropdetect",
            "-f",
            "null",
            "-",
        ]);

        let mut process = self.spawner.spawn(cmd)?;
        let mut lines = Vec::new();
        process.handle_events(|event| {
            if let FfmpegEvent::Log(_, line) = event {
                lines.push(line);
            }
            Ok(())
        })?;

        let status = process.wait()?;
        if !status.success() {
            log::warn!(
                "cropdetect at {:.2}s exited with {} for {}",
                start_secs,
                status,
                file.display()
            );
        }
        Ok(last_crop(lines.iter().map(String::as_str)))
    }
}

impl<S: FfmpegSpawner, P: FfprobeExecutor> Detect for DimensionDetector<S, P> {
    fn detect(&self, file: &Path) -> CoreResult<CropRectangle> {
        DimensionDetector::detect(self, file)
    }
}
