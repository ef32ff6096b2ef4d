//! ffprobe integration for reading the properties detection and cropping need.
//!
//! The binary is run directly (so an ffmpeg root directory can be honoured) and
//! its JSON output is deserialized into the `ffprobe` crate's `FfProbe` model.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use ffprobe::{FfProbe, Stream};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Encoded size of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

/// Everything detection and cropping need to know about a file, read in one
/// ffprobe run.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds.
    pub duration: f64,
    /// Size of the first video stream.
    pub dimensions: VideoDimensions,
    /// Codec name of the first video stream (`h264`, `hevc`, ...).
    pub video_codec: Option<String>,
}

impl MediaInfo {
    /// The video codec, or an error naming the file when ffprobe reported none.
    pub fn require_video_codec(&self, input_path: &Path) -> CoreResult<&str> {
        self.video_codec.as_deref().ok_or_else(|| {
            CoreError::FfprobeParse(format!(
                "Video stream missing codec name in {}",
                input_path.display()
            ))
        })
    }
}

/// Source of media facts about a file.
pub trait FfprobeExecutor: Send + Sync {
    fn probe(&self, input_path: &Path) -> CoreResult<MediaInfo>;
}

/// `FfprobeExecutor` backed by the ffprobe binary.
#[derive(Debug, Clone)]
pub struct CrateFfprobeExecutor {
    binary: PathBuf,
}

impl Default for CrateFfprobeExecutor {
    fn default() -> Self {
        Self::new(PathBuf::from("ffprobe"))
    }
}

impl CrateFfprobeExecutor {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    fn run(&self, input_path: &Path) -> CoreResult<FfProbe> {
        log::debug!("Running ffprobe on: {}", input_path.display());

        let output = Command::new(&self.binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(input_path)
            .output()
            .map_err(|e| command_start_error(self.binary.display().to_string(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            log::error!("ffprobe failed for {}: {}", input_path.display(), output.status);
            return Err(command_failed_error("ffprobe", output.status, stderr));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            CoreError::FfprobeParse(format!(
                "output for {} could not be deserialized: {e}",
                input_path.display()
            ))
        })
    }
}

fn first_video_stream<'a>(metadata: &'a FfProbe, input_path: &Path) -> CoreResult<&'a Stream> {
    metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            CoreError::FfprobeParse(format!("No video stream found in {}", input_path.display()))
        })
}

/// Pulls the duration out of already parsed metadata.
fn duration_from(metadata: &FfProbe, input_path: &Path) -> CoreResult<f64> {
    metadata
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| {
            CoreError::FfprobeParse(format!(
                "Failed to parse duration from format for {}",
                input_path.display()
            ))
        })
}

/// Pulls the first video stream's size out of already parsed metadata.
fn dimensions_from(metadata: &FfProbe, input_path: &Path) -> CoreResult<VideoDimensions> {
    let stream = first_video_stream(metadata, input_path)?;
    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok(VideoDimensions {
            width: width as u32,
            height: height as u32,
        }),
        (width, height) => Err(CoreError::FfprobeParse(format!(
            "Invalid video dimensions in {}: width={:?}, height={:?}",
            input_path.display(),
            width,
            height
        ))),
    }
}

/// Reduces parsed ffprobe output to the facts cropper uses.
fn media_info_from(metadata: &FfProbe, input_path: &Path) -> CoreResult<MediaInfo> {
    Ok(MediaInfo {
        duration: duration_from(metadata, input_path)?,
        dimensions: dimensions_from(metadata, input_path)?,
        video_codec: first_video_stream(metadata, input_path)?.codec_name.clone(),
    })
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn probe(&self, input_path: &Path) -> CoreResult<MediaInfo> {
        media_info_from(&self.run(input_path)?, input_path)
    }
}
