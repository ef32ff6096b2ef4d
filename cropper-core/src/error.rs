// ============================================================================
// cropper-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for cropper-core
//
// This module defines the error taxonomy used throughout the library.
//
// KEY COMPONENTS:
// - DetectionError: no usable crop, unknown aspect ratio, bad geometry
// - CropError: failures specific to producing a cropped file
// - CoreError: top-level error wrapping IO, SQLite, process and JSON errors
// - Helper constructors for process start/wait/exit failures
//
// Only crop execution errors are swallowed (by the queue consumer, which marks
// the row aborted). Everything else propagates to the caller.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Reasons the dimension detector refuses to produce a rectangle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// The resolved width or height was zero (or negative).
    #[error("no crop found")]
    NoCropFound,

    /// `width / height` is not within tolerance of any known aspect ratio.
    #[error("unexpected ratio {ratio:.3} for {width}x{height}")]
    UnexpectedRatio { width: u32, height: u32, ratio: f64 },

    /// The rectangle does not fit inside the source frame.
    #[error("crop {width}:{height}:{left}:{top} does not fit inside {file_width}x{file_height}")]
    InvalidGeometry {
        width: i64,
        height: i64,
        left: i64,
        top: i64,
        file_width: u32,
        file_height: u32,
    },
}

/// Failures raised while producing the cropped output file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CropError {
    #[error("output file dimensions already match, file does not need cropping")]
    AlreadyCropped,

    #[error("metadata cropping is unavailable for codec '{0}' (h264 and hevc only)")]
    UnsupportedCodec(String),

    #[error("requested crop {0} does not fit inside {1}x{2}")]
    OutOfBounds(String, u32, u32),
}

/// Top-level error type for cropper-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Crop failed: {0}")]
    Crop(#[from] CropError),

    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Database lane is no longer running")]
    StoreClosed,

    #[error("Required binary not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, io::Error),

    #[error("Failed waiting for {0}: {1}")]
    CommandWait(String, io::Error),

    #[error("{0} exited with {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("Could not parse ffprobe output: {0}")]
    FfprobeParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Result type for cropper-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// True when the failure is a missing ffmpeg/ffprobe binary.
    pub fn is_process_not_found(&self) -> bool {
        matches!(self, CoreError::ProcessNotFound(_))
    }
}

/// Maps a spawn failure, turning `NotFound` into [`CoreError::ProcessNotFound`].
pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    let cmd = cmd.into();
    if err.kind() == io::ErrorKind::NotFound {
        CoreError::ProcessNotFound(cmd)
    } else {
        CoreError::CommandStart(cmd, err)
    }
}

pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_process_not_found() {
        let err = command_start_error("ffprobe", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_process_not_found());
        assert_eq!(err.to_string(), "Required binary not found: ffprobe");

        let err = command_start_error("ffprobe", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, CoreError::CommandStart(ref name, _) if name == "ffprobe"));
    }

    #[test]
    fn test_detection_messages() {
        assert_eq!(DetectionError::NoCropFound.to_string(), "no crop found");
        let err = DetectionError::UnexpectedRatio { width: 1000, height: 300, ratio: 1000.0 / 300.0 };
        assert!(err.to_string().starts_with("unexpected ratio 3.333"));
    }
}
