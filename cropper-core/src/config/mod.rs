//! Configuration structures and constants for the cropper-core library.
//!
//! This module provides the settings shared by the `detect`, `crop` and
//! `serve` commands: where ffmpeg lives, how files are cropped, how incoming
//! paths are rewritten and where the queue database is stored.

mod builder;

use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};
use crate::external::ToolPaths;
use crate::queue::PathMappings;

pub use builder::CoreConfigBuilder;

// Default constants

/// Port the HTTP event server listens on.
pub const DEFAULT_PORT: u16 = 4200;

/// Queue database file name, created in the working directory.
pub const DEFAULT_DATABASE_FILE: &str = "cropper.db";

/// ffmpeg options appended after the crop filter when re-encoding.
/// Every stream is kept; only video is re-encoded.
pub const DEFAULT_FFMPEG_OPTIONS: &str = "-map 0 -c copy -c:v libx264 -crf 18 -preset slow";

/// How a crop rectangle is applied to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropMode {
    /// Stream copy with the `h264_metadata` / `hevc_metadata` bitstream filter.
    /// Fast and lossless, but not every player honours the crop fields.
    Metadata,

    /// Re-encode through `-vf crop=...` followed by `ffmpeg_options`.
    Reencode { ffmpeg_options: String },
}

impl Default for CropMode {
    fn default() -> Self {
        CropMode::Reencode {
            ffmpeg_options: DEFAULT_FFMPEG_OPTIONS.to_string(),
        }
    }
}

/// Main configuration structure for the cropper-core library.
///
/// # Examples
///
/// ```rust
/// use cropper_core::config::{CoreConfigBuilder, CropMode};
///
/// let config = CoreConfigBuilder::new()
///     .path_mappings("/tv:/mnt/tv")
///     .metadata(true)
///     .port(8080)
///     .build();
///
/// assert_eq!(config.crop_mode, CropMode::Metadata);
/// assert_eq!(config.path_mappings.apply("/tv/show.mkv"), "/mnt/tv/show.mkv");
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory containing the ffmpeg and ffprobe binaries (PATH lookup if unset)
    pub ffmpeg_root: Option<PathBuf>,

    /// How crops are written
    pub crop_mode: CropMode,

    /// Snap near-correct detections to the matched aspect ratio
    pub snap_to_aspect: bool,

    /// Rewrite rules applied to every incoming path
    pub path_mappings: PathMappings,

    /// SQLite database holding the queue
    pub database_path: PathBuf,

    /// HTTP listening port
    pub port: u16,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ffmpeg_root: None,
            crop_mode: CropMode::default(),
            snap_to_aspect: true,
            path_mappings: PathMappings::default(),
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            port: DEFAULT_PORT,
        }
    }
}

impl CoreConfig {
    /// Resolved ffmpeg/ffprobe locations.
    pub fn tool_paths(&self) -> ToolPaths {
        ToolPaths::new(self.ffmpeg_root.clone())
    }

    /// Checks values that cannot be caught by argument parsing alone.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(root) = &self.ffmpeg_root {
            if !root.is_dir() {
                return Err(CoreError::Config(format!(
                    "ffmpeg root '{}' is not a directory",
                    root.display()
                )));
            }
        }

        if let CropMode::Reencode { ffmpeg_options } = &self.crop_mode {
            if ffmpeg_options.trim().is_empty() {
                return Err(CoreError::Config(
                    "ffmpeg options must not be empty when re-encoding".to_string(),
                ));
            }
        }

        if self.port == 0 {
            return Err(CoreError::Config("port must be between 1 and 65535".to_string()));
        }

        Ok(())
    }
}
