// ============================================================================
// cropper-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module wraps the two external binaries the cropper depends on. Both are
// reached through traits so detection and cropping can be exercised without a
// real ffmpeg installation.
//
// KEY COMPONENTS:
// - ToolPaths: resolves the ffmpeg/ffprobe binaries (optional root directory)
// - FfmpegSpawner / FfmpegProcess: spawning ffmpeg and reading its log events
// - FfprobeExecutor: duration, dimensions and codec of the first video stream
// - Dependency checking

use crate::error::{CoreResult, command_start_error};

use ffmpeg_sidecar::command::FfmpegCommand;
use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Traits and implementations for executing ffprobe commands
pub mod ffprobe_executor;

/// Test doubles for the executor traits
#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use ffprobe_executor::{CrateFfprobeExecutor, FfprobeExecutor, MediaInfo, VideoDimensions};

// ============================================================================
// TOOL LOCATION
// ============================================================================

/// Location of the ffmpeg and ffprobe binaries.
///
/// With no root the binaries are looked up on `PATH`. With a root, both are
/// expected directly inside that directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPaths {
    root: Option<PathBuf>,
}

impl ToolPaths {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&PathBuf> {
        self.root.as_ref()
    }

    pub fn ffmpeg(&self) -> PathBuf {
        self.binary("ffmpeg")
    }

    pub fn ffprobe(&self) -> PathBuf {
        self.binary("ffprobe")
    }

    /// A fresh `FfmpegCommand` pointing at the resolved ffmpeg binary.
    pub fn ffmpeg_command(&self) -> FfmpegCommand {
        FfmpegCommand::new_with_path(self.ffmpeg())
    }

    fn binary(&self, name: &str) -> PathBuf {
        let file = format!("{name}{EXE_SUFFIX}");
        match &self.root {
            Some(root) => root.join(file),
            None => PathBuf::from(file),
        }
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Runs `<binary> -version` to make sure the binary exists and starts.
///
/// A missing binary is reported as [`crate::CoreError::ProcessNotFound`].
pub fn check_dependency(binary: &Path) -> CoreResult<()> {
    let name = binary.display().to_string();
    match Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => {
            log::debug!("Found dependency: {}", name);
            Ok(())
        }
        Err(e) => {
            log::warn!("Dependency '{}' could not be started: {}", name, e);
            Err(command_start_error(name, e))
        }
    }
}

/// Checks both ffmpeg and ffprobe.
pub fn check_dependencies(tools: &ToolPaths) -> CoreResult<()> {
    check_dependency(&tools.ffmpeg())?;
    check_dependency(&tools.ffprobe())
}
