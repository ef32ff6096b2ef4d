//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// `cropper detect`: print the visible area of a video.
pub mod detect;

/// `cropper crop`: crop one file, to a new file or in place.
pub mod crop;

/// `cropper serve`: run the crop queue behind the HTTP event server.
pub mod serve;

use crate::cli::CropModeArgs;
use cropper_core::config::CoreConfigBuilder;
use cropper_core::external::{CrateFfprobeExecutor, SidecarSpawner};
use cropper_core::{CoreConfig, DimensionDetector};
use std::path::PathBuf;

/// Detector backed by the real ffmpeg and ffprobe binaries.
pub type SystemDetector = DimensionDetector<SidecarSpawner, CrateFfprobeExecutor>;

pub(crate) fn system_detector(config: &CoreConfig) -> SystemDetector {
    let tools = config.tool_paths();
    DimensionDetector::new(SidecarSpawner, CrateFfprobeExecutor::new(tools.ffprobe()), tools)
        .with_snap_to_aspect(config.snap_to_aspect)
}

/// Config builder seeded with the options shared by `crop` and `serve`.
pub(crate) fn builder_with_mode(ffmpeg_root: Option<PathBuf>, mode: &CropModeArgs) -> CoreConfigBuilder {
    CoreConfigBuilder::new()
        .ffmpeg_root(ffmpeg_root)
        .ffmpeg_options(mode.ffmpeg_options.clone())
        .metadata(mode.metadata)
}
