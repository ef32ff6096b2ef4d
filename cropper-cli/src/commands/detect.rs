// cropper-cli/src/commands/detect.rs
//
// Runs the dimension detector on one file and prints the result.

use crate::cli::DetectArgs;
use crate::commands::system_detector;
use crate::error::CliResult;
use cropper_core::config::CoreConfigBuilder;
use cropper_core::CropRectangle;
use std::path::PathBuf;

/// Detects `args.file` and prints the rectangle as a tab report or JSON.
pub fn run_detect(args: DetectArgs, ffmpeg_root: Option<PathBuf>, json: bool) -> CliResult<()> {
    let config = CoreConfigBuilder::new().ffmpeg_root(ffmpeg_root).build();
    config.validate()?;

    log::debug!("Detecting dimensions of {}", args.file.display());
    let rect = system_detector(&config).detect(&args.file)?;
    println!("{}", render(&rect, json)?);
    Ok(())
}

/// Text or pretty JSON rendering of a detection result.
pub fn render(rect: &CropRectangle, json: bool) -> CliResult<String> {
    if json {
        Ok(serde_json::to_string_pretty(rect)?)
    } else {
        Ok(rect.to_report())
    }
}
