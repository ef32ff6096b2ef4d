// cropper-cli/src/commands/crop.rs
//
// Crops one file, either to a new output file or in place.

use crate::cli::{CropArgs, CropChoice};
use crate::commands::{builder_with_mode, system_detector};
use crate::error::CliResult;
use cropper_core::{CropOutput, CropRequest, CropSpec, FileCropper};
use serde::Serialize;
use std::path::PathBuf;

/// OUTPUT value that replaces the input file.
pub const IN_PLACE: &str = "in-place";

#[derive(Debug, Serialize)]
struct CropSummary {
    file: String,
    output: String,
    crop: String,
}

pub fn run_crop(args: CropArgs, ffmpeg_root: Option<PathBuf>, json: bool) -> CliResult<()> {
    let config = builder_with_mode(ffmpeg_root, &args.mode).build();
    config.validate()?;

    let request = build_request(&args)?;
    let cropper = FileCropper::new(system_detector(&config), config.crop_mode.clone());
    let detected = cropper.crop_file(&args.file, &request)?;

    let window = match request.crop {
        CropSpec::Auto => detected.window(),
        CropSpec::Explicit(window) => window,
    };
    let output = match &request.output {
        CropOutput::InPlace => args.file.display().to_string(),
        CropOutput::File(path) => path.display().to_string(),
    };

    if json {
        let summary = CropSummary {
            file: args.file.display().to_string(),
            output,
            crop: window.to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Cropped {} to {} -> {}", args.file.display(), window, output);
    }
    Ok(())
}

fn build_request(args: &CropArgs) -> CliResult<CropRequest> {
    let crop = match args.crop {
        CropChoice::Auto => CropSpec::Auto,
        CropChoice::Window(window) => CropSpec::Explicit(window),
    };
    let output = if args.output == IN_PLACE {
        CropOutput::InPlace
    } else {
        CropOutput::File(std::path::absolute(&args.output)?)
    };
    Ok(CropRequest { crop, output })
}
