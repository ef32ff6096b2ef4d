// cropper-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use cropper_core::CropWindow;
use cropper_core::config::{DEFAULT_DATABASE_FILE, DEFAULT_FFMPEG_OPTIONS, DEFAULT_PORT};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    name = "cropper",
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Detects true size and crops videos using ffmpeg",
    long_about = "Detects black borders in videos, crops them with ffmpeg, and runs a crop \
                  queue fed by Sonarr and Radarr webhooks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory containing the ffmpeg and ffprobe binaries
    #[arg(short = 'f', long, global = true, value_name = "DIR", value_parser = parse_directory)]
    pub ffmpeg_root: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Enable detailed logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detects the true dimensions of a video
    Detect(DetectArgs),

    /// Crop a file using ffmpeg
    Crop(CropArgs),

    /// Start a server to receive events from Sonarr and Radarr
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Video file to detect dimensions of
    #[arg(value_name = "FILE", value_parser = parse_existing_file)]
    pub file: PathBuf,
}

/// How the cropped file is written, shared by `crop` and `serve`.
#[derive(Args, Debug, Clone)]
pub struct CropModeArgs {
    /// Options string to use when cropping
    #[arg(short = 't', long, value_name = "OPTIONS", default_value = DEFAULT_FFMPEG_OPTIONS, allow_hyphen_values = true)]
    pub ffmpeg_options: String,

    /// Crop using metadata instead of re-encoding (h264 and hevc only).
    /// This option has inconsistent results in different players.
    #[arg(short, long)]
    pub metadata: bool,
}

#[derive(Args, Debug)]
pub struct CropArgs {
    /// Video file to remove black borders from
    #[arg(value_name = "FILE", value_parser = parse_existing_file)]
    pub file: PathBuf,

    /// Output file for the cropped version, or "in-place" to replace FILE
    #[arg(value_name = "OUTPUT")]
    pub output: String,

    /// Crop as "width:height:left_offset:top_offset" in px, or "auto"
    #[arg(short, long, value_name = "CROP", default_value = "auto", value_parser = parse_crop)]
    pub crop: CropChoice,

    #[command(flatten)]
    pub mode: CropModeArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path mappings as "request_path:cropper_path,request_path2:cropper_path2"
    #[arg(short, long, value_name = "MAPPINGS", env = "CROPPER_PATHS", default_value = "")]
    pub paths: String,

    /// Port to listen on
    #[arg(long, value_name = "PORT", env = "CROPPER_PORT", default_value_t = DEFAULT_PORT,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// SQLite database holding the queue
    #[arg(long, value_name = "FILE", env = "CROPPER_DATABASE", default_value = DEFAULT_DATABASE_FILE)]
    pub database: PathBuf,

    #[command(flatten)]
    pub mode: CropModeArgs,
}

/// Value of `crop --crop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropChoice {
    Auto,
    Window(CropWindow),
}

// --- Value Parsers ---

fn parse_existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(format!("File \"{value}\" does not exist."));
    }
    std::path::absolute(&path).map_err(|e| format!("Cannot resolve \"{value}\": {e}"))
}

fn parse_directory(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.is_dir() {
        return Err(format!("Directory \"{value}\" does not exist."));
    }
    Ok(path)
}

fn parse_crop(value: &str) -> Result<CropChoice, String> {
    if value == "auto" {
        return Ok(CropChoice::Auto);
    }
    value.parse::<CropWindow>().map(CropChoice::Window).map_err(|_| {
        "Crop must follow the format \"width:height:left_offset:top_offset\" where each value is in px"
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_crop() {
        assert_eq!(parse_crop("auto"), Ok(CropChoice::Auto));
        assert_eq!(
            parse_crop("1920:800:0:140"),
            Ok(CropChoice::Window(CropWindow { width: 1920, height: 800, left: 0, top: 140 }))
        );
        assert!(parse_crop("1920x800").is_err());
        assert!(parse_crop("1920:800:0").is_err());
        assert!(parse_crop("-1:800:0:0").is_err());
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["cropper", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, DEFAULT_PORT);
                assert_eq!(args.database, PathBuf::from(DEFAULT_DATABASE_FILE));
                assert_eq!(args.mode.ffmpeg_options, DEFAULT_FFMPEG_OPTIONS);
                assert!(!args.mode.metadata);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_crop_command() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"video").unwrap();
        let file_arg = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from([
            "cropper", "--json", "crop", file_arg, "in-place", "--crop", "1440:1080:240:0", "-m",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Crop(args) => {
                assert_eq!(args.output, "in-place");
                assert!(matches!(args.crop, CropChoice::Window(w) if w.left == 240));
                assert!(args.mode.metadata);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let err = Cli::try_parse_from(["cropper", "detect", "/surely/not/here.mkv"]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
