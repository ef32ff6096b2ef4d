// cropper-cli/src/main.rs
//
// Entry point for the `cropper` binary.
//
// Parses arguments, sets up logging, dispatches to the selected command and
// turns a failed command into a message on stderr with exit code 1.

use clap::Parser;
use cropper_cli::error::user_message;
use cropper_cli::{Cli, Commands, logging, run_crop, run_detect, run_serve};
use std::process;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Detect(args) => run_detect(args, cli.ffmpeg_root, cli.json),
        Commands::Crop(args) => run_crop(args, cli.ffmpeg_root, cli.json),
        Commands::Serve(args) => run_serve(args, cli.ffmpeg_root),
    };

    if let Err(e) = result {
        log::debug!("Command failed: {:?}", e);
        eprintln!("Error: {}", user_message(&e));
        process::exit(1);
    }
}
