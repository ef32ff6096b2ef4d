// cropper-cli/src/commands/serve.rs
//
// Starts the crop queue and the HTTP event server.

use crate::cli::ServeArgs;
use crate::commands::builder_with_mode;
use crate::error::CliResult;
use crate::server;
use std::path::PathBuf;

pub fn run_serve(args: ServeArgs, ffmpeg_root: Option<PathBuf>) -> CliResult<()> {
    let config = builder_with_mode(ffmpeg_root, &args.mode)
        .path_mappings(&args.paths)
        .database_path(args.database)
        .port(args.port)
        .build();
    config.validate()?;
    log::debug!("Server configuration: {:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::run(config))
}
