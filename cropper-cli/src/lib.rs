// cropper-cli/src/lib.rs
//
// Library portion of the Cropper CLI application.
// Contains argument definitions, command logic and the HTTP server.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod server;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands};
pub use commands::crop::run_crop;
pub use commands::detect::run_detect;
pub use commands::serve::run_serve;
pub use server::{AppState, build_router};
