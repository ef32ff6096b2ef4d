// ============================================================================
// cropper-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger initialisation for the cropper binary
//
// The library logs through the `log` facade; this module installs the
// env_logger backend once at startup.
//
// USAGE:
// - default: info
// - -v / --verbose: debug
// - RUST_LOG overrides both (e.g. RUST_LOG=cropper_core=trace)

use log::LevelFilter;
use std::io::Write;

/// Level used when RUST_LOG is not set.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose { LevelFilter::Debug } else { LevelFilter::Info }
}

/// Installs the global logger. Later calls are ignored.
pub fn init(verbose: bool) {
    let level = default_level(verbose);
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        log::debug!("Logger initialized with level: {}", level);
    }
}
