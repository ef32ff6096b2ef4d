// ============================================================================
// cropper-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Provides a fluent API for creating CoreConfig instances. Every field has a
// default, so callers only set what the command line overrides.

use std::path::PathBuf;

use super::{CoreConfig, CropMode};
use crate::queue::PathMappings;

/// Builder for creating CoreConfig instances.
#[derive(Debug, Clone)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
    metadata: bool,
    ffmpeg_options: Option<String>,
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CoreConfig::default(),
            metadata: false,
            ffmpeg_options: None,
        }
    }

    /// Sets the directory holding the ffmpeg and ffprobe binaries.
    pub fn ffmpeg_root(mut self, root: Option<PathBuf>) -> Self {
        self.config.ffmpeg_root = root;
        self
    }

    /// Crop with the metadata bitstream filter instead of re-encoding.
    pub fn metadata(mut self, enable: bool) -> Self {
        self.metadata = enable;
        self
    }

    /// Sets the ffmpeg option string used when re-encoding.
    pub fn ffmpeg_options(mut self, options: impl Into<String>) -> Self {
        self.ffmpeg_options = Some(options.into());
        self
    }

    pub fn snap_to_aspect(mut self, enable: bool) -> Self {
        self.config.snap_to_aspect = enable;
        self
    }

    /// Sets path mappings from the `from:to,from2:to2` form.
    pub fn path_mappings(mut self, spec: &str) -> Self {
        self.config.path_mappings = PathMappings::parse(spec);
        self
    }

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.database_path = path;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Builds the CoreConfig. `metadata(true)` wins over any ffmpeg options.
    pub fn build(self) -> CoreConfig {
        let mut config = self.config;
        config.crop_mode = if self.metadata {
            CropMode::Metadata
        } else {
            match self.ffmpeg_options {
                Some(ffmpeg_options) => CropMode::Reencode { ffmpeg_options },
                None => CropMode::default(),
            }
        };
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FFMPEG_OPTIONS;

    #[test]
    fn test_builder_defaults_to_reencode() {
        let config = CoreConfigBuilder::new().build();
        assert_eq!(
            config.crop_mode,
            CropMode::Reencode { ffmpeg_options: DEFAULT_FFMPEG_OPTIONS.to_string() }
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = CoreConfigBuilder::new()
            .ffmpeg_root(Some(PathBuf::from("/opt/ffmpeg/bin")))
            .ffmpeg_options("-c:v libx265 -crf 20")
            .snap_to_aspect(false)
            .database_path(PathBuf::from("/var/lib/cropper/queue.db"))
            .port(9000)
            .build();

        assert_eq!(config.ffmpeg_root, Some(PathBuf::from("/opt/ffmpeg/bin")));
        assert_eq!(
            config.crop_mode,
            CropMode::Reencode { ffmpeg_options: "-c:v libx265 -crf 20".to_string() }
        );
        assert!(!config.snap_to_aspect);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/cropper/queue.db"));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_metadata_wins_over_options() {
        let config = CoreConfigBuilder::new()
            .ffmpeg_options("-c:v libx264")
            .metadata(true)
            .build();
        assert_eq!(config.crop_mode, CropMode::Metadata);
    }
}
