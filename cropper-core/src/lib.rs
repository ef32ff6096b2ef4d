//! Core library for detecting and removing black borders from videos using
//! ffmpeg and ffprobe.
//!
//! This crate provides dimension detection, file cropping, and a persistent
//! crop queue fed by media managers such as Sonarr and Radarr.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use cropper_core::config::CoreConfigBuilder;
//! use cropper_core::crop::FileCropper;
//! use cropper_core::external::{CrateFfprobeExecutor, SidecarSpawner};
//! use cropper_core::queue::{EnqueueRequest, QueueEngine};
//! use cropper_core::store::Store;
//! use cropper_core::DimensionDetector;
//!
//! # async fn run() -> cropper_core::CoreResult<()> {
//! let config = CoreConfigBuilder::new().path_mappings("/tv:/mnt/tv").build();
//! let tools = config.tool_paths();
//! let detector = DimensionDetector::new(
//!     SidecarSpawner,
//!     CrateFfprobeExecutor::new(tools.ffprobe()),
//!     tools,
//! );
//! let cropper = FileCropper::new(detector, config.crop_mode.clone());
//!
//! let store = Store::open(&config.database_path)?;
//! let queue = QueueEngine::start(store, config.path_mappings.clone(), cropper).await?;
//! let id = queue.enqueue(EnqueueRequest::new("Pilot", "/tv/show/S01E01.mkv")).await?;
//! println!("queued as #{id}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crop;
pub mod detection;
pub mod error;
pub mod external;
pub mod queue;
pub mod registry;
pub mod store;
pub mod temp_files;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder, CropMode};
pub use crop::{CropExecutor, CropOutput, CropRequest, CropSpec, FileCropper, SharedExecutor};
pub use detection::{CropRectangle, CropWindow, Detect, DimensionDetector};
pub use error::{CoreError, CoreResult, CropError, DetectionError};
pub use queue::{EnqueueRequest, PathMappings, QueueEngine, QueueItem, QueueState};
pub use registry::{Category, CategoryRegistry, CategoryValue, Vocabulary};
pub use store::Store;
