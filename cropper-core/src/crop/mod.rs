// ============================================================================
// cropper-core/src/crop/mod.rs
// ============================================================================
//
// CROP EXECUTION: Writing a cropped copy of a video
//
// KEY COMPONENTS:
// - CropExecutor: the seam the queue consumer calls for each job
// - FileCropper: detection followed by an ffmpeg crop, in metadata or
//   re-encode mode, to a separate file or in place
// - CropRequest: explicit or automatic crop, output destination

use crate::config::CropMode;
use crate::detection::{CropRectangle, CropWindow, DimensionDetector};
use crate::error::{CoreResult, CropError};
use crate::external::ffmpeg_executor::run_to_completion;
use crate::external::{FfmpegSpawner, FfprobeExecutor, MediaInfo};
use crate::temp_files;

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Crops one file in place. Called by the queue consumer on a blocking thread.
pub trait CropExecutor: Send + Sync + 'static {
    fn crop(&self, path: &Path) -> CoreResult<()>;
}

impl<T: CropExecutor + ?Sized> CropExecutor for Arc<T> {
    fn crop(&self, path: &Path) -> CoreResult<()> {
        (**self).crop(path)
    }
}

/// Executor shared between the queue engine and the server.
pub type SharedExecutor = Arc<dyn CropExecutor>;

/// Adapts a closure into a [`CropExecutor`].
pub struct FnExecutor<F>(pub F);

impl<F> FnExecutor<F>
where
    F: Fn(&Path) -> CoreResult<()> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> CropExecutor for FnExecutor<F>
where
    F: Fn(&Path) -> CoreResult<()> + Send + Sync + 'static,
{
    fn crop(&self, path: &Path) -> CoreResult<()> {
        (self.0)(path)
    }
}

/// Which rectangle to crop to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropSpec {
    /// Use the detected rectangle.
    #[default]
    Auto,
    /// Use the given rectangle; detection still supplies the frame size.
    Explicit(CropWindow),
}

/// Where the cropped video goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CropOutput {
    /// Replace the input file.
    #[default]
    InPlace,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CropRequest {
    pub crop: CropSpec,
    pub output: CropOutput,
}

/// Detects and crops files with ffmpeg.
pub struct FileCropper<S: FfmpegSpawner, P: FfprobeExecutor> {
    detector: DimensionDetector<S, P>,
    mode: CropMode,
}

impl<S: FfmpegSpawner, P: FfprobeExecutor> FileCropper<S, P> {
    pub fn new(detector: DimensionDetector<S, P>, mode: CropMode) -> Self {
        Self { detector, mode }
    }

    pub fn detector(&self) -> &DimensionDetector<S, P> {
        &self.detector
    }

    pub fn mode(&self) -> &CropMode {
        &self.mode
    }

    /// Detects `input`, then writes the cropped video as `request` asks.
    ///
    /// Returns the detected rectangle.
    pub fn crop_file(&self, input: &Path, request: &CropRequest) -> CoreResult<CropRectangle> {
        let (detected, media) = self.detector.analyze(input)?;
        let window = match request.crop {
            CropSpec::Auto => detected.window(),
            CropSpec::Explicit(window) => window,
        };

        if window.is_full_frame(detected.file_x, detected.file_y) {
            return Err(CropError::AlreadyCropped.into());
        }
        if !window.fits(detected.file_x, detected.file_y) {
            return Err(CropError::OutOfBounds(window.to_string(), detected.file_x, detected.file_y).into());
        }

        match &request.output {
            CropOutput::File(output) => {
                self.write_crop(input, output, window, &media)?;
            }
            CropOutput::InPlace => {
                let temp = temp_files::create_sibling_temp_file(input)?;
                self.write_crop(input, temp.path(), window, &media)?;
                temp.persist(input).map_err(|e| e.error)?;
                log::debug!("Replaced {} with its cropped version", input.display());
            }
        }

        log::info!("Cropped {} to {}", input.display(), window);
        Ok(detected)
    }

    fn write_crop(
        &self,
        input: &Path,
        output: &Path,
        window: CropWindow,
        media: &MediaInfo,
    ) -> CoreResult<()> {
        let mut cmd = self.detector.tools().ffmpeg_command();
        cmd.arg("-y");
        cmd.input(input.to_string_lossy().into_owned());

        match &self.mode {
            CropMode::Metadata => {
                let codec = media.require_video_codec(input)?;
                if codec != "h264" && codec != "hevc" {
                    return Err(CropError::UnsupportedCodec(codec.to_string()).into());
                }
                let frame = media.dimensions;
                cmd.args(["-map", "0", "-codec", "copy", "-bsf:v"]);
                cmd.arg(metadata_filter(codec, window, frame.width, frame.height));
            }
            CropMode::Reencode { ffmpeg_options } => {
                cmd.args(["-vf", window.to_filter().as_str()]);
                cmd.args(ffmpeg_options.split_whitespace());
            }
        }

        cmd.output(output.to_string_lossy().into_owned());
        run_to_completion(self.detector.spawner(), cmd, "crop")
    }
}

/// `<codec>_metadata` bitstream filter setting the four crop edges.
fn metadata_filter(codec: &str, window: CropWindow, file_width: u32, file_height: u32) -> String {
    let right = file_width - window.width - window.left;
    let bottom = file_height - window.height - window.top;
    format!(
        "{codec}_metadata=crop_left={}:crop_right={}:crop_top={}:crop_bottom={}",
        window.left, right, window.top, bottom
    )
}

impl<S, P> CropExecutor for FileCropper<S, P>
where
    S: FfmpegSpawner + 'static,
    P: FfprobeExecutor + 'static,
{
    fn crop(&self, path: &Path) -> CoreResult<()> {
        self.crop_file(path, &CropRequest::default()).map(|_| ())
    }
}
