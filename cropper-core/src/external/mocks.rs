// cropper-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests and for dependents enabling the "test-mocks" feature.

use super::ffmpeg_executor::command_args;
use super::*;
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::Path;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A cropdetect log line as ffmpeg prints it.
pub fn cropdetect_event(crop: &str) -> FfmpegEvent {
    FfmpegEvent::Log(
        LogLevel::Info,
        format!("[Parsed_cropdetect_0 @ 0x55d5c0] x1:0 x2:1919 y1:0 y2:1079 w:0 h:0 x:0 y:0 pts:0 t:0.000000 crop={crop}"),
    )
}

/// Mock implementation of FfmpegProcess.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    /// Events to emit when handle_events is called.
    pub events_to_emit: Vec<FfmpegEvent>,
    /// Exit status to return when wait is called.
    pub exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for event in self.events_to_emit.drain(..) {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// Represents an expected ffmpeg command call and its mock result.
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub result: CoreResult<MockFfmpegProcess>,
    pub create_dummy_output: bool,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Each expectation matches the first spawned command having an argument that
/// contains `arg_pattern`, and is consumed by that match.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Arc<Mutex<Vec<MockFfmpegExpectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(
        &self,
        arg_pattern: &str,
        result: CoreResult<MockFfmpegProcess>,
        create_dummy_output: bool,
    ) {
        self.expectations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockFfmpegExpectation {
                arg_pattern: arg_pattern.to_string(),
                result,
                create_dummy_output,
            });
    }

    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        create_dummy_output: bool,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: events,
            exit_status: ExitStatus::from_raw(0),
        };
        self.add_expectation(arg_pattern, Ok(process), create_dummy_output);
    }

    /// A successful cropdetect run printing the given `W:H:X:Y` values in order.
    pub fn add_cropdetect_expectation(&self, arg_pattern: &str, crops: &[&str]) {
        let events = crops.iter().map(|crop| cropdetect_event(crop)).collect();
        self.add_success_expectation(arg_pattern, events, false);
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, Err(error), false);
    }

    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: events,
            // Raw wait status: the exit code lives in the second byte.
            exit_status: ExitStatus::from_raw(exit_code << 8),
        };
        self.add_expectation(arg_pattern, Ok(process), false);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn remaining_expectations(&self) -> usize {
        self.expectations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args = command_args(&mut cmd);
        self.received_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(args.clone());

        let expectation = {
            let mut expectations = self.expectations.lock().unwrap_or_else(PoisonError::into_inner);
            let found_index = expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));
            found_index.map(|index| expectations.remove(index))
        };

        let Some(expectation) = expectation else {
            log::error!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
            panic!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
        };
        log::info!(
            "MockFfmpegSpawner: Matched expectation with pattern '{}'",
            expectation.arg_pattern
        );

        let process = expectation.result?;
        if expectation.create_dummy_output {
            if let Some(output_path) = args.last() {
                if let Err(e) = std::fs::write(output_path, b"cropped") {
                    log::error!("MockFfmpegSpawner failed to create dummy output {}: {}", output_path, e);
                }
            }
        }
        Ok(process)
    }
}

/// Mock implementation of FfprobeExecutor returning fixed facts for any path.
///
/// Clones share one probe counter.
#[derive(Debug, Clone)]
pub struct MockFfprobeExecutor {
    info: MediaInfo,
    probes: Arc<AtomicUsize>,
}

impl Default for MockFfprobeExecutor {
    fn default() -> Self {
        Self {
            info: MediaInfo {
                duration: 600.0,
                dimensions: VideoDimensions { width: 1920, height: 1080 },
                video_codec: Some("h264".to_string()),
            },
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockFfprobeExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.info.duration = duration;
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.info.dimensions = VideoDimensions { width, height };
        self
    }

    pub fn with_codec(mut self, codec: &str) -> Self {
        self.info.video_codec = Some(codec.to_string());
        self
    }

    /// Number of `probe` calls made so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn probe(&self, input_path: &Path) -> CoreResult<MediaInfo> {
        log::info!("MockFfprobeExecutor::probe called for: {}", input_path.display());
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.info.clone())
    }
}
