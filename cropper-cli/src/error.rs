// ============================================================================
// cropper-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias and user-facing error messages
//
// Commands return `CliResult` and let `main` turn failures into a message on
// stderr and exit code 1.

use cropper_core::{CoreError, CoreResult};

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Printed when ffmpeg or ffprobe cannot be started.
pub const MISSING_BINARIES_MESSAGE: &str =
    "Unable to find \"ffmpeg\" and \"ffprobe\" binaries. Did you try adding --ffmpeg-root?";

/// Message shown to the user for a failed command.
pub fn user_message(error: &CoreError) -> String {
    if error.is_process_not_found() {
        MISSING_BINARIES_MESSAGE.to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropper_core::DetectionError;

    #[test]
    fn test_user_message() {
        let missing = CoreError::ProcessNotFound("ffprobe".to_string());
        assert_eq!(user_message(&missing), MISSING_BINARIES_MESSAGE);

        let detection = CoreError::Detection(DetectionError::NoCropFound);
        assert_eq!(user_message(&detection), "Detection failed: no crop found");
    }
}
