use assert_cmd::Command;
use predicates::str::contains;
use std::error::Error;
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn cropper_cmd() -> Command {
    Command::cargo_bin("cropper").expect("Failed to find cropper binary")
}

#[test]
fn test_help_lists_commands() {
    cropper_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("detect"))
        .stdout(contains("crop"))
        .stdout(contains("serve"));
}

#[test]
fn test_detect_non_existent_file() {
    cropper_cmd()
        .args(["detect", "surely/this/does/not/exist/input.mkv"])
        .assert()
        .failure()
        .stderr(contains("does not exist"));
}

#[test]
fn test_crop_rejects_malformed_crop() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("movie.mkv");
    std::fs::write(&input, "dummy content")?;

    cropper_cmd()
        .arg("crop")
        .arg(&input)
        .arg("in-place")
        .args(["--crop", "1920x800"])
        .assert()
        .failure()
        .stderr(contains("width:height:left_offset:top_offset"));
    Ok(())
}

#[test]
fn test_ffmpeg_root_must_be_a_directory() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("movie.mkv");
    std::fs::write(&input, "dummy content")?;

    cropper_cmd()
        .arg("--ffmpeg-root")
        .arg(dir.path().join("missing"))
        .arg("detect")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("does not exist"));
    Ok(())
}

#[test]
fn test_detect_reports_missing_binaries() -> Result<(), Box<dyn Error>> {
    let tools = tempdir()?;
    let media = tempdir()?;
    let input = media.path().join("movie.mkv");
    std::fs::write(&input, "dummy content")?;

    cropper_cmd()
        .arg("--ffmpeg-root")
        .arg(tools.path())
        .arg("detect")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains(
            "Unable to find \"ffmpeg\" and \"ffprobe\" binaries. Did you try adding --ffmpeg-root?",
        ));
    Ok(())
}

#[test]
fn test_serve_reports_missing_binaries_before_listening() -> Result<(), Box<dyn Error>> {
    let tools = tempdir()?;
    let data = tempdir()?;

    cropper_cmd()
        .arg("--ffmpeg-root")
        .arg(tools.path())
        .arg("serve")
        .env("CROPPER_DATABASE", data.path().join("cropper.db"))
        .env("CROPPER_PORT", "4299")
        .assert()
        .failure()
        .stderr(contains("Unable to find"));
    Ok(())
}

#[test]
fn test_serve_rejects_port_zero() {
    cropper_cmd()
        .arg("serve")
        .env("CROPPER_PORT", "0")
        .assert()
        .failure();
}
