use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cartoonizer(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cartoonizer").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    cartoonizer(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("video"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn test_config_reflects_file_env_and_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "run_local: true\nresize-dim: 480\ntrim-video-length: 5\n",
    )
    .unwrap();

    cartoonizer(&dir)
        .env("CARTOONIZER_TRIM_LENGTH_SECS", "7")
        .env("CARTOONIZER_API_KEY", "hunter2")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"resize_width\": 480"))
        .stdout(predicate::str::contains("\"trim_length_secs\": 7"))
        .stdout(predicate::str::contains("\"inputs_bucket\": \"processed_videos_cartoonize\""))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_bad_environment_value_is_reported() {
    let dir = TempDir::new().unwrap();
    cartoonizer(&dir)
        .env("CARTOONIZER_RESIZE_WIDTH", "wide")
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CARTOONIZER_RESIZE_WIDTH"));
}

#[test]
fn test_remote_without_endpoints_is_rejected() {
    let dir = TempDir::new().unwrap();
    cartoonizer(&dir)
        .args(["video", "clip.mp4", "--remote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("storage_endpoint"));
}

#[test]
fn test_missing_video_fails_with_generic_message() {
    let dir = TempDir::new().unwrap();
    cartoonizer(&dir)
        .args(["--log-level", "error", "video", "missing.mp4", "--work-dir"])
        .arg(dir.path().join("jobs"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Our server hiccuped while processing your video",
        ));
}
