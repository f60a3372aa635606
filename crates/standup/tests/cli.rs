//! Behaviour of the `standup` binary's configuration commands.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const BROKEN_TOML: &str = "[storage\nbusy_timeout_ms = ";

const GOOD_TOML: &str = "[directory]\nmin_credential_length = 6\n";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write config file");
    path
}

fn standup(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_standup"))
        .args(args)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env("XDG_DATA_HOME", dir.join("data"))
        .env_remove("RUST_LOG")
        .output()
        .expect("run standup")
}

#[test]
fn validate_file_ignores_broken_active_config() {
    let dir = tempfile::tempdir().expect("temp dir");
    let broken = write(dir.path(), "broken.toml", BROKEN_TOML);
    let good = write(dir.path(), "good.toml", GOOD_TOML);

    let output = standup(
        dir.path(),
        &[
            "-c",
            broken.to_str().expect("utf-8 path"),
            "config",
            "validate",
            "--file",
            good.to_str().expect("utf-8 path"),
        ],
    );

    assert!(
        output.status.success(),
        "expected zero exit (stderr={})",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid."), "got {stdout}");
}

#[test]
fn validate_file_ignores_broken_default_config() {
    let dir = tempfile::tempdir().expect("temp dir");
    let default_dir = dir.path().join("xdg").join("standup");
    std::fs::create_dir_all(&default_dir).expect("create config dir");
    write(&default_dir, "config.toml", BROKEN_TOML);
    let good = write(dir.path(), "good.toml", GOOD_TOML);

    let output = standup(
        dir.path(),
        &[
            "config",
            "validate",
            "--file",
            good.to_str().expect("utf-8 path"),
        ],
    );

    assert!(
        output.status.success(),
        "expected zero exit (stderr={})",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn validate_reports_broken_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let broken = write(dir.path(), "broken.toml", BROKEN_TOML);

    let output = standup(
        dir.path(),
        &[
            "config",
            "validate",
            "--file",
            broken.to_str().expect("utf-8 path"),
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration error"), "got {stderr}");
}

#[test]
fn config_path_does_not_load_the_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let broken = write(dir.path(), "broken.toml", BROKEN_TOML);
    let broken_arg = broken.to_str().expect("utf-8 path");

    let output = standup(dir.path(), &["-c", broken_arg, "config", "path"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), broken_arg);

    let output = standup(dir.path(), &["-c", broken_arg, "config", "show"]);
    assert!(!output.status.success());
}
