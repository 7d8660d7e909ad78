use std::{fs, process::Command};
use tempfile::TempDir;

fn stak_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stak"));
    cmd.env("HOME", home.path()).current_dir(home.path());
    cmd
}

#[test]
fn test_version_flag() {
    let tmp = TempDir::new().unwrap();

    let output = stak_cmd(&tmp).arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("stak v1.0.0 - Your intelligent terminal scratchpad"));
}

#[test]
fn test_create_config_writes_sample() {
    let tmp = TempDir::new().unwrap();

    let output = stak_cmd(&tmp).arg("--create-config").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Sample config created at"));

    let written = fs::read_to_string(tmp.path().join("stak.yaml")).unwrap();
    assert!(written.contains("data_dir"));
    assert!(written.contains("date_format"));
}

#[test]
fn test_show_config_reports_dir_and_search_order() {
    let tmp = TempDir::new().unwrap();
    let notes = tmp.path().join("my-notes");

    let output = stak_cmd(&tmp)
        .args(["--show-config", "--dir"])
        .arg(&notes)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("my-notes"));
    assert!(stdout.contains("Config search order:"));
    assert!(stdout.contains(".stak.yaml"));
}

#[test]
fn test_show_config_marks_existing_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("stak.yaml"), "theme: mono\n").unwrap();

    let output = stak_cmd(&tmp).arg("--show-config").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(exists)"));
    assert!(stdout.contains("mono"));
}

#[test]
fn test_broken_config_exits_with_error() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("broken.yaml");
    fs::write(&config, "data_dir: [unclosed\n").unwrap();

    let output = stak_cmd(&tmp)
        .arg("--config")
        .arg(&config)
        .arg("--show-config")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error loading config"));
}

#[test]
fn test_missing_explicit_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();

    let output = stak_cmd(&tmp)
        .args(["--config", "does-not-exist.yaml", "--show-config"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("notes"));
}
