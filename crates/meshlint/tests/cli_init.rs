//! Integration tests for the `meshlint init` command.

use assert_cmd::Command;
use assert_cmd::cargo;
use tempfile::TempDir;

use meshlint_types::ConfigFile;

fn meshlint_cmd() -> Command {
    Command::new(cargo::cargo_bin!("meshlint"))
}

#[test]
fn init_creates_full_preset_by_default() {
    let td = TempDir::new().expect("temp");

    meshlint_cmd()
        .current_dir(td.path())
        .arg("init")
        .assert()
        .success();

    let content = std::fs::read_to_string(td.path().join("meshlint.toml")).unwrap();
    assert!(content.contains("(full preset)"));
    assert!(content.contains("[defaults]"));
    let cfg: ConfigFile = toml::from_str(&content).expect("parseable");
    assert_eq!(cfg.defaults.preset.as_deref(), Some("full"));
}

#[test]
fn init_writes_requested_preset_to_custom_path() {
    let td = TempDir::new().expect("temp");

    meshlint_cmd()
        .current_dir(td.path())
        .args(["init", "--preset", "character-modeling", "--output", "conf/meshlint.toml"])
        .assert()
        .success();

    let content = std::fs::read_to_string(td.path().join("conf/meshlint.toml")).unwrap();
    assert!(content.contains("preset = \"character-modeling\""));
}

#[test]
fn init_refuses_overwrite_without_confirmation() {
    let td = TempDir::new().expect("temp");
    let path = td.path().join("meshlint.toml");
    std::fs::write(&path, "# existing\n").unwrap();

    let assert = meshlint_cmd()
        .current_dir(td.path())
        .arg("init")
        .write_stdin("n\n")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Aborted."));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# existing\n");
}

#[test]
fn init_force_overwrites() {
    let td = TempDir::new().expect("temp");
    let path = td.path().join("meshlint.toml");
    std::fs::write(&path, "# existing\n").unwrap();

    meshlint_cmd()
        .current_dir(td.path())
        .args(["init", "--force", "--preset", "vehicles"])
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("(vehicles preset)"));
}

#[test]
fn init_rejects_unknown_preset() {
    let td = TempDir::new().expect("temp");
    meshlint_cmd()
        .current_dir(td.path())
        .args(["init", "--preset", "sculpting"])
        .assert()
        .failure();
    assert!(!td.path().join("meshlint.toml").exists());
}
