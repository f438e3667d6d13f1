use assert_cmd::Command;
use tempfile::TempDir;

fn drillpace(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("drillpace").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("DRILLPACE_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    let output = drillpace(&home).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for sub in ["rehearse", "history", "options"] {
        assert!(stdout.contains(sub), "missing {sub} in {stdout}");
    }
}

#[test]
fn options_prints_defaults_when_nothing_is_stored() {
    let home = TempDir::new().unwrap();
    let output = drillpace(&home).arg("options").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"time_limit_minutes\": 10"));
    assert!(stdout.contains("\"target_percent\": 100"));
}

#[test]
fn history_is_empty_on_a_fresh_home() {
    let home = TempDir::new().unwrap();
    let output = drillpace(&home).arg("history").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no runs recorded"));
}

#[test]
fn rehearse_rejects_a_fractional_timer() {
    let home = TempDir::new().unwrap();
    drillpace(&home)
        .args(["rehearse", "--timer", "2.5m"])
        .assert()
        .failure();
}
