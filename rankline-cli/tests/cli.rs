use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "rankline-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn rankline(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rankline"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run cli")
}

fn json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json report")
}

#[test]
fn cli_win_persists_between_runs() {
    let dir = temp_path("win");
    assert!(rankline(&dir, &["win"]).status.success());
    let report = json(&rankline(&dir, &["--json", "status"]));
    assert_eq!(report["status"]["session_wins"], 1);
    assert_eq!(report["status"]["rank"]["tier"], "Bronze");
    assert_eq!(report["status"]["rank"]["pips"], 2);
    assert!(dir.join("tracker_state.json").exists());
    std::fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn cli_reports_promotion_milestone() {
    let dir = temp_path("promote");
    assert!(rankline(&dir, &["set", "gold", "1", "5"]).status.success());
    let output = rankline(&dir, &["win"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Promoted from Gold to Platinum"), "{stdout}");
    assert!(stdout.contains("Platinum 4 (1/6)"), "{stdout}");
    std::fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn cli_no_save_leaves_no_snapshot() {
    let dir = temp_path("no-save");
    let report = json(&rankline(&dir, &["--no-save", "--json", "loss"]));
    assert_eq!(report["status"]["session_losses"], 1);
    assert!(!dir.exists());
}

#[test]
fn cli_mythic_requires_mythic_rank() {
    let dir = temp_path("mythic");
    let output = rankline(&dir, &["mythic", "--rank", "250"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not Mythic"));

    assert!(rankline(&dir, &["set", "mythic"]).status.success());
    let report = json(&rankline(&dir, &["--json", "mythic", "--rank", "250"]));
    assert_eq!(report["status"]["rank_label"], "Mythic #250");
    std::fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn cli_history_lists_archived_sessions() {
    let dir = temp_path("history");
    for action in ["win", "loss", "new-session"] {
        assert!(rankline(&dir, &[action]).status.success());
    }
    let report = json(&rankline(&dir, &["--json", "history"]));
    let history = report["history"].as_array().expect("history array");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["wins"], 1);
    assert_eq!(history[0]["losses"], 1);
    assert_eq!(report["status"]["session_wins"], 0);
    std::fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn cli_format_switch_keeps_ranks_apart() {
    let dir = temp_path("format");
    assert!(rankline(&dir, &["format", "limited"]).status.success());
    let report = json(&rankline(&dir, &["--json", "win"]));
    assert_eq!(report["status"]["format"], "Limited");
    assert_eq!(report["status"]["rank"]["pips"], 2);
    let report = json(&rankline(&dir, &["--json", "format", "bo3"]));
    assert_eq!(report["status"]["rank"]["pips"], 0);
    assert_eq!(report["status"]["rank"]["format_type"], "Constructed BO3");
    std::fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn cli_rejects_unknown_tier() {
    let dir = temp_path("bad-tier");
    let output = rankline(&dir, &["set", "adamant"]);
    assert!(!output.status.success());
}
