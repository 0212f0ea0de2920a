//! Integration tests for the idf CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd,
//! against the demo backend with latency disabled.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get an idf command isolated from user config and environment
fn idf(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("idf").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env("IDF_DEMO_LATENCY_MS", "0")
        .env_remove("IDF_BACKEND_URL")
        .env_remove("IDF_WEBHOOK_URL")
        .env_remove("IDF_TIMEOUT_SECS")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to get an idf command in demo mode
fn demo(tmp: &TempDir) -> Command {
    let mut cmd = idf(tmp);
    cmd.arg("--demo");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {:?}", output);
    String::from_utf8_lossy(&output.stdout).to_string()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Idea Factory"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("idf"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("idf"));
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_shows_sample_ideas() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Smart Home Consulting"))
        .stdout(predicate::str::contains("Premium Tech Support Plan"))
        .stdout(predicate::str::contains("VR Equipment Rental"))
        .stdout(predicate::str::contains("3 idea(s)"));
}

#[test]
fn test_unconfigured_backend_falls_back_to_demo() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Smart Home Consulting"))
        .stderr(predicate::str::contains("Demo mode"));
}

#[test]
fn test_placeholder_backend_is_demo() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .env("IDF_BACKEND_URL", "YOUR_GOOGLE_APPS_SCRIPT_WEB_APP_URL_HERE")
        .args(["list", "--count"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_list_json_is_ranked_by_total() {
    let tmp = TempDir::new().unwrap();
    let stdout = stdout_of(demo(&tmp).args(["list", "--format", "json"]));
    let ideas: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ideas = ideas.as_array().unwrap();

    assert_eq!(ideas.len(), 3);
    assert_eq!(ideas[0]["totalScore"], 21);
    assert_eq!(ideas[1]["totalScore"], 21);
    assert_eq!(ideas[2]["service"], "VR Equipment Rental");
    assert_eq!(ideas[2]["classification"], "high");
}

#[test]
fn test_list_sort_name_ascending() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["list", "--sort", "name", "--asc", "--format", "id"])
        .assert()
        .success()
        .stdout("2\n1\n3\n");
}

#[test]
fn test_list_filters() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["list", "--tier", "high", "--format", "id"])
        .assert()
        .success()
        .stdout("3\n");

    demo(&tmp)
        .args(["list", "--status", "approved", "--format", "id"])
        .assert()
        .success()
        .stdout("1\n");

    demo(&tmp)
        .args(["list", "--cluster", "tech-support", "--status", "all", "--format", "id"])
        .assert()
        .success()
        .stdout("2\n");

    demo(&tmp)
        .args(["list", "--search", "vr equip", "--format", "id"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_list_no_match() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["list", "--status", "cancelled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No ideas found."));
}

#[test]
fn test_list_rejects_unknown_sort_key() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["list", "--sort", "popularity"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown sort key"));
}

#[test]
fn test_show_idea() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Premium Tech Support Plan"))
        .stdout(predicate::str::contains("Subscription/Recurring"))
        .stdout(predicate::str::contains("Very High"));
}

#[test]
fn test_show_unknown_idea_fails() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["show", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// ============================================================================
// Mutations
// ============================================================================

#[test]
fn test_set_saves_changes() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["set", "1", "feasibility=2", "status=completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 1 idea(s)"));
}

#[test]
fn test_set_dry_run_shows_overlay() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["set", "3", "revenue=125000", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("125,000"))
        .stdout(predicate::str::contains("Dry run"));
}

#[test]
fn test_set_unknown_field_fails() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["set", "1", "popularity=5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field"));
}

#[test]
fn test_set_invalid_score_fails() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["set", "1", "feasibility=high"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a number"));
}

#[test]
fn test_add_idea() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args([
            "add",
            "--name",
            "Drone Repair",
            "--description",
            "Fix consumer drones",
            "--audience",
            "Hobbyists",
            "--model",
            "one-off",
            "--cluster",
            "sustainability",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Idea added successfully"))
        .stdout(predicate::str::contains("#4"));
}

#[test]
fn test_add_blank_name_fails() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args([
            "add",
            "--name",
            "  ",
            "--description",
            "x",
            "--audience",
            "y",
            "--model",
            "rental",
            "--cluster",
            "Smart Home",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Required field 'name' is missing"));
}

#[test]
fn test_delete_with_yes() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["delete", "2", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Idea deleted"));
}

#[test]
fn test_automate_goes_to_demo_outbox() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["automate", "1", "--message", "ship it"])
        .assert()
        .success()
        .stdout(predicate::str::contains("automation workflow"));
}

// ============================================================================
// Export & Reports
// ============================================================================

#[test]
fn test_export_writes_bom_prefixed_csv() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 idea(s)"));

    let bytes = fs::read(tmp.path().join("ideas_prioritized.csv")).unwrap();
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));

    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("\"ID\";\"Name\";"));
    assert!(text.contains("\"Smart Home Consulting\""));
    assert!(text.contains("\"01/10/2023\""));
    assert_eq!(text.lines().count(), 4);
}

#[test]
fn test_export_to_stdout() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["export", "-o", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"VR Equipment Rental\""));
    assert!(!tmp.path().join("ideas_prioritized.csv").exists());
}

#[test]
fn test_report_clusters() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["report", "clusters"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Cluster Report"))
        .stdout(predicate::str::contains("Flexible Access"))
        .stdout(predicate::str::contains("- **Total Ideas:** 3"));
}

#[test]
fn test_report_ranking_to_file() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .args(["report", "ranking", "-o", "ranking.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let content = fs::read_to_string(tmp.path().join("ranking.md")).unwrap();
    assert!(content.contains("# Idea Ranking"));
    assert!(content.contains("- **Ideas Listed:** 3 of 3"));
}

// ============================================================================
// Interactive Shell
// ============================================================================

#[test]
fn test_shell_buffers_until_save() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .arg("shell")
        .write_stdin("set 3 feasibility=5 \"name=VR Rental Pro\"\npending\nsave\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("VR Rental Pro"))
        .stdout(predicate::str::contains("1 unsaved"))
        .stdout(predicate::str::contains("Saved 1 idea(s)"));
}

#[test]
fn test_shell_quit_with_unsaved_changes_needs_confirmation() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .arg("shell")
        .write_stdin("set 1 alignment=0\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quit anyway?"))
        .stderr(predicate::str::contains("unsaved change(s)"));
}

#[test]
fn test_shell_reports_bad_input_and_continues() {
    let tmp = TempDir::new().unwrap();
    demo(&tmp)
        .arg("shell")
        .write_stdin("frobnicate\nset 1 popularity=3\nshow 2\nexit\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown field"))
        .stdout(predicate::str::contains("Premium Tech Support Plan"));
}

// ============================================================================
// Backend failures
// ============================================================================

#[test]
fn test_unreachable_backend_shows_connectivity_diagnosis() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .env("IDF_TIMEOUT_SECS", "2")
        .args(["--backend-url", "http://127.0.0.1:9/exec", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not connect to the backend"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_keys() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backend_url"))
        .stdout(predicate::str::contains("demo_latency_ms"));
}

#[test]
fn test_config_set_and_show_local() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .args(["config", "set", "timeout_secs", "5"])
        .assert()
        .success();

    assert!(tmp.path().join("idf.yaml").exists());

    idf(&tmp)
        .args(["config", "show", "timeout_secs"])
        .assert()
        .success()
        .stdout("5\n");

    idf(&tmp)
        .args(["config", "unset", "timeout_secs"])
        .assert()
        .success();

    idf(&tmp)
        .args(["config", "show", "timeout_secs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not set"));
}

#[test]
fn test_config_set_rejects_bad_values() {
    let tmp = TempDir::new().unwrap();
    idf(&tmp)
        .args(["config", "set", "timeout_secs", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));

    idf(&tmp)
        .args(["config", "set", "author", "me"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_local_config_selects_demo_latency() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("idf.yaml"), "demo_latency_ms: [0, 0]\n").unwrap();
    idf(&tmp)
        .env_remove("IDF_DEMO_LATENCY_MS")
        .args(["config", "show", "demo_latency_ms"])
        .assert()
        .success()
        .stdout("0,0\n");
}
