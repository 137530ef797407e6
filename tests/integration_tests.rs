//! Integration tests for the installkit CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create an installkit Command isolated from the caller's environment
fn installkit(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("installkit");
    cmd.current_dir(dir.path())
        .env_remove("INSTALLKIT_AUDIT_LOG")
        .env_remove("INSTALLKIT_WORKERS")
        .env_remove("RUST_LOG");
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn write_feed(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("feed.json");
    fs::write(&path, json).unwrap();
    path
}

const JQ_FEED: &str = r#"[
  {"title": "Install jq", "content": "Install jq using brew install jq", "url": null}
]"#;

fn audit_line(timestamp: &str, package: &str, success: bool) -> String {
    format!(
        r#"{{"timestamp":"{}","batch_id":"b1","item_id":"i-{}","package_name":"{}","package_manager":"brew","command":"brew install {}","success":{},"duration_seconds":1.5,"installed_version":"1.7.1","error":null}}"#,
        timestamp, package, package, package, success
    )
}

fn write_audit_log(dir: &Path, lines: &[String]) {
    let log_dir = dir.join(".installkit/logs");
    fs::create_dir_all(&log_dir).unwrap();
    fs::write(log_dir.join("installations.log"), lines.join("\n") + "\n").unwrap();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let dir = create_temp_project();
        installkit(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("validate"));
    }

    #[test]
    fn test_version() {
        let dir = create_temp_project();
        installkit(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        let dir = create_temp_project();
        installkit(&dir).arg("frobnicate").assert().failure();
    }
}

// =============================================================================
// Validate
// =============================================================================

mod validate {
    use super::*;

    #[test]
    fn test_scoped_npm_install_is_allowed() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["validate", "npm install -g @scope/pkg"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Allowed"));
    }

    #[test]
    fn test_root_delete_is_rejected() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["validate", "sudo rm -rf /"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("dangerous pattern"));
    }

    #[test]
    fn test_disallowed_verb_is_rejected() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["validate", "npm publish"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Action 'publish' not allowed for npm"));
    }

    #[test]
    fn test_unquoted_command_is_a_usage_error() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["validate", "npm", "install", "jq"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unexpected argument"));
    }

    #[test]
    fn test_quotes_reach_validator_intact() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["validate", "pip install 'httpie"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unterminated ' quote"));
        installkit(&dir)
            .args(["validate", "pip install 'httpie[socks]'"])
            .assert()
            .success();
    }

    #[test]
    fn test_unknown_manager_is_rejected() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["validate", "apt-get install jq"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not in approved list"));
    }
}

// =============================================================================
// Detect
// =============================================================================

mod detect {
    use super::*;

    #[test]
    fn test_detect_json_finds_brew_item() {
        let dir = create_temp_project();
        let feed = write_feed(dir.path(), JQ_FEED);

        let output = installkit(&dir)
            .args(["detect", "--json", "--input"])
            .arg(&feed)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let items: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let items = items.as_array().unwrap();
        let jq = items
            .iter()
            .find(|i| i["package_manager"] == "brew")
            .expect("brew item");
        assert_eq!(jq["name"], "jq");
        assert_eq!(jq["install_command"], "brew install jq");
        assert_eq!(jq["id"].as_str().unwrap().len(), 12);
    }

    #[test]
    fn test_detect_respects_catalog_setting() {
        let dir = create_temp_project();
        let feed = write_feed(dir.path(), JQ_FEED);
        fs::create_dir_all(dir.path().join(".installkit")).unwrap();
        fs::write(
            dir.path().join(".installkit/installkit.toml"),
            "[detection]\ninclude_catalog = false\n",
        )
        .unwrap();

        let output = installkit(&dir)
            .args(["detect", "--json", "--input"])
            .arg(&feed)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let items: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(items.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_detect_skips_malformed_records() {
        let dir = create_temp_project();
        let feed = write_feed(
            dir.path(),
            r#"[
                {"title": "bad", "content": null},
                {"title": "Shell tools", "content": "Install it with brew install jq today."}
            ]"#,
        );

        let output = installkit(&dir)
            .args(["detect", "--json", "--input"])
            .arg(&feed)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let items: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert!(
            items
                .as_array()
                .unwrap()
                .iter()
                .any(|i| i["name"] == "jq" && i["package_manager"] == "brew")
        );
    }

    #[test]
    fn test_detect_table_output() {
        let dir = create_temp_project();
        let feed = write_feed(dir.path(), JQ_FEED);

        installkit(&dir)
            .args(["detect", "--input"])
            .arg(&feed)
            .assert()
            .success()
            .stdout(predicate::str::contains("brew install jq"))
            .stdout(predicate::str::contains("items detected"));
    }

    #[test]
    fn test_detect_missing_input_fails() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["detect", "--input", "nope.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read input file"));
    }

    #[test]
    fn test_detect_malformed_json_fails() {
        let dir = create_temp_project();
        let feed = write_feed(dir.path(), "{not json");
        installkit(&dir)
            .args(["detect", "--input"])
            .arg(&feed)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse feed updates"));
    }
}

// =============================================================================
// Install (selection only; no package manager is invoked)
// =============================================================================

mod install {
    use super::*;

    #[test]
    fn test_install_requires_selection() {
        let dir = create_temp_project();
        let feed = write_feed(dir.path(), JQ_FEED);

        installkit(&dir)
            .args(["install", "--input"])
            .arg(&feed)
            .assert()
            .failure()
            .stdout(predicate::str::contains("brew install jq"))
            .stderr(predicate::str::contains("--item"));
    }

    #[test]
    fn test_install_unknown_item_fails() {
        let dir = create_temp_project();
        let feed = write_feed(dir.path(), JQ_FEED);

        installkit(&dir)
            .args(["install", "--item", "000000000000", "--input"])
            .arg(&feed)
            .assert()
            .failure()
            .stderr(predicate::str::contains("No detected item with id '000000000000'"));
    }

    #[test]
    fn test_install_all_conflicts_with_item() {
        let dir = create_temp_project();
        let feed = write_feed(dir.path(), JQ_FEED);

        installkit(&dir)
            .args(["install", "--all", "--item", "abc", "--input"])
            .arg(&feed)
            .assert()
            .failure();
    }
}

// =============================================================================
// Audit history and prune
// =============================================================================

mod audit {
    use super::*;

    #[test]
    fn test_history_empty() {
        let dir = create_temp_project();
        installkit(&dir)
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No installations recorded yet"));
    }

    #[test]
    fn test_history_skips_malformed_lines() {
        let dir = create_temp_project();
        write_audit_log(
            dir.path(),
            &[
                audit_line("2024-01-01T00:00:00Z", "jq", true),
                "{\"truncated".to_string(),
                audit_line("2024-01-02T00:00:00Z", "wget", false),
            ],
        );

        let output = installkit(&dir)
            .args(["history", "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let entries: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["package_name"], "wget");
        assert_eq!(entries[1]["package_name"], "jq");
    }

    #[test]
    fn test_history_limit() {
        let dir = create_temp_project();
        write_audit_log(
            dir.path(),
            &[
                audit_line("2024-01-01T00:00:00Z", "jq", true),
                audit_line("2024-01-02T00:00:00Z", "wget", true),
            ],
        );

        installkit(&dir)
            .args(["history", "--limit", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("wget"))
            .stdout(predicate::str::contains("jq").not());
    }

    #[test]
    fn test_prune_removes_old_entries() {
        let dir = create_temp_project();
        let recent = chrono::Utc::now().to_rfc3339();
        write_audit_log(
            dir.path(),
            &[
                audit_line("2020-01-01T00:00:00Z", "old", true),
                audit_line(&recent, "new", true),
            ],
        );

        installkit(&dir)
            .args(["prune", "--days", "30"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1 audit entries"));

        let log = fs::read_to_string(dir.path().join(".installkit/logs/installations.log")).unwrap();
        assert!(!log.contains("\"old\""));
        assert!(log.contains("\"new\""));
    }

    #[test]
    fn test_prune_without_log_is_noop() {
        let dir = create_temp_project();
        installkit(&dir)
            .arg("prune")
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 0 audit entries older than 30 days"));
    }
}

// =============================================================================
// Config
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created installkit.toml"));

        let content = fs::read_to_string(dir.path().join(".installkit/installkit.toml")).unwrap();
        assert!(content.contains("[engine]"));
        assert!(content.contains("workers = 3"));
    }

    #[test]
    fn test_config_init_is_idempotent() {
        let dir = create_temp_project();
        installkit(&dir).args(["config", "init"]).assert().success();
        installkit(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();
        installkit(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("install_timeout_secs = 300"))
            .stdout(predicate::str::contains("retention_days = 30"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".installkit")).unwrap();
        fs::write(
            dir.path().join(".installkit/installkit.toml"),
            "[engine]\nworkers = 0\n",
        )
        .unwrap();

        installkit(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("engine.workers is 0"));
    }

    #[test]
    fn test_workers_env_override_is_shown() {
        let dir = create_temp_project();
        installkit(&dir)
            .env("INSTALLKIT_WORKERS", "7")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("workers = 7"));
    }
}
