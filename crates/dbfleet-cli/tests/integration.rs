use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PASSWORD: &str = "s3cr3t-pw";

fn dbfleet(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dbfleet").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

/// Write a config and local secrets file into the temp dir.
fn seed_project(dir: &TempDir) {
    std::fs::write(
        dir.path().join("dbfleet.yaml"),
        r#"
databases:
  - name: orders
    url: jdbc:postgresql://localhost:5432/orders
  - name: billing
    url: jdbc:postgresql://localhost:5432/billing
reference_url: jdbc:postgresql://localhost:5432/base
secrets:
  path: secrets-dev.json
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("secrets-dev.json"),
        format!(
            r#"{{"allDbSecrets": [
                {{"name": "orders", "username": "orders_admin", "password": "{PASSWORD}"}},
                {{"name": "billing", "username": "billing_admin", "password": "{PASSWORD}"}},
                {{"name": "referenceDb", "username": "ref_admin", "password": "{PASSWORD}"}}
            ]}}"#
        ),
    )
    .unwrap();
}

fn activity_log(dir: &TempDir) -> String {
    std::fs::read_to_string(dir.path().join("logs/activity.log")).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Startup validation
// ---------------------------------------------------------------------------

#[test]
fn unknown_command_fails() {
    let dir = TempDir::new().unwrap();
    dbfleet(&dir).arg("frobnicate").assert().failure();
}

#[test]
fn missing_changelog_suffix_fails() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    dbfleet(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("changelog-suffix"));
}

#[test]
fn empty_changelog_suffix_is_config_error() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    dbfleet(&dir)
        .args(["status", "-c", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("changelog suffix"));
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    dbfleet(&dir)
        .args(["status", "-c", "release-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

// ---------------------------------------------------------------------------
// Zero-target runs
// ---------------------------------------------------------------------------

#[test]
fn unmatched_filter_is_logged_noop() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    dbfleet(&dir)
        .args(["status", "-c", "release-1", "-d", "nosuch"])
        .assert()
        .success();
    assert!(activity_log(&dir).contains("no database matched"));
}

#[test]
fn unavailable_secret_store_degrades_to_noop() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    std::fs::remove_file(dir.path().join("secrets-dev.json")).unwrap();

    dbfleet(&dir)
        .args(["status", "-c", "release-1"])
        .assert()
        .success();

    let log = activity_log(&dir);
    assert!(log.contains("secret store unavailable"));
    assert!(log.contains("no database matched"));
}

// ---------------------------------------------------------------------------
// Engine runs (no liquibase on PATH) and log redaction
// ---------------------------------------------------------------------------

#[test]
fn missing_engine_fails_after_target_resolution() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    dbfleet(&dir)
        .args(["status", "-c", "release-1"])
        .env("PATH", "")
        .assert()
        .failure()
        .stderr(predicate::str::contains("liquibase"));
}

#[test]
fn persisted_logs_never_contain_plaintext_credentials() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    dbfleet(&dir)
        .args(["diff", "-c", "release-1"])
        .env("PATH", "")
        .assert()
        .failure();

    let log = activity_log(&dir);
    // Targets were resolved and their command lines logged before the
    // engine lookup failed; credentials must appear only as the marker.
    assert!(log.contains("resolved database 'orders'"));
    assert!(log.contains("[REDACTED]"));
    assert!(!log.contains(PASSWORD));

    let errors =
        std::fs::read_to_string(dir.path().join("logs/error.log")).unwrap_or_default();
    assert!(errors.contains("liquibase"));
    assert!(!errors.contains(PASSWORD));
}
