//! End-to-end tests of the `euk` binary.
//!
//! Every invocation runs with HOME and the XDG directories pointed at a
//! fresh temp dir, so no real config or session is read or written.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use euk::test_utils::make_test_config_toml;

use common::logger::TestLogger;

const ISOLATED_VARS: [&str; 10] = [
    "EUK_TOKEN",
    "EUK_API_URL",
    "EUK_ENV",
    "EUK_TIMEOUT",
    "EUK_CONFIG",
    "EUK_PRETTY",
    "EUK_LOG",
    "EUK_LOG_FORMAT",
    "EUK_LOG_FILE",
    "RUST_LOG",
];

#[allow(deprecated)]
fn euk(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("euk").unwrap();
    for var in ISOLATED_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("EUK_MIN_INTERVAL_MS", "0")
        .env("NO_COLOR", "1");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    euk(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("kategorije")
                .and(predicate::str::contains("license"))
                .and(predicate::str::contains("print")),
        );
}

#[test]
fn unknown_command_is_rejected() {
    let home = TempDir::new().unwrap();
    euk(&home)
        .arg("notacommand")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized").or(predicate::str::contains("invalid")));
}

#[test]
fn config_json_reports_value_sources() {
    let log = TestLogger::new("config_json_reports_value_sources");
    let home = TempDir::new().unwrap();

    let output = euk(&home)
        .env("EUK_API_URL", "http://backend.test:9000")
        .args(["--timeout", "7", "config", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["schemaVersion"], "euk.v1");
    assert_eq!(json["command"], "config");
    assert_eq!(json["data"]["baseUrl"], "http://backend.test:9000");
    assert_eq!(json["data"]["timeoutSeconds"], 7);
    assert_eq!(json["data"]["sources"]["baseUrl"], "env");
    assert_eq!(json["data"]["sources"]["timeout"], "cli");
    assert_eq!(json["data"]["sources"]["token"], "default");
    log.finish_ok();
}

#[test]
fn config_init_writes_default_file() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("custom.toml");

    euk(&home)
        .env("EUK_CONFIG", &config_path)
        .args(["config", "--init"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&config_path).unwrap();
    assert!(written.contains("[api]"));
    assert!(written.contains("[endpoints]"));
}

#[test]
fn invalid_timeout_env_exits_with_input_error() {
    let home = TempDir::new().unwrap();
    euk(&home)
        .env("EUK_TIMEOUT", "soon")
        .args(["config"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("EUK-C003"));
}

#[test]
fn corrupted_config_file_is_reported() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("broken.toml");
    std::fs::write(&config_path, "[api\nbase_url = ").unwrap();

    euk(&home)
        .env("EUK_CONFIG", &config_path)
        .args(["config"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("EUK-C002"));
}

#[test]
fn records_without_session_exit_with_auth_error() {
    let home = TempDir::new().unwrap();
    let output = euk(&home).args(["kategorije", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8(output.stderr).unwrap();
    euk::assert_contains!(&stderr, "EUK-A001");
    euk::assert_contains!(&stderr, "euk login");
    euk::assert_no_ansi_codes!(&stderr);
}

#[test]
fn json_errors_are_machine_readable() {
    let home = TempDir::new().unwrap();
    let output = euk(&home)
        .args(["--json", "kategorije", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr).unwrap();
    euk::assert_json_valid!(&stderr);
    euk::assert_not_contains!(&stderr, "\u{1b}[");
    let err: Value = serde_json::from_str(&stderr).unwrap();
    assert_eq!(err["error_code"], "EUK-A001");
    assert_eq!(err["recovery"], "relogin");
}

#[test]
fn blank_category_name_exits_with_input_error() {
    let home = TempDir::new().unwrap();
    euk(&home)
        .args(["--token", "abcdefghijklmnop", "kategorije", "create", "   "])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("EUK-V001"));
}

#[tokio::test(flavor = "multi_thread")]
async fn login_persists_token_for_later_commands() {
    let log = TestLogger::new("login_persists_token_for_later_commands");
    log.phase("setup");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .and(header("authorization", "Bearer saved-session-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"kategorijaId": 1, "naziv": "Energetski ugroženi"}])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let config_path = home.path().join("config.toml");
    std::fs::write(&config_path, make_test_config_toml(&server.uri())).unwrap();

    log.phase("login");
    euk(&home)
        .env("EUK_CONFIG", &config_path)
        .args(["login", "saved-session-token"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved-sess"));

    log.phase("list");
    let output = euk(&home)
        .env("EUK_CONFIG", &config_path)
        .args(["--json", "kategorije", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["data"][0]["naziv"], "Energetski ugroženi");

    euk(&home)
        .env("EUK_CONFIG", &config_path)
        .args(["kategorije", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NAZIV").and(predicate::str::contains("Energetski ugroženi")));

    log.phase("logout");
    euk(&home)
        .env("EUK_CONFIG", &config_path)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Odjavljeni ste."));

    euk(&home)
        .env("EUK_CONFIG", &config_path)
        .args(["kategorije", "list"])
        .assert()
        .code(2);
    log.finish_ok();
}

#[test]
fn license_status_fails_open_when_backend_is_down() {
    let home = TempDir::new().unwrap();
    let output = euk(&home)
        .env("EUK_API_URL", "http://127.0.0.1:1")
        .args(["--json", "license", "status"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["data"]["hasValidLicense"], true);
    assert_eq!(json["data"]["daysUntilExpiry"], 365);
}

#[test]
fn print_rejects_invalid_records_before_any_request() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("lica.json");
    std::fs::write(
        &input,
        json!([
            {"redniBroj": "1", "ime": "Marko", "prezime": "Marković", "jmbg": "0101990710123"},
            {"redniBroj": "2", "ime": "Ana", "prezime": "", "jmbg": "1505985715000"}
        ])
        .to_string(),
    )
    .unwrap();

    euk(&home)
        .env("EUK_API_URL", "http://127.0.0.1:1")
        .args(["--token", "abcdefghijklmnop", "print", "--template", "t1", "--kind", "register"])
        .arg("--input")
        .arg(&input)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ugrozenaLica[1].prezime"));
}

#[tokio::test(flavor = "multi_thread")]
async fn print_saves_register_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/spisak/generate-pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"spisak_T2.pdf\"")
                .set_body_bytes(b"%PDF-1.7".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let input = home.path().join("lica.json");
    std::fs::write(
        &input,
        json!({"content": [{"redniBroj": "1", "ime": "Ana", "prezime": "Anić", "jmbg": "1505985715000"}]})
            .to_string(),
    )
    .unwrap();
    let out = home.path().join("out");

    euk(&home)
        .env("EUK_API_URL", server.uri())
        .args(["--token", "abcdefghijklmnop", "print", "--template", "t2", "--kind", "register"])
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(std::fs::read(out.join("spisak_T2.pdf")).unwrap(), b"%PDF-1.7");
}
