//! Integration tests for the minic binary

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn minic_cmd() -> Command {
    let mut cmd = Command::cargo_bin("minic").unwrap();
    for var in [
        "MINIC_JSON",
        "MINIC_ENRICH",
        "MINIC_UNUSED_WARNINGS",
        "MINIC_MAX_PROBLEMS",
        "MINIC_SOURCE",
        "MINIC_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_source(dir: &TempDir, name: &str, source: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path.to_string_lossy().into_owned()
}

// ── check ─────────────────────────────────────────────────────────────────────

#[test]
fn test_check_clean_file() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "ok.c", "int main() {\n    return 0;\n}\n");

    minic_cmd()
        .args(["check", &file, "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No errors found"));
}

#[test]
fn test_check_reports_errors() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "bad.c",
        "int main() {\n    int arr[3] = {1, 2, 3, 4, 5};\n    return arr[0];\n}\n",
    );

    minic_cmd()
        .args(["check", &file, "--color", "never"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("error[ARRAY_SIZE_OVERFLOW]"))
        .stdout(predicate::str::contains("bad.c:2:"))
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn test_check_enriched_by_default() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "bad.c", "int main() {\n    return missing;\n}\n");

    let output = minic_cmd()
        .args(["check", &file, "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let diagnostics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let message = diagnostics[0]["message"].as_str().unwrap();
    assert!(message.starts_with("Undefined variable 'missing'\n\n"));
    assert!(message.contains("Suggestion:"));
}

#[test]
fn test_check_no_enrich() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "bad.c", "int main() {\n    return missing;\n}\n");

    let output = minic_cmd()
        .args(["check", &file, "--json", "--no-enrich"])
        .output()
        .unwrap();

    let diagnostics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(diagnostics[0]["code"], "UNDEFINED_VARIABLE");
    assert_eq!(diagnostics[0]["message"], "Undefined variable 'missing'");
    assert_eq!(diagnostics[0]["line"], 2);
    assert_eq!(diagnostics[0]["data"]["variableName"], "missing");
}

#[test]
fn test_check_json_from_env() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "ok.c", "int main() {\n    return 0;\n}\n");

    let output = minic_cmd()
        .env("MINIC_JSON", "true")
        .args(["check", &file])
        .output()
        .unwrap();
    assert!(output.status.success());

    let diagnostics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(diagnostics, serde_json::json!([]));
}

#[test]
fn test_check_warnings_do_not_fail() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "warn.c",
        "int main() {\n    int unused = 1;\n    return 0;\n}\n",
    );

    minic_cmd()
        .args(["check", &file, "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning[UNUSED_VARIABLE]"))
        .stdout(predicate::str::contains("No errors found"));
}

#[test]
fn test_check_respects_project_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("minic.toml"),
        "[diagnostics]\nunused_variable_warnings = false\n",
    )
    .unwrap();
    let file = write_source(
        &dir,
        "warn.c",
        "int main() {\n    int unused = 1;\n    return 0;\n}\n",
    );

    minic_cmd()
        .args(["check", &file, "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UNUSED_VARIABLE").not());
}

#[test]
fn test_check_missing_file() {
    minic_cmd()
        .args(["check", "/nonexistent/main.c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read source file"));
}

// ── lsp ───────────────────────────────────────────────────────────────────────

#[test]
fn test_lsp_help() {
    minic_cmd()
        .args(["lsp", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--tcp"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--host"));
}

#[test]
fn test_version() {
    minic_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("minic"));
}

// ── ast ───────────────────────────────────────────────────────────────────────

#[test]
fn test_ast_dump() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "ok.c", "int main() {\n    return 0;\n}\n");

    let output = minic_cmd().args(["ast", &file]).output().unwrap();
    assert!(output.status.success());

    let ast: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ast["ast_version"], 1);
    assert!(ast["items"][0]["Function"].is_object());
}

#[test]
fn test_ast_dump_rejects_parse_errors() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "bad.c", "int main() {\n    return 0\n}\n");

    minic_cmd()
        .args(["ast", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MISSING_SEMICOLON"));
}
