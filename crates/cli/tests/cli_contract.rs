// Integration tests for the `repd` stdout/exit-code contract.
//
// stdout is always exactly one JSON value; diagnostics go to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const REPD_CSV: &str = "\
Ref ID,Site Name,Technology Type,Installed Capacity (MWelec),Development Status,Address,Country,Operator (or Applicant)
1,Aberarder Wind Farm,Wind Onshore,50,Operational,,Scotland,
2,Beauly Battery Storage,Battery,49.9,Application Submitted,Beauly,Scotland,Zenobe Energy
3,Beauly Battery Storage Phase 2,Battery,100,Application Submitted,Beauly,Scotland,Zenobe Energy
4,Lowestoft Solar Farm,Solar Photovoltaics,30,Operational,Lowestoft,England,
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("repd.csv"), REPD_CSV).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// `repd` with an isolated settings path and the fixture registry.
    fn repd(&self) -> Command {
        self.repd_with_registry(&self.path("repd.csv"))
    }

    fn repd_with_registry(&self, registry: &Path) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_repd"));
        cmd.env_remove("RUST_LOG")
            .env_remove("REPD_CONFIG")
            .env_remove("REPD_REGISTRY")
            .arg("--config")
            .arg(self.path("settings.toml"))
            .arg("--registry")
            .arg(registry);
        cmd
    }
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\nstdout:\n{stdout}"))
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

// ===========================================================================
// reconcile
// ===========================================================================

#[test]
fn reconcile_single_query() {
    let ws = Workspace::new();
    let output = ws.repd().args(["reconcile", "--query", "Aberarder Wind Farm"]).output().unwrap();
    assert_success(&output);

    let v = stdout_json(&output);
    let top = &v["q0"]["result"][0];
    assert_eq!(top["id"], "repd-1");
    assert_eq!(top["name"], "Aberarder Wind Farm");
    assert_eq!(top["match"], true);
    assert!(v["q0"]["result"].as_array().unwrap().len() <= 3);
}

#[test]
fn reconcile_query_with_property() {
    let ws = Workspace::new();
    let output = ws
        .repd()
        .args(["reconcile", "-q", "Beauly Battery Storage", "-n", "2", "-p", "MW Connected=100", "--compact"])
        .output()
        .unwrap();
    assert_success(&output);

    let v = stdout_json(&output);
    let results = v["q0"]["result"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], "repd-3");
}

#[test]
fn reconcile_batch_file_and_stdin() {
    let ws = Workspace::new();
    let batch = r#"{"q0": {"query": "Aberarder Wind Farm"}, "q1": {"query": "Lowestoft Solar", "limit": 1}}"#;
    let file = ws.write("batch.json", batch);

    let from_file = ws.repd().arg("reconcile").arg("--queries").arg(&file).output().unwrap();
    assert_success(&from_file);
    let v = stdout_json(&from_file);
    assert_eq!(v.as_object().unwrap().len(), 2);
    assert_eq!(v["q1"]["result"].as_array().unwrap().len(), 1);

    let mut child = ws
        .repd()
        .args(["reconcile", "--queries", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(batch.as_bytes()).unwrap();
    let from_stdin = child.wait_with_output().unwrap();
    assert_success(&from_stdin);
    assert_eq!(stdout_json(&from_stdin), v);
}

#[test]
fn reconcile_missing_registry_exits_3() {
    let ws = Workspace::new();
    let output = ws
        .repd_with_registry(&ws.path("absent.db"))
        .args(["reconcile", "--query", "Aberarder"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("registry unavailable"));
}

#[test]
fn reconcile_invalid_request_exits_4() {
    let ws = Workspace::new();
    let file = ws.write("bad.json", r#"{"q0": {"query": "x", "limit": 500}}"#);
    let output = ws.repd().arg("reconcile").arg("--queries").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn query_and_queries_conflict() {
    let ws = Workspace::new();
    let output = ws
        .repd()
        .args(["reconcile", "--query", "x", "--queries", "batch.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn malformed_settings_exit_5() {
    let ws = Workspace::new();
    ws.write("settings.toml", "[matching\n");
    let output = ws.repd().args(["reconcile", "--query", "x"]).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn settings_default_limit_applies() {
    let ws = Workspace::new();
    ws.write("settings.toml", "[matching]\ndefault_limit = 1\n");
    let output = ws.repd().args(["reconcile", "--query", "Beauly"]).output().unwrap();
    assert_success(&output);
    assert_eq!(stdout_json(&output)["q0"]["result"].as_array().unwrap().len(), 1);
}

// ===========================================================================
// manifest / health / validate
// ===========================================================================

#[test]
fn manifest_shape() {
    let ws = Workspace::new();
    let output = ws.repd().arg("manifest").output().unwrap();
    assert_success(&output);

    let v = stdout_json(&output);
    assert_eq!(v["name"], "REPD x NESO TEC Reconciliation");
    assert_eq!(v["defaultTypes"][0]["id"], "/renewable");
}

#[test]
fn health_connected() {
    let ws = Workspace::new();
    let output = ws.repd().arg("health").output().unwrap();
    assert_success(&output);

    let v = stdout_json(&output);
    assert_eq!(v["status"], "ok");
    assert_eq!(v["database"], "connected");
    assert_eq!(v["project_count"], 4);
}

#[test]
fn health_missing_exits_3_with_report() {
    let ws = Workspace::new();
    let output = ws.repd_with_registry(&ws.path("absent.db")).arg("health").output().unwrap();

    assert_eq!(output.status.code(), Some(3));
    let v = stdout_json(&output);
    assert_eq!(v["status"], "db_error");
    assert_eq!(v["database"], "missing");
    assert_eq!(v["project_count"], 0);
}

#[test]
fn validate_reports_queries() {
    let ws = Workspace::new();
    let file = ws.write("batch.json", r#"{"queries": {"a": {"query": " Beauly ", "limit": 2}}}"#);
    let output = ws.repd().arg("validate").arg(&file).output().unwrap();
    assert_success(&output);

    let v = stdout_json(&output);
    assert_eq!(v["a"]["query"], "Beauly");
    assert_eq!(v["a"]["limit"], 2);
}

#[test]
fn validate_rejects_empty_query() {
    let ws = Workspace::new();
    let file = ws.write("batch.json", r#"{"a": {"query": "   "}}"#);
    let output = ws.repd().arg("validate").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
}
