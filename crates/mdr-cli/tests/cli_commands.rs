//! End-to-end tests running the `mdr` binary against snapshot files

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn registry() -> Value {
    json!({
        "dataModels": [
            {"id": 1, "name": "SIS", "version": "1.0", "type": "SourceSchema"},
            {"id": 2, "name": "LIF", "version": "2.0", "type": "BaseLIF"}
        ],
        "entities": [
            {"id": 10, "dataModelId": 1, "uniqueName": "Student", "isRequired": true},
            {"id": 20, "dataModelId": 2, "uniqueName": "Person"}
        ],
        "attributes": [
            {"id": 100, "dataModelId": 1, "uniqueName": "FullName", "dataType": "string", "isRequired": true},
            {"id": 200, "dataModelId": 2, "uniqueName": "Name", "dataType": "string"}
        ],
        "entityAttributeAssociations": [
            {"id": 1, "entityId": 10, "attributeId": 100},
            {"id": 2, "entityId": 20, "attributeId": 200}
        ],
        "transformationGroups": [
            {"id": 1, "sourceDataModelId": 1, "targetDataModelId": 2, "groupVersion": "1.0"}
        ],
        "transformations": [
            {"id": 1, "transformationGroupId": 1, "expression": "Student.FullName"}
        ],
        "transformationAttributes": [
            {"id": 1, "transformationId": 1, "entityId": 10, "attributeId": 100,
             "attributeType": "Source", "entityIdPath": "Student"},
            {"id": 2, "transformationId": 1, "entityId": 20, "attributeId": 200,
             "attributeType": "Target", "entityIdPath": "Person"}
        ]
    })
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(snapshot: &Value) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("registry.json"), snapshot.to_string()).unwrap();
        std::fs::write(dir.path().join("mdr.toml"), "").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_mdr"))
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("MDR_SNAPSHOT")
            .env_remove("MDR_LOG_FILE")
            .env_remove("MDR_LOG_FORMAT")
            .arg("--config")
            .arg(self.path("mdr.toml"))
            .args(args)
            .output()
            .unwrap()
    }
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn snapshot_arg(workspace: &Workspace) -> String {
    workspace.path("registry.json").display().to_string()
}

#[test]
fn test_translate_command() {
    let workspace = Workspace::new(&registry());
    std::fs::write(
        workspace.path("student.yaml"),
        "Student:\n  FullName: Ada Lovelace\n",
    )
    .unwrap();
    let snapshot = snapshot_arg(&workspace);

    let output = workspace.run(&[
        "--output", "json", "translate", "student.yaml",
        "--snapshot", &snapshot, "--from", "SIS", "--to", "2",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output), json!({"Person": {"Name": "Ada Lovelace"}}));
}

#[test]
fn test_translate_saves_document_and_report() {
    let workspace = Workspace::new(&registry());
    std::fs::write(workspace.path("student.json"), r#"{"Student": {"FullName": "Ada"}}"#).unwrap();
    let snapshot = snapshot_arg(&workspace);

    let output = workspace.run(&[
        "--quiet", "translate", "student.json",
        "--snapshot", &snapshot, "--from", "SIS", "--to", "LIF",
        "--save-to", "out/person.json", "--save-report", "report.json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let document: Value =
        serde_json::from_str(&std::fs::read_to_string(workspace.path("out/person.json")).unwrap())
            .unwrap();
    assert_eq!(document, json!({"Person": {"Name": "Ada"}}));

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(workspace.path("report.json")).unwrap())
            .unwrap();
    assert_eq!(report["entries"][0]["outcome"]["status"], "committed");
}

#[test]
fn test_strict_source_validation_fails() {
    let workspace = Workspace::new(&registry());
    std::fs::write(workspace.path("student.json"), r#"{"Student": {}}"#).unwrap();
    let snapshot = snapshot_arg(&workspace);

    let output = workspace.run(&[
        "translate", "student.json", "--snapshot", &snapshot,
        "--from", "SIS", "--to", "LIF", "--source-validation", "strict",
    ]);

    assert_eq!(output.status.code(), Some(20));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Schema validation failed"));
}

#[test]
fn test_schema_command() {
    let workspace = Workspace::new(&registry());
    let snapshot = snapshot_arg(&workspace);

    let output = workspace.run(&["--output", "json", "schema", "LIF", "--snapshot", &snapshot]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let schema = stdout_json(&output);
    assert_eq!(schema["title"], "LIF");
    assert_eq!(
        schema["properties"]["Person"]["properties"]["Name"],
        json!({"type": "string"})
    );
}

#[test]
fn test_unknown_data_model() {
    let workspace = Workspace::new(&registry());
    let snapshot = snapshot_arg(&workspace);

    let output = workspace.run(&["schema", "Nope", "--snapshot", &snapshot]);
    assert_eq!(output.status.code(), Some(7));
}

#[test]
fn test_validate_path_command() {
    let workspace = Workspace::new(&registry());
    let snapshot = snapshot_arg(&workspace);

    let output = workspace.run(&[
        "--output", "json", "validate-path", "--entity", "20", "--snapshot", &snapshot, "Person",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let result = stdout_json(&output);
    assert_eq!(result["valid"], true);
    assert_eq!(result["form"], "qualified");

    let output = workspace.run(&[
        "--output", "json", "validate-path", "--entity", "20", "--snapshot", &snapshot, "--", "-20,200",
    ]);
    assert_eq!(output.status.code(), Some(21));
    let result = stdout_json(&output);
    assert_eq!(result["valid"], false);
    assert_eq!(result["reason"], "malformed");
}

#[test]
fn test_check_command() {
    let workspace = Workspace::new(&registry());
    let snapshot = snapshot_arg(&workspace);

    let output = workspace.run(&["--output", "json", "check", "--snapshot", &snapshot]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output), json!([]));

    let mut broken = registry();
    broken["transformationAttributes"][1]["entityIdPath"] = json!("Course");
    let workspace = Workspace::new(&broken);
    let snapshot = snapshot_arg(&workspace);

    let output = workspace.run(&["--output", "json", "check", "--snapshot", &snapshot]);
    assert_eq!(output.status.code(), Some(8));
    let problems = stdout_json(&output);
    assert_eq!(problems[0]["rule"], "stale-binding");
    assert_eq!(problems[0]["row"], "binding 2 (transformation 1)");

    let output = workspace.run(&["check", "--skip-bindings", "--snapshot", &snapshot]);
    assert!(output.status.success());
}

#[test]
fn test_snapshot_from_config() {
    let workspace = Workspace::new(&registry());
    std::fs::write(workspace.path("mdr.toml"), "snapshot = \"registry.json\"\n").unwrap();

    let output = workspace.run(&["--output", "json", "schema", "1"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["required"], json!(["Student"]));
}

#[test]
fn test_missing_snapshot_shows_help_hint() {
    let workspace = Workspace::new(&registry());

    let output = workspace.run(&["schema", "LIF"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--help"));
}

#[test]
fn test_config_show_and_completions() {
    let workspace = Workspace::new(&registry());

    let output = workspace.run(&["config", "show", "--format", "json"]);
    assert!(output.status.success());
    let config = stdout_json(&output);
    assert_eq!(config["resolver"]["root_entity_name"], "Person");
    assert_eq!(config["translator"]["source_validation"], "warn");

    let output = workspace.run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("mdr"));
}

#[test]
fn test_config_init_writes_project_file() {
    let workspace = Workspace::new(&registry());

    let output = workspace.run(&["config", "init"]);
    assert!(output.status.success());
    let written = std::fs::read_to_string(workspace.path(".mdr.toml")).unwrap();
    assert!(written.contains("root_entity_name = \"Person\""));

    assert!(Path::new(&workspace.path(".mdr.toml")).exists());
}
