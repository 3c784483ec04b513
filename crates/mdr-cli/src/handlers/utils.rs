//! Shared utilities for command handlers

use crate::config::FileFormat;
use crate::error::{Error, Result};
use mdr_core::{RowId, Snapshot};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Read and parse a JSON or YAML file, chosen by extension
pub async fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = tokio::fs::read_to_string(path).await?;

    match FileFormat::from_path(path) {
        FileFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format!("YAML ({})", e),
        }),
        FileFormat::Json => serde_json::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format!("JSON ({})", e),
        }),
        FileFormat::Toml => Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "a .json, .yaml or .yml file".to_string(),
        }),
    }
}

/// Load a registry snapshot
pub async fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let snapshot: Snapshot = read_structured(path).await?;
    debug!(
        path = %path.display(),
        rows = snapshot.row_count(),
        data_models = snapshot.data_models.len(),
        "Loaded snapshot"
    );
    Ok(snapshot)
}

/// Load an input document
pub async fn load_document(path: &Path) -> Result<Value> {
    read_structured(path).await
}

/// Resolve a data model given by id or by name
///
/// Names resolve to the highest active version.
pub fn resolve_data_model(snapshot: &Snapshot, reference: &str) -> Result<RowId> {
    let reference = reference.trim();
    if let Ok(id) = reference.parse::<RowId>() {
        if snapshot.active_data_models().any(|model| model.id == id) {
            return Ok(id);
        }
    }

    snapshot
        .data_model_by_name(reference)
        .map(|model| model.id)
        .ok_or_else(|| Error::DataModelNotFound {
            reference: reference.to_string(),
        })
}

/// Write a value to a file in the format its extension implies
pub async fn write_value<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let content = match FileFormat::from_path(path) {
        FileFormat::Yaml => serde_yaml::to_string(value)?,
        _ if pretty => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, content).await?;
    debug!(path = %path.display(), "Wrote output file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_core::DataModel;
    use serde_json::json;
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        Snapshot::new()
            .with(DataModel::source_schema(1, "SIS", "1.0"))
            .with(DataModel::base(2, "LIF", "1.0"))
            .with(DataModel::base(3, "LIF", "2.0"))
    }

    #[test]
    fn test_resolve_by_id_and_name() {
        let snapshot = snapshot();
        assert_eq!(resolve_data_model(&snapshot, "1").unwrap(), 1);
        assert_eq!(resolve_data_model(&snapshot, "SIS").unwrap(), 1);
        assert_eq!(resolve_data_model(&snapshot, "LIF").unwrap(), 3);
        assert!(matches!(
            resolve_data_model(&snapshot, "42"),
            Err(Error::DataModelNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_snapshot_formats() {
        let dir = TempDir::new().unwrap();

        let json_path = dir.path().join("registry.json");
        std::fs::write(
            &json_path,
            r#"{"dataModels": [{"id": 1, "name": "SIS", "version": "1.0", "type": "SourceSchema"}]}"#,
        )
        .unwrap();
        assert_eq!(load_snapshot(&json_path).await.unwrap().data_models.len(), 1);

        let yaml_path = dir.path().join("registry.yml");
        std::fs::write(
            &yaml_path,
            "dataModels:\n  - id: 2\n    name: LIF\n    version: \"2.0\"\n    type: BaseLIF\n",
        )
        .unwrap();
        let snapshot = load_snapshot(&yaml_path).await.unwrap();
        assert_eq!(snapshot.data_models[0].name, "LIF");

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();
        assert!(matches!(
            load_snapshot(&broken).await,
            Err(Error::InvalidFormat { .. })
        ));

        assert!(matches!(
            load_snapshot(&dir.path().join("missing.json")).await,
            Err(Error::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_value_by_extension() {
        let dir = TempDir::new().unwrap();
        let value = json!({"Person": {"Name": "Ada"}});

        let json_path = dir.path().join("out").join("doc.json");
        write_value(&json_path, &value, false).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&json_path).unwrap(),
            r#"{"Person":{"Name":"Ada"}}"#
        );

        let yaml_path = dir.path().join("doc.yaml");
        write_value(&yaml_path, &value, true).await.unwrap();
        assert_eq!(load_document(&yaml_path).await.unwrap(), value);
    }
}
