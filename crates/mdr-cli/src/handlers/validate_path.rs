//! Path validation command handler

use super::utils::load_snapshot;
use crate::cli::ValidatePathArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use mdr_core::{catalog, EntityIdPath, GraphStore};
use serde_json::json;

/// Handle the validate-path command
pub async fn handle_validate_path(
    args: ValidatePathArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let snapshot_path = config.snapshot_path(args.snapshot.snapshot.as_deref())?;
    let snapshot = load_snapshot(&snapshot_path).await?;
    let store = GraphStore::new(&snapshot);
    let entity = store.entity(args.entity)?;

    match catalog::validate_path(&store, &config.resolver, args.entity, &args.path) {
        Ok(path) => {
            let form = match &path {
                EntityIdPath::Qualified(_) => "qualified",
                EntityIdPath::IdChain(_) => "idChain",
            };
            if output.is_human() {
                output.success(&format!(
                    "✓ '{}' locates entity {} ({})",
                    path, entity.id, entity.unique_name
                ))
            } else {
                output.data(&json!({
                    "valid": true,
                    "entityId": entity.id,
                    "path": path.to_string(),
                    "form": form,
                }))
            }
        }
        Err(mdr_core::Error::InvalidPath {
            path,
            reason,
            message,
            entity_id,
        }) => {
            if !output.is_human() {
                output.data(&json!({
                    "valid": false,
                    "entityId": args.entity,
                    "path": path,
                    "reason": reason,
                    "message": message,
                }))?;
            }
            Err(mdr_core::Error::InvalidPath {
                path,
                reason,
                message,
                entity_id,
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}
