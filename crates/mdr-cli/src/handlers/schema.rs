//! Schema command handler

use super::utils::{load_snapshot, resolve_data_model, write_value};
use crate::cli::SchemaArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use mdr_core::{GraphStore, SchemaCompiler};

/// Handle the schema command
pub async fn handle_schema(args: SchemaArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("schema", &args.data_model);

    let snapshot_path = config.snapshot_path(args.snapshot.snapshot.as_deref())?;
    let snapshot = load_snapshot(&snapshot_path).await?;
    let data_model_id = resolve_data_model(&snapshot, &args.data_model)?;

    let store = GraphStore::new(&snapshot);
    let schema = SchemaCompiler::new(&store, &config.resolver).compile(data_model_id, args.scope.into())?;
    tracing::info!(data_model_id, scope = ?args.scope, "Compiled schema");

    match args.output_file {
        Some(path) => {
            write_value(&path, &schema, config.output.pretty).await?;
            output.success(&format!("✓ Schema saved to {}", path.display()))
        }
        None => output.data(&schema),
    }
}
