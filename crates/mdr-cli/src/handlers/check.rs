//! Snapshot check command handler

use super::utils::load_snapshot;
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{OutputWriter, Problem};
use mdr_core::{AccessFilters, GraphStore, SchemaCompiler, TransformationCatalog};
use tracing::debug;

/// Handle the check command
///
/// Reports integrity violations, data models whose schema does not compile
/// and transformation bindings whose paths no longer validate.
pub async fn handle_check(args: CheckArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::new("check");

    let snapshot_path = config.snapshot_path(args.snapshot.snapshot.as_deref())?;
    let snapshot = load_snapshot(&snapshot_path).await?;
    let store = GraphStore::new(&snapshot);

    let mut problems: Vec<Problem> = snapshot.check_integrity().iter().map(Problem::from).collect();

    let compiler = SchemaCompiler::new(&store, &config.resolver);
    let mut data_models = 0;
    for model in snapshot.active_data_models() {
        data_models += 1;
        if let Err(e) = compiler.compile(model.id, AccessFilters::default()) {
            problems.push(Problem {
                rule: "schema-compilation".to_string(),
                row: format!("data model {}", model.id),
                message: e.to_string(),
            });
        }
    }

    if !args.skip_bindings {
        let catalog = TransformationCatalog::from_snapshot(&snapshot);
        problems.extend(
            catalog
                .verify_bindings(&store, &config.resolver)
                .iter()
                .map(Problem::from),
        );
    }

    debug!(
        problems = problems.len(),
        data_models,
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Snapshot checked"
    );

    if problems.is_empty() {
        if output.is_human() {
            return output.success(&format!(
                "✓ Snapshot is consistent: {} rows, {} data models",
                snapshot.row_count(),
                data_models
            ));
        }
        return output.problems(&problems);
    }

    output.problems(&problems)?;
    Err(Error::CheckFailed {
        count: problems.len(),
    })
}
