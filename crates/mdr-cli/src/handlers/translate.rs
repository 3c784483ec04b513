//! Translate command handler

use super::utils::{load_document, load_snapshot, resolve_data_model, write_value};
use crate::cli::TranslateArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use mdr_core::{GraphStore, TransformationCatalog, Translator};
use tracing::{info, warn};

/// Handle the translate command
pub async fn handle_translate(
    args: TranslateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let snapshot_path = config.snapshot_path(args.snapshot.snapshot.as_deref())?;
    let snapshot = load_snapshot(&snapshot_path).await?;
    let source = resolve_data_model(&snapshot, &args.from)?;
    let target = resolve_data_model(&snapshot, &args.to)?;
    let document = load_document(&args.document).await?;

    let _timer = Timer::with_details("translate", &format!("{} -> {}", source, target));

    let mut translator_config = config.translator.clone();
    if let Some(version) = args.group_version {
        translator_config.group_version = Some(version);
    }
    if let Some(mode) = args.source_validation {
        translator_config.source_validation = mode.into();
    }

    let store = GraphStore::new(&snapshot);
    let catalog = TransformationCatalog::from_snapshot(&snapshot);
    let outcome = Translator::new(&store, &catalog, &config.resolver)
        .with_config(translator_config)
        .translate(source, target, &document)?;

    let summary = outcome.report.summary();
    info!(
        source_data_model_id = source,
        target_data_model_id = target,
        committed = summary.committed,
        skipped = summary.skipped,
        rolled_back = summary.rolled_back,
        "Translation finished"
    );
    if summary.skipped + summary.rolled_back > 0 && !args.show_report {
        warn!(
            skipped = summary.skipped,
            rolled_back = summary.rolled_back,
            "Some mappings did not contribute; rerun with --show-report for details"
        );
    }

    if let Some(path) = &args.save_report {
        write_value(path, &outcome.report, true).await?;
        output.info(&format!("Report saved to {}", path.display()))?;
    }

    match &args.output_file {
        Some(path) => {
            write_value(path, &outcome.document, config.output.pretty).await?;
            output.success(&format!("✓ Translated document saved to {}", path.display()))?;
            if args.show_report {
                output.section("Mapping Report")?;
                output.report(&outcome.report)?;
            }
            Ok(())
        }
        None if args.show_report => output.translation(&outcome),
        None => output.data(&outcome.document),
    }
}
