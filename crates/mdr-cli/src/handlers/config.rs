//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::{Config, FileFormat, PROJECT_CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::PathBuf;

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Validate => handle_config_validate(config, output),
    }
}

fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?
    } else {
        PathBuf::from(PROJECT_CONFIG_FILE)
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Set `snapshot` to the registry export the commands should use.")
}

fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let format = match args.format {
        ConfigFormat::Toml => FileFormat::Toml,
        ConfigFormat::Json => FileFormat::Json,
        ConfigFormat::Yaml => FileFormat::Yaml,
    };
    output.writeln(config.render(format)?.trim_end())
}

fn handle_config_validate(config: &Config, output: &mut OutputWriter) -> Result<()> {
    output.info("Validating configuration...")?;

    if let Err(e) = config.validate() {
        output.error(&format!("✗ Configuration validation failed: {}", e))?;
        return Err(e);
    }
    output.success("✓ Configuration is valid")?;

    output.section("Configuration Sources")?;
    let cwd = std::env::current_dir()?;
    for path in Config::search_paths(&cwd, dirs::config_dir().as_deref()) {
        let marker = if path.exists() { "✓" } else { "✗" };
        output.info(&format!("{} {}", marker, path.display()))?;
    }

    let env_vars = [
        "MDR_CONFIG",
        "MDR_SNAPSHOT",
        "MDR_LOG_FORMAT",
        "MDR_LOG_FILE",
        "RUST_LOG",
    ];
    let active: Vec<(&str, String)> = env_vars
        .iter()
        .filter_map(|var| std::env::var(var).ok().map(|value| (*var, value)))
        .collect();

    if !active.is_empty() {
        output.section("Active Environment Variables")?;
        for (var, value) in active {
            output.info(&format!("• {} = {}", var, value))?;
        }
    }

    Ok(())
}
