//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// MDR CLI - compile data-model schemas, validate entity paths and translate documents
///
/// Every command works on a snapshot file: a JSON or YAML export of the
/// metadata registry rows.
#[derive(Parser, Debug)]
#[command(
    name = "mdr",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "MDR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile the JSON Schema of a data model
    Schema(SchemaArgs),

    /// Check that an entity-id path locates an entity
    ValidatePath(ValidatePathArgs),

    /// Translate a document from one data model into another
    Translate(TranslateArgs),

    /// Check snapshot integrity and transformation bindings
    Check(CheckArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Snapshot selection shared by the data commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SnapshotArgs {
    /// Snapshot file (JSON or YAML); falls back to the configured snapshot
    #[arg(short, long, value_name = "SNAPSHOT", env = "MDR_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,
}

/// Arguments for the schema command
#[derive(Parser, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Data model id or name
    #[arg(value_name = "DATA_MODEL")]
    pub data_model: String,

    /// Access scope applied to extension models
    #[arg(long, value_enum, default_value = "all")]
    pub scope: ScopeArg,

    /// Write the schema to a file instead of stdout
    #[arg(long = "save-to")]
    pub output_file: Option<PathBuf>,
}

/// Arguments for the validate-path command
#[derive(Parser, Debug)]
pub struct ValidatePathArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Entity the path should locate
    #[arg(short, long)]
    pub entity: u64,

    /// Dotted qualified names or comma-separated ids
    #[arg(value_name = "PATH", allow_hyphen_values = true)]
    pub path: String,
}

/// Arguments for the translate command
#[derive(Parser, Debug)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Document to translate (JSON or YAML)
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Source data model id or name
    #[arg(long)]
    pub from: String,

    /// Target data model id or name
    #[arg(long)]
    pub to: String,

    /// Transformation group version (highest when omitted)
    #[arg(long)]
    pub group_version: Option<String>,

    /// Policy for documents that do not satisfy the source schema
    #[arg(long, value_enum)]
    pub source_validation: Option<SourceValidationArg>,

    /// Show the per-mapping report
    #[arg(long)]
    pub show_report: bool,

    /// Write the translated document to a file
    #[arg(long = "save-to")]
    pub output_file: Option<PathBuf>,

    /// Write the per-mapping report to a file
    #[arg(long)]
    pub save_report: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Skip re-validating transformation binding paths
    #[arg(long)]
    pub skip_bindings: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show current configuration values
    Show(ConfigShowArgs),

    /// Validate current configuration
    Validate,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Write the user config instead of ./.mdr.toml
    #[arg(long)]
    pub user: bool,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Access scope for extension models
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Every included and extension row
    All,
    /// Only rows included with public access
    Public,
    /// Only rows the extension itself contributes
    OrgExtension,
    /// Only rows visible to partners
    Partner,
}

/// Source document checking policy
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceValidationArg {
    Strict,
    Warn,
    Off,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<ScopeArg> for mdr_core::AccessFilters {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => mdr_core::AccessFilters::default(),
            ScopeArg::Public => mdr_core::AccessFilters::public_only(),
            ScopeArg::OrgExtension => mdr_core::AccessFilters::org_extension_only(),
            ScopeArg::Partner => mdr_core::AccessFilters::partner_only(),
        }
    }
}

impl From<SourceValidationArg> for mdr_core::SourceValidation {
    fn from(mode: SourceValidationArg) -> Self {
        match mode {
            SourceValidationArg::Strict => mdr_core::SourceValidation::Strict,
            SourceValidationArg::Warn => mdr_core::SourceValidation::Warn,
            SourceValidationArg::Off => mdr_core::SourceValidation::Off,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
