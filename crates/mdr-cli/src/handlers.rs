//! Command handlers for CLI subcommands
//!
//! Each subcommand lives in its own module; shared file loading sits in
//! `utils`.

mod check;
mod completions;
mod config;
mod schema;
mod translate;
mod utils;
mod validate_path;

pub use check::handle_check;
pub use completions::handle_completions;
pub use config::handle_config;
pub use schema::handle_schema;
pub use translate::handle_translate;
pub use validate_path::handle_validate_path;
