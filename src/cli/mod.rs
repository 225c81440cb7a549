//! CLI command implementations

pub mod download;
pub mod error;
pub mod prompt;

pub use download::Cli;
pub use error::CliError;
