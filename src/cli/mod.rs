//! CLI command implementations

pub mod download;
pub mod error;
pub mod progress;
pub mod symbols;

pub use download::{Cli, Commands, DownloadArgs, OutputFormat};
pub use error::CliError;
pub use progress::ConsoleReporter;
pub use symbols::SymbolsCommand;
