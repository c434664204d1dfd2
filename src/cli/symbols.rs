//! CLI command for listing a market's symbols

use crate::archive::symbols::{ExchangeInfoLister, SymbolLister};
use crate::TradingType;
use clap::Args;
use serde_json::json;
use std::sync::Arc;

use super::download::{Cli, OutputFormat};
use super::CliError;

/// Symbols subcommand
#[derive(Debug, Args)]
pub struct SymbolsCommand {
    /// Trading type: spot, um or cm
    #[arg(short = 't', long = "type", default_value = "spot")]
    pub trading_type: TradingType,
}

impl SymbolsCommand {
    /// Execute the symbols command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let lister = ExchangeInfoLister::new(Arc::new(cli.transport()?));
        let symbols = lister.list_symbols(self.trading_type).await?;

        match cli.output_format {
            OutputFormat::Json => {
                let output = json!({
                    "trading_type": self.trading_type,
                    "count": symbols.len(),
                    "symbols": symbols,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Human => {
                println!("Found {} symbols:\n", symbols.len());
                for symbol in &symbols {
                    println!("{symbol}");
                }
            }
        }

        Ok(())
    }
}
