//! Symbol discovery via the exchange-info endpoints
//!
//! When a run names no symbols, every symbol the market currently lists is
//! downloaded. The exchange-info response is a JSON object with a `symbols`
//! array; only the `symbol` field of each entry is used, in response order.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::http::ReqwestTransport;
use super::{FetchError, FetchResult};
use crate::TradingType;

/// Lists the tradable symbols of a market
#[async_trait]
pub trait SymbolLister: Send + Sync {
    /// Return the market's symbols in the order the exchange reports them
    async fn list_symbols(&self, trading_type: TradingType) -> FetchResult<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolEntry>,
}

#[derive(Debug, Deserialize)]
struct SymbolEntry {
    symbol: String,
}

impl ExchangeInfo {
    fn into_symbols(self) -> Vec<String> {
        self.symbols.into_iter().map(|s| s.symbol).collect()
    }
}

/// Extract the ordered symbol names from an exchange-info body
pub fn parse_symbols(body: &str) -> FetchResult<Vec<String>> {
    let info: ExchangeInfo = serde_json::from_str(body)
        .map_err(|e| FetchError::ParseError(format!("Invalid exchangeInfo response: {e}")))?;
    Ok(info.into_symbols())
}

/// [`SymbolLister`] backed by the public exchange-info endpoints
pub struct ExchangeInfoLister {
    transport: Arc<ReqwestTransport>,
    endpoint_override: Option<String>,
}

impl ExchangeInfoLister {
    /// Create a lister sharing the download transport
    pub fn new(transport: Arc<ReqwestTransport>) -> Self {
        Self {
            transport,
            endpoint_override: None,
        }
    }

    /// Query `url` for every trading type (for testing)
    pub fn with_endpoint_override(mut self, url: impl Into<String>) -> Self {
        self.endpoint_override = Some(url.into());
        self
    }

    fn endpoint(&self, trading_type: TradingType) -> &str {
        self.endpoint_override
            .as_deref()
            .unwrap_or(trading_type.market().exchange_info_url)
    }
}

#[async_trait]
impl SymbolLister for ExchangeInfoLister {
    async fn list_symbols(&self, trading_type: TradingType) -> FetchResult<Vec<String>> {
        let url = self.endpoint(trading_type);
        info!(trading_type = %trading_type, url = %url, "Fetching all symbols from exchange");

        let body = self.transport.get_text(url).await?;
        let symbols = parse_symbols(&body)?;

        info!(trading_type = %trading_type, count = symbols.len(), "Symbols listed");
        Ok(symbols)
    }
}

/// Fixed symbol list, useful when the caller already knows the universe
pub struct StaticSymbols(pub Vec<String>);

#[async_trait]
impl SymbolLister for StaticSymbols {
    async fn list_symbols(&self, _trading_type: TradingType) -> FetchResult<Vec<String>> {
        Ok(self.0.clone())
    }
}
