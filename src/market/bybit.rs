use std::time::Duration;

use async_trait::async_trait;
use eyre::{bail, eyre, Result};
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::MarketDataProvider;
use crate::arb::types::{Level, OrderBook, PairId, PairListing};
use crate::config::Credentials;

/// Bybit caps spot order book depth at 200 levels
const MAX_DEPTH: usize = 200;

/// Bybit v5 public market data client (spot category).
///
/// Order books and instrument listings are public endpoints, so the
/// credentials are held for the caller's account context but never sent.
#[derive(Debug)]
pub struct BybitClient {
    /// HTTP client with the configured request timeout
    client: Client,
    /// API root, e.g. `https://api.bybit.com`
    base_url: Url,
    /// Levels requested per side
    depth: usize,
    /// Opaque account credentials
    credentials: Option<Credentials>,
}

impl BybitClient {
    /// Creates a client.
    ///
    /// # Arguments
    /// * `base_url` - API root
    /// * `timeout` - Per-request timeout; a timed out request is a failed fetch
    /// * `depth` - Levels per side to request, clamped to `1..=200`
    /// * `credentials` - Account credentials, passed through untouched
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(
        base_url: Url,
        timeout: Duration,
        depth: usize,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            depth: depth.clamp(1, MAX_DEPTH),
            credentials,
        })
    }

    /// Whether account credentials were supplied
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// GET `path` with `query` and return the `result` object of a successful response
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.base_url.join(path)?;
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        unwrap_result(response)
    }
}

#[async_trait]
impl MarketDataProvider for BybitClient {
    async fn list_pairs(&self) -> Result<Vec<PairListing>> {
        let mut listings = Vec::new();
        let mut cursor = String::new();

        loop {
            let result = {
                let mut query = vec![("category", "spot")];
                if !cursor.is_empty() {
                    query.push(("cursor", cursor.as_str()));
                }
                self.get("/v5/market/instruments-info", &query).await?
            };
            let (mut page, next) = parse_instruments(&result)?;
            listings.append(&mut page);

            match next {
                Some(next) if next != cursor => cursor = next,
                _ => break,
            }
        }

        info!("market::bybit: listed {} spot pairs", listings.len());
        Ok(listings)
    }

    async fn fetch_order_book(&self, pair: &PairId) -> Result<OrderBook> {
        let symbol = pair.symbol();
        let depth = self.depth.to_string();
        let result = self
            .get(
                "/v5/market/orderbook",
                &[
                    ("category", "spot"),
                    ("symbol", symbol.as_str()),
                    ("limit", depth.as_str()),
                ],
            )
            .await?;
        let book = parse_order_book(&result)?;
        debug!(
            "market::bybit: {pair} book with {} asks / {} bids",
            book.asks.len(),
            book.bids.len()
        );
        Ok(book)
    }
}

/// Checks `retCode` and returns the `result` payload
fn unwrap_result(response: Value) -> Result<Value> {
    let code = response["retCode"].as_i64().unwrap_or(-1);
    if code != 0 {
        bail!(
            "Bybit API error {code}: {}",
            response["retMsg"].as_str().unwrap_or("unknown error")
        );
    }
    match response {
        Value::Object(mut map) => map
            .remove("result")
            .ok_or_else(|| eyre!("Bybit response without result")),
        _ => Err(eyre!("Bybit response is not an object")),
    }
}

/// Parses one instruments-info page into listings and the next page cursor.
fn parse_instruments(result: &Value) -> Result<(Vec<PairListing>, Option<String>)> {
    let list = result["list"]
        .as_array()
        .ok_or_else(|| eyre!("instruments-info without list"))?;

    let listings = list
        .iter()
        .filter_map(|item| {
            let base = item["baseCoin"].as_str()?;
            let quote = item["quoteCoin"].as_str()?;
            Some(PairListing {
                id: PairId::new(base, quote),
                active: item["status"].as_str() == Some("Trading"),
            })
        })
        .collect();

    let cursor = result["nextPageCursor"]
        .as_str()
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok((listings, cursor))
}

/// Parses an orderbook `result` (`a` asks, `b` bids, each `[price, size]` strings).
fn parse_order_book(result: &Value) -> Result<OrderBook> {
    Ok(OrderBook {
        asks: parse_levels(&result["a"])?,
        bids: parse_levels(&result["b"])?,
    })
}

/// Parses a side; a missing side is empty, a malformed level is an error
fn parse_levels(side: &Value) -> Result<Vec<Level>> {
    let Some(levels) = side.as_array() else {
        return Ok(Vec::new());
    };
    levels
        .iter()
        .map(|level| {
            let field = |i: usize| -> Result<f64> {
                let raw = level[i]
                    .as_str()
                    .ok_or_else(|| eyre!("malformed level {level}"))?;
                raw.parse::<f64>()
                    .map_err(|e| eyre!("malformed number {raw:?}: {e}"))
            };
            Ok(Level::new(field(0)?, field(1)?))
        })
        .collect()
}
