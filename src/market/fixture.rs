use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};

use super::MarketDataProvider;
use crate::arb::types::{OrderBook, PairId, PairListing};

/// A frozen market: fixed listings and one fixed book per pair.
///
/// Used by the `replay` command and by tests. Books are keyed by the pair's
/// display form (`BTC/USDT`). Fetching a pair without a book fails the same
/// way a live request would.
///
/// ```json
/// {
///   "pairs": [{ "id": { "base": "BTC", "quote": "USDT" }, "active": true }],
///   "books": { "BTC/USDT": { "asks": [{ "price": 10.0, "quantity": 1.0 }], "bids": [] } }
/// }
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StaticMarket {
    /// Listed pairs
    #[serde(default)]
    pairs: Vec<PairListing>,
    /// Books keyed by `BASE/QUOTE`
    #[serde(default)]
    books: HashMap<String, OrderBook>,
    /// Number of book requests served or refused
    #[serde(skip)]
    requests: AtomicUsize,
}

impl StaticMarket {
    /// Creates an empty market
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a market from a JSON file.
    ///
    /// # Errors
    /// * If the file cannot be read
    /// * If the contents are not a valid market document
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading market file {}", path.display()))?;
        serde_json::from_str(&raw).wrap_err("decoding market file")
    }

    /// Adds an active pair with its book
    #[must_use]
    pub fn with_book(mut self, pair: PairId, book: OrderBook) -> Self {
        self.books.insert(pair.to_string(), book);
        self.pairs.push(PairListing {
            id: pair,
            active: true,
        });
        self
    }

    /// Adds a listing without a book; fetching it fails
    #[must_use]
    pub fn with_listing(mut self, pair: PairId, active: bool) -> Self {
        self.pairs.push(PairListing { id: pair, active });
        self
    }

    /// Number of `fetch_order_book` calls so far
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarket {
    async fn list_pairs(&self) -> Result<Vec<PairListing>> {
        Ok(self.pairs.clone())
    }

    async fn fetch_order_book(&self, pair: &PairId) -> Result<OrderBook> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.books
            .get(&pair.to_string())
            .cloned()
            .ok_or_else(|| eyre!("no book recorded for {pair}"))
    }
}
