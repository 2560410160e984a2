//! # Market Data
//!
//! The exchange side of the scanner: listing pairs and fetching order books.
//! The evaluation engine only sees the [`MarketDataProvider`] trait, so a live
//! exchange client, a recorded fixture and a rate-limited wrapper are
//! interchangeable.

use async_trait::async_trait;
use eyre::Result;

use crate::arb::types::{OrderBook, PairId, PairListing};

/// Bybit v5 public REST client
pub mod bybit;
/// In-memory market loaded from JSON
pub mod fixture;
/// Rate-limited provider wrapper
pub mod throttle;

pub use bybit::BybitClient;
pub use fixture::StaticMarket;
pub use throttle::Throttled;

/// Source of pair listings and order books.
///
/// Implementations report failures as errors. The evaluation engine turns any
/// error into a skipped route, so implementations must not retry forever.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Lists every spot pair with its active flag.
    ///
    /// # Errors
    /// Returns an error if the listing cannot be retrieved or decoded.
    async fn list_pairs(&self) -> Result<Vec<PairListing>>;

    /// Fetches a fresh order book for `pair`.
    ///
    /// # Errors
    /// Returns an error on transport failure, timeout, or a malformed response.
    async fn fetch_order_book(&self, pair: &PairId) -> Result<OrderBook>;
}
