use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;

use super::MarketDataProvider;
use crate::arb::types::{OrderBook, PairId, PairListing};
use crate::utils::rate_limit::RateLimiter;

/// Wraps a provider so every request first takes a slot from a shared [`RateLimiter`].
///
/// This is the only state shared between concurrent route evaluations.
pub struct Throttled<P> {
    /// Wrapped provider
    inner: P,
    /// Shared request budget
    limiter: Arc<RateLimiter>,
}

impl<P> Throttled<P> {
    /// Wraps `inner` with `limiter`
    pub const fn new(inner: P, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    /// The wrapped provider
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for Throttled<P> {
    async fn list_pairs(&self) -> Result<Vec<PairListing>> {
        self.limiter.acquire().await;
        self.inner.list_pairs().await
    }

    async fn fetch_order_book(&self, pair: &PairId) -> Result<OrderBook> {
        self.limiter.acquire().await;
        self.inner.fetch_order_book(pair).await
    }
}
