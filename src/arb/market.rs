use std::collections::{BTreeSet, HashSet};
use std::time::{Duration, Instant};

use super::types::{PairId, PairListing};

/// Immutable view of the exchange's pair universe at one point in time.
///
/// The scanner replaces the whole snapshot on refresh; it is never patched.
#[derive(Clone, Debug)]
pub struct MarketSnapshot {
    /// Active pairs only
    tradable: HashSet<PairId>,
    /// Number of listings received, active or not
    listed: usize,
    /// When the listing was taken
    taken_at: Instant,
}

impl MarketSnapshot {
    /// Creates a snapshot from a provider listing. Inactive pairs are dropped.
    #[must_use]
    pub fn new(listings: Vec<PairListing>) -> Self {
        let listed = listings.len();
        let tradable = listings
            .into_iter()
            .filter(|listing| listing.active && listing.id.base != listing.id.quote)
            .map(|listing| listing.id)
            .collect();
        Self {
            tradable,
            listed,
            taken_at: Instant::now(),
        }
    }

    /// Whether `pair` is present and active
    #[must_use]
    pub fn is_tradable(&self, pair: &PairId) -> bool {
        self.tradable.contains(pair)
    }

    /// Whether `base/quote` is present and active
    #[must_use]
    pub fn has(&self, base: &str, quote: &str) -> bool {
        self.is_tradable(&PairId::new(base, quote))
    }

    /// All currencies appearing in a tradable pair, sorted
    #[must_use]
    pub fn currencies(&self) -> BTreeSet<&str> {
        self.tradable
            .iter()
            .flat_map(|pair| [pair.base.as_str(), pair.quote.as_str()])
            .collect()
    }

    /// Bases of every tradable `X/quote` pair, sorted
    #[must_use]
    pub fn bases_quoted_in(&self, quote: &str) -> BTreeSet<&str> {
        self.tradable
            .iter()
            .filter(|pair| pair.quote == quote)
            .map(|pair| pair.base.as_str())
            .collect()
    }

    /// Number of active pairs
    #[must_use]
    pub fn tradable_count(&self) -> usize {
        self.tradable.len()
    }

    /// Number of listings received, active or not
    #[must_use]
    pub const fn listed_count(&self) -> usize {
        self.listed
    }

    /// Time since the listing was taken
    #[must_use]
    pub fn age(&self) -> Duration {
        self.taken_at.elapsed()
    }
}
