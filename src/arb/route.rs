//! Route enumeration.
//!
//! A route starts and ends in a settlement currency `Q`:
//! buy `A` with `Q`, convert `A` into `B` through the cross pair, sell `B` for `Q`.
use std::collections::HashSet;
use std::fmt::{self, Display};

use itertools::Itertools;
use log::debug;

use super::market::MarketSnapshot;
use super::types::{Currency, PairId};

/// One triangular cycle through three pairs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Route {
    /// `A/Q`, bought with the settlement currency
    pub first: PairId,
    /// Cross pair, `A/B` or `B/A`
    pub cross: PairId,
    /// `B/Q`, sold back into the settlement currency
    pub last: PairId,
    /// `true` when the cross pair is stored as `B/A`
    pub inverted: bool,
}

impl Route {
    /// Builds a route from its three pairs, deriving `inverted` from the cross pair.
    ///
    /// Returns `None` unless the pairs chain `Q → A → B → Q`.
    #[must_use]
    pub fn new(first: PairId, cross: PairId, last: PairId) -> Option<Self> {
        if first.quote != last.quote || first.base == last.base {
            return None;
        }
        let inverted = if cross.base == first.base && cross.quote == last.base {
            false
        } else if cross.base == last.base && cross.quote == first.base {
            true
        } else {
            return None;
        };
        Some(Self {
            first,
            cross,
            last,
            inverted,
        })
    }

    /// Settlement currency `Q`
    #[must_use]
    pub fn settlement(&self) -> &str {
        &self.first.quote
    }

    /// Currency acquired in the first leg (`A`)
    #[must_use]
    pub fn base(&self) -> &str {
        &self.first.base
    }

    /// Currency acquired in the cross leg and sold in the last (`B`)
    #[must_use]
    pub fn intermediate(&self) -> &str {
        &self.last.base
    }

    /// The three currencies visited, in trade order
    #[must_use]
    pub fn currencies(&self) -> [&str; 3] {
        [self.settlement(), self.base(), self.intermediate()]
    }

    /// The three pairs, in trade order
    #[must_use]
    pub fn pairs(&self) -> [&PairId; 3] {
        [&self.first, &self.cross, &self.last]
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} → {}", self.first, self.cross, self.last)
    }
}

/// Immutable, ordered set of routes built from one snapshot.
#[derive(Clone, Debug, Default)]
pub struct RouteSet {
    /// Routes in build order; the index is the route's insertion rank
    routes: Vec<Route>,
}

impl RouteSet {
    /// Number of routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Route at insertion index `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    /// Up to `cap` routes starting at `offset`, wrapping around the end.
    ///
    /// Each item carries the route's insertion index, used to break ranking ties.
    pub fn window(&self, offset: usize, cap: usize) -> impl Iterator<Item = (usize, &Route)> {
        let len = self.routes.len();
        let take = cap.min(len);
        let start = if len == 0 { 0 } else { offset % len };
        (0..take).map(move |i| {
            let index = (start + i) % len;
            (index, &self.routes[index])
        })
    }
}

impl FromIterator<Route> for RouteSet {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        Self {
            routes: iter.into_iter().collect(),
        }
    }
}

/// Enumerates every route available in `snapshot` for the given settlement currencies.
///
/// For each settlement currency `Q` and each ordered pair `(A, B)` of distinct
/// currencies quoted in `Q`, the cross pair `A/B` is preferred over `B/A`.
/// `(A, B)` and `(B, A)` are separate routes.
///
/// # Arguments
/// * `snapshot` - Tradable pairs
/// * `settlements` - Settlement currencies, in priority order
///
/// # Returns
/// Routes ordered by settlement currency, then `A`, then `B`
#[must_use]
pub fn build_routes(snapshot: &MarketSnapshot, settlements: &[Currency]) -> RouteSet {
    let mut seen = HashSet::new();
    let mut routes = Vec::new();

    for quote in settlements.iter().map(|q| q.trim().to_uppercase()).unique() {
        let bases = snapshot.bases_quoted_in(&quote);

        for (a, b) in bases.iter().cartesian_product(bases.iter()) {
            if a == b || *a == quote || *b == quote {
                continue;
            }
            let (cross, inverted) = if snapshot.has(a, b) {
                (PairId::new(a, b), false)
            } else if snapshot.has(b, a) {
                (PairId::new(b, a), true)
            } else {
                continue;
            };
            if !seen.insert((quote.clone(), *a, *b)) {
                continue;
            }
            routes.push(Route {
                first: PairId::new(a, &quote),
                cross,
                last: PairId::new(b, &quote),
                inverted,
            });
        }

        debug!(
            "arb::route: {} currencies quoted in {quote}, {} routes so far",
            bases.len(),
            routes.len()
        );
    }

    routes.into_iter().collect()
}
