use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::FillError;

/// Type alias for a currency symbol, always upper case (e.g. `BTC`).
pub type Currency = String;

/// A spot trading pair, identified by its base and quote currency.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display("{base}/{quote}")]
pub struct PairId {
    /// The currency being bought or sold
    pub base: Currency,
    /// The currency prices are quoted in
    pub quote: Currency,
}

impl PairId {
    /// Creates a pair id, normalising both symbols to upper case.
    #[must_use]
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            quote: quote.trim().to_uppercase(),
        }
    }

    /// The exchange symbol, base and quote concatenated (`BTCUSDT`)
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Whether `currency` is either side of the pair
    #[must_use]
    pub fn touches(&self, currency: &str) -> bool {
        self.base == currency || self.quote == currency
    }
}

/// A pair as listed by the exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairListing {
    /// Pair identifier
    pub id: PairId,
    /// Whether the pair currently accepts orders
    pub active: bool,
}

/// One price level of an order book side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Price in quote currency per unit of base
    pub price: f64,
    /// Quantity available, in base currency
    pub quantity: f64,
}

impl Level {
    /// Creates a level
    #[must_use]
    pub const fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }

    /// Price × quantity, in quote currency
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }

    /// Checks the level against the corrupt-feed rules.
    ///
    /// # Errors
    /// * `InvalidPrice` if the price is not finite, not positive, or above `ceiling`
    /// * `InvalidQuantity` if the quantity is not finite or negative
    pub fn validate(&self, ceiling: f64) -> Result<(), FillError> {
        if !self.price.is_finite() || self.price <= 0.0 || self.price > ceiling {
            return Err(FillError::InvalidPrice(self.price));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(FillError::InvalidQuantity(self.quantity));
        }
        Ok(())
    }
}

/// Which side of a book a leg consumes.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Side {
    /// Sell orders, ascending by price. Consumed when buying base.
    #[display("ask")]
    Ask,
    /// Buy orders, descending by price. Consumed when selling base.
    #[display("bid")]
    Bid,
}

/// Order book snapshot for a single pair.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Asks, best (lowest) first
    #[serde(default)]
    pub asks: Vec<Level>,
    /// Bids, best (highest) first
    #[serde(default)]
    pub bids: Vec<Level>,
}

impl OrderBook {
    /// Creates a book from `(price, quantity)` tuples
    #[must_use]
    pub fn from_tuples(asks: &[(f64, f64)], bids: &[(f64, f64)]) -> Self {
        let levels = |side: &[(f64, f64)]| -> Vec<Level> {
            side.iter().map(|&(p, q)| Level::new(p, q)).collect()
        };
        Self {
            asks: levels(asks),
            bids: levels(bids),
        }
    }

    /// The levels of one side
    #[must_use]
    pub fn side(&self, side: Side) -> &[Level] {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    /// Best level of a side, if any
    #[must_use]
    pub fn best(&self, side: Side) -> Option<&Level> {
        self.side(side).first()
    }

    /// Whether both sides are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }

    /// Validates every level on both sides.
    ///
    /// # Errors
    /// Returns the first level error found, asks before bids.
    pub fn validate(&self, ceiling: f64) -> Result<(), FillError> {
        self.asks
            .iter()
            .chain(&self.bids)
            .try_for_each(|level| level.validate(ceiling))
    }
}
