//! Depth-weighted execution simulator.
//!
//! Walks one side of an order book best-first and reports the average price a
//! taker order of a given size would realise. Nothing is mutated, so the same
//! levels and target always produce the same [`Fill`].

use crate::arb::types::Level;
use crate::error::FillError;

/// How much a leg wants to trade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Target {
    /// Spend or receive this much quote currency (price × quantity)
    Notional(f64),
    /// Buy or sell this much base currency
    Quantity(f64),
}

impl Target {
    /// Raw amount, in the target's own unit
    #[must_use]
    pub const fn amount(&self) -> f64 {
        match self {
            Self::Notional(a) | Self::Quantity(a) => *a,
        }
    }

    /// Contribution of a whole level, in the target's unit
    fn contribution(&self, level: &Level) -> f64 {
        match self {
            Self::Notional(_) => level.notional(),
            Self::Quantity(_) => level.quantity,
        }
    }
}

/// Result of walking a book side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fill {
    /// Volume-weighted average price (`notional / quantity`)
    pub avg_price: f64,
    /// Base quantity filled
    pub quantity: f64,
    /// Quote notional consumed
    pub notional: f64,
}

/// Simulates a taker order for `target` against `levels`.
///
/// Levels are consumed in the order given, so callers pass asks ascending and
/// bids descending. The final level is taken fractionally so the target is hit
/// exactly. Each level is validated against `ceiling` before it is used.
///
/// # Arguments
/// * `levels` - One side of an order book, best price first
/// * `target` - Amount to fill
/// * `ceiling` - Highest price accepted as sane
///
/// # Errors
/// * `InvalidRequest` if the target amount is not a positive finite number
/// * `InvalidPrice` / `InvalidQuantity` for a corrupt level reached by the walk
/// * `InsufficientDepth` if the levels run out before the target is met
pub fn fill(levels: &[Level], target: Target, ceiling: f64) -> Result<Fill, FillError> {
    let requested = target.amount();
    if !requested.is_finite() || requested <= 0.0 {
        return Err(FillError::InvalidRequest(requested));
    }

    let mut quantity = 0.0;
    let mut notional = 0.0;
    let mut consumed = 0.0;

    for level in levels {
        level.validate(ceiling)?;

        let remaining = requested - consumed;
        if target.contribution(level) >= remaining {
            // Partial take of the last level
            match target {
                Target::Notional(_) => {
                    quantity += remaining / level.price;
                    notional = requested;
                }
                Target::Quantity(_) => {
                    quantity = requested;
                    notional += remaining * level.price;
                }
            }
            return Ok(Fill {
                avg_price: notional / quantity,
                quantity,
                notional,
            });
        }

        quantity += level.quantity;
        notional += level.notional();
        consumed += target.contribution(level);
    }

    Err(FillError::InsufficientDepth {
        requested,
        available: consumed,
    })
}
