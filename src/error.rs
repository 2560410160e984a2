//! Typed failure kinds for configuration, fills and route evaluation.
//!
//! Collaborator boundaries (market data, notifications, the CLI) use
//! `eyre::Result`. Everything inside the evaluation pipeline returns one of
//! the enums below so a caller can tell "no opportunity" apart from "bad feed".

use thiserror::Error;

use crate::arb::types::PairId;

/// Startup configuration errors. Always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("missing required setting: {key}")]
    Missing {
        /// Environment variable name
        key: &'static str,
    },

    /// A variable is set but its value is unusable
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Environment variable name
        key: &'static str,
        /// Why the value was refused
        reason: String,
    },
}

/// Why the execution simulator could not produce a fill.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FillError {
    /// The requested amount was zero, negative or not a number
    #[error("requested amount must be positive, got {0}")]
    InvalidRequest(f64),

    /// The side ran out of levels before the request was satisfied
    #[error("insufficient depth: requested {requested}, book holds {available}")]
    InsufficientDepth {
        /// Requested amount, in the target's unit
        requested: f64,
        /// Total amount the side could provide, in the same unit
        available: f64,
    },

    /// A level price is non-positive, not finite, or above the ceiling
    #[error("invalid level price {0}")]
    InvalidPrice(f64),

    /// A level quantity is negative or not finite
    #[error("invalid level quantity {0}")]
    InvalidQuantity(f64),
}

/// Why a route produced no opportunity this cycle.
///
/// Every variant is local to one route. None of them abort a cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Book fetch failed, timed out, or the required side is empty
    #[error("{pair}: data unavailable ({detail})")]
    DataUnavailable {
        /// Pair whose book could not be used
        pair: PairId,
        /// Short description for diagnostics
        detail: String,
    },

    /// The required side is too thin for the leg
    #[error("{pair}: insufficient depth")]
    InsufficientDepth {
        /// Pair whose book was too thin
        pair: PairId,
    },

    /// The book contains a corrupt price or quantity
    #[error("{pair}: invalid price data ({detail})")]
    InvalidPrice {
        /// Pair whose book carried the bad level
        pair: PairId,
        /// Offending value
        detail: String,
    },
}

impl SkipReason {
    /// Maps a simulator failure on `pair` into the route-level skip reason.
    pub(crate) fn from_fill(pair: &PairId, err: &FillError) -> Self {
        match err {
            FillError::InsufficientDepth { .. } => Self::InsufficientDepth { pair: pair.clone() },
            FillError::InvalidPrice(_) | FillError::InvalidQuantity(_) => Self::InvalidPrice {
                pair: pair.clone(),
                detail: err.to_string(),
            },
            FillError::InvalidRequest(_) => Self::DataUnavailable {
                pair: pair.clone(),
                detail: err.to_string(),
            },
        }
    }

    /// Stable short label, used as a counter key in cycle reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DataUnavailable { .. } => "data_unavailable",
            Self::InsufficientDepth { .. } => "insufficient_depth",
            Self::InvalidPrice { .. } => "invalid_price",
        }
    }
}

/// Why the fee & liquidity filter refused an evaluated opportunity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Minimum leg liquidity is outside the configured band
    #[error("liquidity {0:.2} outside configured band")]
    Liquidity(f64),

    /// Final amount is not in `(0, K × T]`
    #[error("implausible final amount {0:.6}")]
    Implausible(f64),

    /// Return is below the acceptance threshold
    #[error("return {0:.4}% below threshold")]
    BelowThreshold(f64),

    /// Return is above the configured plausibility cap
    #[error("return {0:.4}% above cap")]
    AboveCap(f64),
}

impl Rejection {
    /// Stable short label, used as a counter key in cycle reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Liquidity(_) => "liquidity",
            Self::Implausible(_) => "implausible",
            Self::BelowThreshold(_) => "below_threshold",
            Self::AboveCap(_) => "above_cap",
        }
    }
}
