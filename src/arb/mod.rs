//! # Arbitrage Module
//!
//! This module contains the triangular arbitrage evaluation core.
//! It enumerates closed three-leg routes through a settlement currency,
//! simulates each leg against live order book depth, and decides which
//! resulting opportunities are worth reporting.

/// Currency classification (stable / anchor / alt)
pub mod classifier;
/// Depth-weighted execution simulator
pub mod fill;
/// Fee and liquidity acceptance rules
pub mod filter;
/// Tradable pair snapshot
pub mod market;
/// Evaluated route outcome
pub mod opportunity;
/// Deterministic ordering and top-N report
pub mod ranking;
/// Route enumeration
pub mod route;
/// Per-route leg evaluation
pub mod sequencer;
/// Test helpers and utilities
#[cfg(test)]
pub(crate) mod test_helpers;
/// Common type definitions
pub mod types;
