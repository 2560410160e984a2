/*!
 * # Trine - Triangular Arbitrage Scanner
 *
 * Trine watches a single spot exchange for triangular arbitrage: closed
 * three-leg trade routes that start and end in the same settlement
 * currency. Every leg is simulated against live order book depth, fees are
 * applied per leg, and the surviving opportunities are ranked and alerted.
 * Nothing is ever traded.
 *
 * ## Core Features
 *
 * - **Route Enumeration**: Builds every `Q → A → B → Q` cycle the exchange lists
 * - **Depth-Weighted Fills**: Walks the book instead of trusting the top price
 * - **Liquidity Filtering**: Drops thin, implausible and below-threshold results
 * - **Alerts**: Sends the best opportunities to Telegram or the log
 *
 * ## Module Structure
 *
 * - `arb`: Route building, leg simulation, filtering and ranking
 * - `config`: Configuration management for the system
 * - `error`: Typed failure kinds
 * - `market`: Exchange connectivity
 * - `notify`: Alert delivery
 * - `scanner`: The evaluation cycle and scan loop
 * - `utils`: Logging and request pacing
 */

/// Arbitrage evaluation logic
pub mod arb;
/// Configuration management for the system
pub mod config;
/// Typed failure kinds
pub mod error;
/// Exchange connectivity
pub mod market;
/// Alert delivery
pub mod notify;
/// Scan cycle and loop
pub mod scanner;
/// Utility functions and helpers
pub mod utils;
