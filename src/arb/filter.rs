use super::opportunity::Opportunity;
use crate::config::Config;
use crate::error::Rejection;

/// Fee-adjusted acceptance rules for evaluated opportunities.
///
/// Fees are already applied by the sequencer; this only looks at the
/// resulting amounts and the per-leg liquidity.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    /// Lower bound on the thinnest leg's top-of-book notional
    min_liquidity: f64,
    /// Upper bound on the thinnest leg's top-of-book notional
    max_liquidity: f64,
    /// Acceptance threshold, in percent
    min_profit_pct: f64,
    /// Optional plausibility cap, in percent
    max_profit_pct: Option<f64>,
    /// Largest believable final amount (`K × T`)
    max_final: f64,
}

impl Filter {
    /// Creates a filter from the process configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            min_liquidity: config.min_liquidity,
            max_liquidity: config.max_liquidity,
            min_profit_pct: config.min_profit_pct,
            max_profit_pct: config.max_profit_pct,
            max_final: config.sanity_multiplier * config.trade_notional,
        }
    }

    /// Checks `opportunity` against every rule, in order.
    ///
    /// # Errors
    /// * `Liquidity` if the thinnest leg is outside the liquidity band
    /// * `Implausible` if the final amount is not in `(0, K × T]`
    /// * `BelowThreshold` if the return is under the minimum
    /// * `AboveCap` if a cap is configured and the return exceeds it
    pub fn check(&self, opportunity: &Opportunity) -> Result<(), Rejection> {
        let liquidity = opportunity.min_liquidity();
        if !(self.min_liquidity..=self.max_liquidity).contains(&liquidity) {
            return Err(Rejection::Liquidity(liquidity));
        }

        let final_quote = opportunity.final_quote;
        if !(final_quote > 0.0 && final_quote <= self.max_final) {
            return Err(Rejection::Implausible(final_quote));
        }

        let pct = opportunity.profit_pct();
        if pct < self.min_profit_pct {
            return Err(Rejection::BelowThreshold(pct));
        }
        match self.max_profit_pct {
            Some(cap) if pct > cap => Err(Rejection::AboveCap(pct)),
            _ => Ok(()),
        }
    }

    /// Whether `opportunity` passes every rule
    #[must_use]
    pub fn accept(&self, opportunity: &Opportunity) -> bool {
        self.check(opportunity).is_ok()
    }
}
