use super::classifier::CurrencyClass;
use super::route::Route;
use super::types::{PairId, Side};

/// The realised outcome of one leg.
#[derive(Clone, Debug, PartialEq)]
pub struct LegFill {
    /// Pair traded
    pub pair: PairId,
    /// Book side consumed
    pub side: Side,
    /// Depth-weighted average price
    pub price: f64,
    /// Top-of-book notional of the consumed side, in the pair's quote currency
    pub liquidity: f64,
    /// Amount handed to this leg
    pub amount_in: f64,
    /// Amount received, after the taker fee
    pub amount_out: f64,
}

/// A fully evaluated route: three fills and the resulting return.
///
/// Built by the sequencer only when all three legs filled. It has no identity
/// beyond its route and lives for one cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Opportunity {
    /// Route evaluated
    pub route: Route,
    /// First, cross and last leg, in trade order
    pub legs: [LegFill; 3],
    /// Settlement currency spent on the first leg (`T`)
    pub notional: f64,
    /// Settlement currency received from the last leg
    pub final_quote: f64,
    /// Class of the currency bought in the first leg
    pub base_class: CurrencyClass,
    /// Class of the currency bought in the cross leg
    pub intermediate_class: CurrencyClass,
}

impl Opportunity {
    /// Net result in settlement currency (negative for a loss)
    #[must_use]
    pub fn profit(&self) -> f64 {
        self.final_quote - self.notional
    }

    /// Net result as a percentage of the notional
    #[must_use]
    pub fn profit_pct(&self) -> f64 {
        100.0 * self.profit() / self.notional
    }

    /// Smallest top-of-book liquidity across the three legs
    #[must_use]
    pub fn min_liquidity(&self) -> f64 {
        self.legs
            .iter()
            .map(|leg| leg.liquidity)
            .fold(f64::INFINITY, f64::min)
    }

    /// Realised prices, in trade order
    #[must_use]
    pub fn prices(&self) -> [f64; 3] {
        [self.legs[0].price, self.legs[1].price, self.legs[2].price]
    }

    /// Whether any currency on the route equals `symbol`
    #[must_use]
    pub fn touches(&self, symbol: &str) -> bool {
        self.route.currencies().contains(&symbol)
    }
}
