use super::classifier::Classifier;
use super::classifier::CurrencyClass;
use super::market::MarketSnapshot;
use super::opportunity::{LegFill, Opportunity};
use super::route::Route;
use super::sequencer::Sequencer;
use super::types::{OrderBook, PairId, PairListing, Side};
use crate::config::Config;

#[allow(dead_code)]
pub fn pair(base: &str, quote: &str) -> PairId {
    PairId::new(base, quote)
}

#[allow(dead_code)]
pub fn listings(pairs: &[(&str, &str, bool)]) -> Vec<PairListing> {
    pairs
        .iter()
        .map(|(base, quote, active)| PairListing {
            id: pair(base, quote),
            active: *active,
        })
        .collect()
}

#[allow(dead_code)]
pub fn snapshot(pairs: &[(&str, &str)]) -> MarketSnapshot {
    let active: Vec<(&str, &str, bool)> = pairs.iter().map(|(b, q)| (*b, *q, true)).collect();
    MarketSnapshot::new(listings(&active))
}

#[allow(dead_code)]
pub fn book(asks: &[(f64, f64)], bids: &[(f64, f64)]) -> OrderBook {
    OrderBook::from_tuples(asks, bids)
}

#[allow(dead_code)]
pub fn route(first: (&str, &str), cross: (&str, &str), last: (&str, &str)) -> Route {
    Route::new(
        pair(first.0, first.1),
        pair(cross.0, cross.1),
        pair(last.0, last.1),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn config() -> Config {
    Config::default()
}

#[allow(dead_code)]
pub fn sequencer(notional: f64, fee: f64) -> Sequencer {
    let config = config();
    Sequencer::new(
        notional,
        fee,
        config.price_ceiling,
        Classifier::new(&config.stable_symbols, &config.anchor_symbols),
    )
}

/// Opportunity on BTC/USDT → BTC/ETH → ETH/USDT with a notional of 100
#[allow(dead_code)]
pub fn opportunity(final_quote: f64, liquidities: [f64; 3]) -> Opportunity {
    let route = route(("BTC", "USDT"), ("BTC", "ETH"), ("ETH", "USDT"));
    let sides = [Side::Ask, Side::Bid, Side::Bid];
    let legs = [0, 1, 2].map(|i| LegFill {
        pair: route.pairs()[i].clone(),
        side: sides[i],
        price: 1.0,
        liquidity: liquidities[i],
        amount_in: 1.0,
        amount_out: 1.0,
    });
    Opportunity {
        route,
        legs,
        notional: 100.0,
        final_quote,
        base_class: CurrencyClass::Anchor,
        intermediate_class: CurrencyClass::Anchor,
    }
}
