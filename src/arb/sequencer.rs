//! Leg sequencer.
//!
//! Turns a [`Route`] into an [`Opportunity`] by filling its three legs in
//! order against freshly fetched books. Each leg's requested amount is the
//! previous leg's output, so the legs cannot be reordered.
//!
//! Which side the cross leg consumes depends only on how the cross pair is
//! stored:
//!
//! | cross pair | trade                   | side | target                    |
//! |------------|-------------------------|------|---------------------------|
//! | `A/B`      | sell `A` for `B`        | bid  | quantity of `A`           |
//! | `B/A`      | buy `B` spending `A`    | ask  | notional of `A`           |
//!
//! Currency classes are recorded on the opportunity but never change the side.

use log::debug;

use super::classifier::Classifier;
use super::fill::{fill, Fill, Target};
use super::opportunity::{LegFill, Opportunity};
use super::route::Route;
use super::types::{OrderBook, PairId, Side};
use crate::config::Config;
use crate::error::SkipReason;
use crate::market::MarketDataProvider;

/// Evaluates routes with a fixed notional, fee and price ceiling.
#[derive(Clone, Debug)]
pub struct Sequencer {
    /// Settlement currency spent on the first leg
    notional: f64,
    /// Fraction of each leg's output kept after the taker fee
    keep: f64,
    /// Level prices above this are corrupt
    price_ceiling: f64,
    /// Currency classes for annotation
    classifier: Classifier,
}

impl Sequencer {
    /// Creates a sequencer.
    ///
    /// # Arguments
    /// * `notional` - Settlement currency spent on the first leg (`T`)
    /// * `fee` - Taker fee rate, deducted from every leg's output
    /// * `price_ceiling` - Highest sane level price
    /// * `classifier` - Currency classifier
    #[must_use]
    pub fn new(notional: f64, fee: f64, price_ceiling: f64, classifier: Classifier) -> Self {
        Self {
            notional,
            keep: 1.0 - fee,
            price_ceiling,
            classifier,
        }
    }

    /// Creates a sequencer from the process configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.trade_notional,
            config.fee,
            config.price_ceiling,
            Classifier::new(&config.stable_symbols, &config.anchor_symbols),
        )
    }

    /// Evaluates `route`, fetching each book right before its leg.
    ///
    /// # Errors
    /// Returns the [`SkipReason`] of the first leg that could not be filled.
    /// A provider failure is `DataUnavailable`; it is never propagated raw.
    pub async fn evaluate<P>(&self, route: &Route, market: &P) -> Result<Opportunity, SkipReason>
    where
        P: MarketDataProvider + ?Sized,
    {
        let book = self.fetch(market, &route.first).await?;
        let first = self.first_leg(route, &book)?;

        let book = self.fetch(market, &route.cross).await?;
        let cross = self.cross_leg(route, &book, first.amount_out)?;

        let book = self.fetch(market, &route.last).await?;
        let last = self.last_leg(route, &book, cross.amount_out)?;

        Ok(self.assemble(route, [first, cross, last]))
    }

    /// Evaluates `route` against three already-fetched books, in trade order.
    ///
    /// # Errors
    /// Same as [`Sequencer::evaluate`], minus fetch failures.
    pub fn evaluate_books(
        &self,
        route: &Route,
        books: [&OrderBook; 3],
    ) -> Result<Opportunity, SkipReason> {
        let [first_book, cross_book, last_book] = books;

        self.check_book(&route.first, first_book)?;
        let first = self.first_leg(route, first_book)?;

        self.check_book(&route.cross, cross_book)?;
        let cross = self.cross_leg(route, cross_book, first.amount_out)?;

        self.check_book(&route.last, last_book)?;
        let last = self.last_leg(route, last_book, cross.amount_out)?;

        Ok(self.assemble(route, [first, cross, last]))
    }

    /// Buy `A` with the settlement currency
    fn first_leg(&self, route: &Route, book: &OrderBook) -> Result<LegFill, SkipReason> {
        let (fill, liquidity) = self.fill_side(
            &route.first,
            book,
            Side::Ask,
            Target::Notional(self.notional),
        )?;
        Ok(self.leg(&route.first, Side::Ask, &fill, liquidity, self.notional, fill.quantity))
    }

    /// Convert `A` into `B` through the cross pair
    fn cross_leg(
        &self,
        route: &Route,
        book: &OrderBook,
        amount_base: f64,
    ) -> Result<LegFill, SkipReason> {
        if route.inverted {
            // B/A: spend A (the quote) on B
            let (fill, liquidity) = self.fill_side(
                &route.cross,
                book,
                Side::Ask,
                Target::Notional(amount_base),
            )?;
            Ok(self.leg(&route.cross, Side::Ask, &fill, liquidity, amount_base, fill.quantity))
        } else {
            // A/B: sell A (the base) for B
            let (fill, liquidity) = self.fill_side(
                &route.cross,
                book,
                Side::Bid,
                Target::Quantity(amount_base),
            )?;
            Ok(self.leg(&route.cross, Side::Bid, &fill, liquidity, amount_base, fill.notional))
        }
    }

    /// Sell `B` back into the settlement currency
    fn last_leg(
        &self,
        route: &Route,
        book: &OrderBook,
        amount_intermediate: f64,
    ) -> Result<LegFill, SkipReason> {
        let (fill, liquidity) = self.fill_side(
            &route.last,
            book,
            Side::Bid,
            Target::Quantity(amount_intermediate),
        )?;
        Ok(self.leg(
            &route.last,
            Side::Bid,
            &fill,
            liquidity,
            amount_intermediate,
            fill.notional,
        ))
    }

    /// Records a leg, applying the fee to `gross_out`
    fn leg(
        &self,
        pair: &PairId,
        side: Side,
        fill: &Fill,
        liquidity: f64,
        amount_in: f64,
        gross_out: f64,
    ) -> LegFill {
        LegFill {
            pair: pair.clone(),
            side,
            price: fill.avg_price,
            liquidity,
            amount_in,
            amount_out: gross_out * self.keep,
        }
    }

    /// Fills `target` on one side and reports that side's top-of-book liquidity
    fn fill_side(
        &self,
        pair: &PairId,
        book: &OrderBook,
        side: Side,
        target: Target,
    ) -> Result<(Fill, f64), SkipReason> {
        let best = book.best(side).ok_or_else(|| SkipReason::DataUnavailable {
            pair: pair.clone(),
            detail: format!("empty {side} side"),
        })?;
        let liquidity = best.notional();
        let fill = fill(book.side(side), target, self.price_ceiling)
            .map_err(|e| SkipReason::from_fill(pair, &e))?;
        Ok((fill, liquidity))
    }

    /// Fetches and validates a book. Any provider failure becomes `DataUnavailable`.
    async fn fetch<P>(&self, market: &P, pair: &PairId) -> Result<OrderBook, SkipReason>
    where
        P: MarketDataProvider + ?Sized,
    {
        let book = market.fetch_order_book(pair).await.map_err(|e| {
            debug!("arb::sequencer: fetch {pair} failed: {e}");
            SkipReason::DataUnavailable {
                pair: pair.clone(),
                detail: "fetch failed".to_string(),
            }
        })?;
        self.check_book(pair, &book)?;
        Ok(book)
    }

    /// Rejects a book carrying any corrupt level
    fn check_book(&self, pair: &PairId, book: &OrderBook) -> Result<(), SkipReason> {
        if book.is_empty() {
            return Err(SkipReason::DataUnavailable {
                pair: pair.clone(),
                detail: "empty book".to_string(),
            });
        }
        book.validate(self.price_ceiling)
            .map_err(|e| SkipReason::from_fill(pair, &e))
    }

    /// Builds the opportunity from three completed legs
    fn assemble(&self, route: &Route, legs: [LegFill; 3]) -> Opportunity {
        let final_quote = legs[2].amount_out;
        Opportunity {
            route: route.clone(),
            notional: self.notional,
            final_quote,
            base_class: self.classifier.classify(route.base()),
            intermediate_class: self.classifier.classify(route.intermediate()),
            legs,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::classifier::CurrencyClass;
    use crate::arb::test_helpers::{book, pair, route, sequencer};
    use crate::market::StaticMarket;

    const EPS: f64 = 1e-9;

    /// BTC/USDT → BTC/ETH → ETH/USDT, cross pair stored as A/B
    fn direct_route() -> Route {
        route(("BTC", "USDT"), ("BTC", "ETH"), ("ETH", "USDT"))
    }

    #[test]
    fn test_direct_cross_sells_into_bids() {
        let seq = sequencer(100.0, 0.001);
        let opp = seq
            .evaluate_books(
                &direct_route(),
                [
                    &book(&[(10.0, 20.0)], &[(9.0, 1.0)]),
                    &book(&[(3.0, 1.0)], &[(2.0, 50.0)]),
                    &book(&[(6.0, 1.0)], &[(5.0, 40.0)]),
                ],
            )
            .unwrap();

        let amount_base = 10.0 * 0.999;
        let amount_intermediate = amount_base * 2.0 * 0.999;
        let final_quote = amount_intermediate * 5.0 * 0.999;

        assert_eq!(opp.legs[0].side, Side::Ask);
        assert_eq!(opp.legs[1].side, Side::Bid);
        assert_eq!(opp.legs[2].side, Side::Bid);
        assert!((opp.legs[0].amount_out - amount_base).abs() < EPS);
        assert!((opp.legs[1].amount_out - amount_intermediate).abs() < EPS);
        assert!((opp.final_quote - final_quote).abs() < EPS);
        assert!((opp.final_quote - 99.7003).abs() < 1e-4);
        assert!((opp.profit_pct() + 0.2997).abs() < 1e-4);
        assert_eq!(opp.prices(), [10.0, 2.0, 5.0]);
        assert!((opp.min_liquidity() - 100.0).abs() < EPS);
    }

    #[test]
    fn test_inverted_cross_buys_from_asks() {
        // BTC/USDT → ETH/BTC → ETH/USDT: spend BTC on ETH at 0.05 BTC per ETH
        let seq = sequencer(100.0, 0.0);
        let inverted = route(("BTC", "USDT"), ("ETH", "BTC"), ("ETH", "USDT"));
        assert!(inverted.inverted);

        let opp = seq
            .evaluate_books(
                &inverted,
                [
                    &book(&[(10.0, 20.0)], &[]),
                    &book(&[(0.05, 1000.0)], &[(0.04, 1000.0)]),
                    &book(&[], &[(0.6, 1000.0)]),
                ],
            )
            .unwrap();

        assert_eq!(opp.legs[1].side, Side::Ask);
        assert!((opp.legs[1].amount_in - 10.0).abs() < EPS);
        assert!((opp.legs[1].amount_out - 200.0).abs() < EPS);
        assert!((opp.legs[1].liquidity - 50.0).abs() < EPS);
        assert!((opp.final_quote - 120.0).abs() < EPS);
        assert!((opp.profit_pct() - 20.0).abs() < EPS);
    }

    #[test]
    fn test_liquidity_uses_top_of_book_not_consumed_depth() {
        let seq = sequencer(100.0, 0.0);
        let opp = seq
            .evaluate_books(
                &direct_route(),
                [
                    &book(&[(10.0, 5.0), (11.0, 100.0)], &[]),
                    &book(&[], &[(2.0, 3.0), (1.9, 100.0)]),
                    &book(&[], &[(5.0, 1.0), (4.9, 100.0)]),
                ],
            )
            .unwrap();
        assert_eq!(
            opp.legs.iter().map(|l| l.liquidity).collect::<Vec<_>>(),
            vec![50.0, 6.0, 5.0]
        );
        assert!((opp.min_liquidity() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_missing_side_is_data_unavailable() {
        let seq = sequencer(100.0, 0.001);
        let err = seq
            .evaluate_books(
                &direct_route(),
                [
                    &book(&[(10.0, 20.0)], &[]),
                    &book(&[(3.0, 1.0)], &[]),
                    &book(&[], &[(5.0, 40.0)]),
                ],
            )
            .unwrap_err();
        assert_eq!(
            err,
            SkipReason::DataUnavailable {
                pair: pair("BTC", "ETH"),
                detail: "empty bid side".to_string()
            }
        );
    }

    #[test]
    fn test_thin_book_is_insufficient_depth() {
        let seq = sequencer(100.0, 0.001);
        let err = seq
            .evaluate_books(
                &direct_route(),
                [
                    &book(&[(10.0, 20.0)], &[]),
                    &book(&[], &[(2.0, 50.0)]),
                    &book(&[], &[(5.0, 1.0)]),
                ],
            )
            .unwrap_err();
        assert_eq!(
            err,
            SkipReason::InsufficientDepth {
                pair: pair("ETH", "USDT")
            }
        );
    }

    #[test]
    fn test_bad_price_anywhere_in_book_skips_route() {
        let seq = sequencer(100.0, 0.001);
        // The zero bid is never walked, but the book is still corrupt
        let err = seq
            .evaluate_books(
                &direct_route(),
                [
                    &book(&[(10.0, 20.0)], &[(0.0, 1.0)]),
                    &book(&[], &[(2.0, 50.0)]),
                    &book(&[], &[(5.0, 40.0)]),
                ],
            )
            .unwrap_err();
        assert_eq!(
            err,
            SkipReason::InvalidPrice {
                pair: pair("BTC", "USDT"),
                detail: "invalid level price 0".to_string()
            }
        );

        let err = seq
            .evaluate_books(
                &direct_route(),
                [
                    &book(&[(10.0, 20.0)], &[]),
                    &book(&[], &[(2.0, 50.0)]),
                    &book(&[], &[(-5.0, 40.0)]),
                ],
            )
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_price");
    }

    #[test]
    fn test_classes_are_annotated() {
        let seq = sequencer(100.0, 0.0);
        let opp = seq
            .evaluate_books(
                &route(("SOL", "USDT"), ("SOL", "PEPE"), ("PEPE", "USDT")),
                [
                    &book(&[(10.0, 20.0)], &[]),
                    &book(&[], &[(1000.0, 50.0)]),
                    &book(&[], &[(0.01, 100_000.0)]),
                ],
            )
            .unwrap();
        assert_eq!(opp.base_class, CurrencyClass::Anchor);
        assert_eq!(opp.intermediate_class, CurrencyClass::Alt);
    }

    #[tokio::test]
    async fn test_fetches_each_leg_once() {
        let market = StaticMarket::new()
            .with_book(pair("BTC", "USDT"), book(&[(10.0, 20.0)], &[]))
            .with_book(pair("BTC", "ETH"), book(&[], &[(2.0, 50.0)]))
            .with_book(pair("ETH", "USDT"), book(&[], &[(5.0, 40.0)]));
        let seq = sequencer(100.0, 0.001);

        let first = seq.evaluate(&direct_route(), &market).await.unwrap();
        let second = seq.evaluate(&direct_route(), &market).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(market.requests(), 6);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_data_unavailable() {
        let market = StaticMarket::new().with_book(pair("BTC", "USDT"), book(&[(10.0, 20.0)], &[]));
        let err = sequencer(100.0, 0.001)
            .evaluate(&direct_route(), &market)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "data_unavailable");
        // Stopped at the cross leg; the last book was never requested
        assert_eq!(market.requests(), 2);
    }
}
