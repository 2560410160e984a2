//! Scan loop.
//!
//! A [`Scanner`] owns the current market snapshot and route set, and runs
//! evaluation cycles over them. Routes of one cycle are evaluated
//! concurrently, at most `workers` at a time; every book request still goes
//! through the provider, which is expected to carry the shared rate limit.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::{Result, WrapErr};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::arb::filter::Filter;
use crate::arb::market::MarketSnapshot;
use crate::arb::opportunity::Opportunity;
use crate::arb::ranking::{rank, render_top};
use crate::arb::route::{build_routes, RouteSet};
use crate::arb::sequencer::Sequencer;
use crate::config::Config;
use crate::market::MarketDataProvider;
use crate::notify::Alerts;

/// Outcome counts and ranked results of one cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Routes in the current route set
    pub total_routes: usize,
    /// Routes scheduled this cycle
    pub scheduled: usize,
    /// Routes whose evaluation started
    pub evaluated: usize,
    /// Skipped routes per skip reason
    pub skipped: BTreeMap<&'static str, usize>,
    /// Rejected opportunities per rejection reason
    pub rejected: BTreeMap<&'static str, usize>,
    /// Routes never started because of shutdown
    pub cancelled: usize,
    /// Alerts delivered
    pub alerts_sent: usize,
    /// Accepted opportunities, best first
    pub ranked: Vec<Opportunity>,
    /// Rows shown when rendered
    pub top_n: usize,
    /// Wall time of the cycle
    pub elapsed: Duration,
}

impl CycleReport {
    /// Number of accepted opportunities
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.ranked.len()
    }

    /// Total skipped routes
    #[must_use]
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Total rejected opportunities
    #[must_use]
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// `kind=count, kind=count` or `0`
fn counts(map: &BTreeMap<&'static str, usize>) -> String {
    if map.is_empty() {
        return "0".to_string();
    }
    map.iter()
        .map(|(kind, n)| format!("{kind}={n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "cycle: {}/{} routes evaluated in {:.1}s | accepted {} | skipped {} | rejected {} | cancelled {} | alerts {}",
            self.evaluated,
            self.scheduled,
            self.elapsed.as_secs_f64(),
            self.accepted(),
            counts(&self.skipped),
            counts(&self.rejected),
            self.cancelled,
            self.alerts_sent,
        )?;
        write!(f, "{}", render_top(&self.ranked, self.top_n))
    }
}

/// Periodic triangular arbitrage scanner.
pub struct Scanner {
    /// Process configuration
    config: Arc<Config>,
    /// Market data source
    market: Arc<dyn MarketDataProvider>,
    /// Alert dispatcher
    alerts: Alerts,
    /// Leg evaluation
    sequencer: Sequencer,
    /// Acceptance rules
    filter: Filter,
    /// Current snapshot, `None` before the first refresh
    snapshot: Option<MarketSnapshot>,
    /// Routes of the current snapshot
    routes: Arc<RouteSet>,
    /// Start of the next cycle's route window
    cursor: usize,
    /// Whether cycles draw a progress bar
    progress: bool,
}

impl Scanner {
    /// Creates a scanner. No request is made until the first refresh.
    #[must_use]
    pub fn new(config: Arc<Config>, market: Arc<dyn MarketDataProvider>, alerts: Alerts) -> Self {
        Self {
            sequencer: Sequencer::from_config(&config),
            filter: Filter::new(&config),
            config,
            market,
            alerts,
            snapshot: None,
            routes: Arc::new(RouteSet::default()),
            cursor: 0,
            progress: false,
        }
    }

    /// Draw a progress bar during cycles
    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Current route set
    #[must_use]
    pub fn routes(&self) -> &RouteSet {
        &self.routes
    }

    /// Current snapshot, if any
    #[must_use]
    pub const fn snapshot(&self) -> Option<&MarketSnapshot> {
        self.snapshot.as_ref()
    }

    /// Lists pairs and rebuilds the snapshot and route set.
    ///
    /// # Errors
    /// * If the provider cannot list pairs; the previous snapshot is kept
    pub async fn refresh(&mut self) -> Result<()> {
        let listings = self
            .market
            .list_pairs()
            .await
            .wrap_err("listing market pairs")?;
        let snapshot = MarketSnapshot::new(listings);
        let routes = build_routes(&snapshot, &self.config.settlement_currencies);

        info!(
            "scanner: {} of {} listed pairs tradable, {} routes",
            snapshot.tradable_count(),
            snapshot.listed_count(),
            routes.len()
        );
        if routes.is_empty() {
            warn!("scanner: no route closes through {:?}", self.config.settlement_currencies);
        }

        self.snapshot = Some(snapshot);
        self.routes = Arc::new(routes);
        self.cursor = 0;
        Ok(())
    }

    /// Whether the snapshot is missing or older than the refresh interval
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_none_or(|s| s.age() >= self.config.refresh_interval)
    }

    /// Refreshes when needed.
    ///
    /// # Errors
    /// * Only if there is no snapshot yet and listing fails. A failed
    ///   refresh of a stale snapshot is logged and the stale one is kept.
    pub async fn ensure_fresh(&mut self) -> Result<()> {
        if !self.needs_refresh() {
            return Ok(());
        }
        match self.refresh().await {
            Ok(()) => Ok(()),
            Err(e) if self.snapshot.is_some() => {
                warn!("scanner: refresh failed, keeping previous snapshot: {e:#}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Runs one evaluation cycle over the next window of routes.
    ///
    /// Never fails: per-route problems are counted in the report. Routes not
    /// yet started when `shutdown` turns `true` are counted as cancelled.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let started = Instant::now();
        let routes = Arc::clone(&self.routes);
        let window: Vec<_> = routes.window(self.cursor, self.config.route_cap).collect();
        if !routes.is_empty() {
            self.cursor = (self.cursor + window.len()) % routes.len();
        }

        let mut report = CycleReport {
            total_routes: routes.len(),
            scheduled: window.len(),
            top_n: self.config.top_n,
            ..CycleReport::default()
        };

        let bar = self.progress_bar(window.len());
        let progress = &bar;
        let sequencer = &self.sequencer;
        let market = self.market.as_ref();

        let outcomes: Vec<_> = stream::iter(window)
            .map(|(index, route)| async move {
                if *shutdown.borrow() {
                    return (index, route, None);
                }
                let outcome = sequencer.evaluate(route, market).await;
                progress.inc(1);
                (index, route, Some(outcome))
            })
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;
        bar.finish_and_clear();

        let mut accepted = Vec::new();
        for (index, route, outcome) in outcomes {
            match outcome {
                None => report.cancelled += 1,
                Some(Err(reason)) => {
                    report.evaluated += 1;
                    debug!("scanner: skipped {route}: {reason}");
                    *report.skipped.entry(reason.kind()).or_default() += 1;
                }
                Some(Ok(opportunity)) => {
                    report.evaluated += 1;
                    match self.filter.check(&opportunity) {
                        Ok(()) => accepted.push((index, opportunity)),
                        Err(rejection) => {
                            debug!("scanner: rejected {route}: {rejection}");
                            *report.rejected.entry(rejection.kind()).or_default() += 1;
                        }
                    }
                }
            }
        }

        report.ranked = rank(accepted);
        for opportunity in &report.ranked {
            if self.alerts.opportunity(opportunity).await {
                report.alerts_sent += 1;
            }
        }

        report.elapsed = started.elapsed();
        info!(
            "scanner: {}/{} routes evaluated, {} accepted, {} skipped, {} rejected, {} cancelled",
            report.evaluated,
            report.scheduled,
            report.accepted(),
            report.skipped_total(),
            report.rejected_total(),
            report.cancelled
        );
        report
    }

    /// Scans until `shutdown` turns `true`, printing each cycle's report.
    ///
    /// # Errors
    /// * If the initial market listing fails
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.ensure_fresh().await?;
        let mut cycle: u64 = 0;

        while !*shutdown.borrow() {
            self.ensure_fresh().await?;
            cycle += 1;
            debug!("scanner: cycle {cycle} starting at route {}", self.cursor);

            let report = self.run_cycle(&shutdown).await;
            println!("{report}");
            if report.cancelled > 0 {
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(self.config.cycle_cooldown) => {}
                Ok(()) = shutdown.changed() => {}
            }
        }

        info!("scanner: stopped after {cycle} cycles");
        Ok(())
    }

    /// Progress bar for a cycle of `len` routes; hidden unless enabled
    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} routes")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use eyre::bail;

    use super::*;
    use crate::arb::test_helpers::{book, config, pair};
    use crate::arb::types::{OrderBook, PairId, PairListing};
    use crate::market::StaticMarket;
    use crate::notify::recording::Recorder;

    /// BTC/USDT → BTC/ETH → ETH/USDT returns about 3.69%;
    /// the reverse route has no ETH/USDT asks and is skipped.
    fn market() -> StaticMarket {
        StaticMarket::new()
            .with_book(pair("BTC", "USDT"), book(&[(10.0, 100.0)], &[(9.9, 100.0)]))
            .with_book(pair("BTC", "ETH"), book(&[(2.1, 100.0)], &[(2.0, 100.0)]))
            .with_book(pair("ETH", "USDT"), book(&[], &[(5.2, 100.0)]))
    }

    fn scanner(config: Config, market: Arc<StaticMarket>, recorder: &Recorder) -> Scanner {
        let alerts = Alerts::new(Box::new(recorder.clone()), &config.alert_blacklist);
        Scanner::new(Arc::new(config), market, alerts)
    }

    fn running() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn test_cycle_accepts_ranks_and_alerts() {
        let recorder = Recorder::default();
        let mut scanner = scanner(config(), Arc::new(market()), &recorder);
        scanner.refresh().await.unwrap();
        assert_eq!(scanner.routes().len(), 2);

        let (_tx, rx) = running();
        let report = scanner.run_cycle(&rx).await;

        assert_eq!(report.scheduled, 2);
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.skipped.get("data_unavailable"), Some(&1));
        assert_eq!(report.rejected_total(), 0);
        assert_eq!(report.cancelled, 0);
        assert_eq!(report.alerts_sent, 1);

        let best = &report.ranked[0];
        assert_eq!(best.route.cross, pair("BTC", "ETH"));
        assert!((best.profit_pct() - 3.688_311_896).abs() < 1e-6);
        assert_eq!(recorder.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_rejections_are_counted() {
        let mut strict = config();
        strict.min_profit_pct = 10.0;
        let recorder = Recorder::default();
        let mut scanner = scanner(strict, Arc::new(market()), &recorder);
        scanner.refresh().await.unwrap();

        let (_tx, rx) = running();
        let report = scanner.run_cycle(&rx).await;
        assert_eq!(report.accepted(), 0);
        assert_eq!(report.rejected.get("below_threshold"), Some(&1));
        assert!(recorder.messages().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_book_skips_route_and_cycle_completes() {
        let market = StaticMarket::new()
            .with_book(pair("BTC", "USDT"), book(&[(10.0, 100.0)], &[]))
            .with_book(pair("BTC", "ETH"), book(&[(0.0, 1.0)], &[(2.0, 100.0)]))
            .with_book(pair("ETH", "USDT"), book(&[(5.3, 100.0)], &[(5.2, 100.0)]));
        let recorder = Recorder::default();
        let mut scanner = scanner(config(), Arc::new(market), &recorder);
        scanner.refresh().await.unwrap();

        let (_tx, rx) = running();
        let report = scanner.run_cycle(&rx).await;
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.skipped.get("invalid_price"), Some(&2));
        assert_eq!(report.accepted(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_unstarted_routes() {
        let market = Arc::new(market());
        let recorder = Recorder::default();
        let mut scanner = scanner(config(), Arc::clone(&market), &recorder);
        scanner.refresh().await.unwrap();

        let (tx, rx) = running();
        tx.send(true).unwrap();
        let report = scanner.run_cycle(&rx).await;

        assert_eq!(report.cancelled, 2);
        assert_eq!(report.evaluated, 0);
        assert_eq!(market.requests(), 0);
        assert!(report.to_string().contains("cancelled 2"));
    }

    #[tokio::test]
    async fn test_route_window_rotates_across_cycles() {
        let mut capped = config();
        capped.route_cap = 1;
        let market = Arc::new(market());
        let recorder = Recorder::default();
        let mut scanner = scanner(capped, Arc::clone(&market), &recorder);
        scanner.refresh().await.unwrap();
        let (_tx, rx) = running();

        // Route 0 fetches all three books
        let first = scanner.run_cycle(&rx).await;
        assert_eq!(first.scheduled, 1);
        assert_eq!(first.accepted(), 1);
        assert_eq!(market.requests(), 3);

        // Route 1 stops at its empty first leg
        let second = scanner.run_cycle(&rx).await;
        assert_eq!(second.skipped_total(), 1);
        assert_eq!(market.requests(), 4);

        // Wrapped back to route 0
        let third = scanner.run_cycle(&rx).await;
        assert_eq!(third.accepted(), 1);
        assert_eq!(market.requests(), 7);
    }

    #[tokio::test]
    async fn test_blacklisted_alerts_are_not_sent() {
        let mut cfg = config();
        cfg.alert_blacklist = vec!["ETH".to_string()];
        let recorder = Recorder::default();
        let mut scanner = scanner(cfg, Arc::new(market()), &recorder);
        scanner.refresh().await.unwrap();

        let (_tx, rx) = running();
        let report = scanner.run_cycle(&rx).await;
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.alerts_sent, 0);
        assert!(recorder.messages().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_when_shutdown_already_requested() {
        let recorder = Recorder::default();
        let mut scanner = scanner(config(), Arc::new(market()), &recorder);
        let (tx, rx) = running();
        tx.send(true).unwrap();

        scanner.run(rx).await.unwrap();
        assert!(scanner.snapshot().is_some());
        assert!(recorder.messages().is_empty());
    }

    /// Provider whose listing always fails
    struct Down;

    #[async_trait]
    impl MarketDataProvider for Down {
        async fn list_pairs(&self) -> Result<Vec<PairListing>> {
            bail!("exchange unreachable")
        }

        async fn fetch_order_book(&self, _pair: &PairId) -> Result<OrderBook> {
            bail!("exchange unreachable")
        }
    }

    #[tokio::test]
    async fn test_initial_listing_failure_is_fatal() {
        let alerts = Alerts::new(Box::new(Recorder::default()), Vec::<String>::new());
        let mut scanner = Scanner::new(Arc::new(config()), Arc::new(Down), alerts);
        assert!(scanner.needs_refresh());
        assert!(scanner.ensure_fresh().await.is_err());

        let (_tx, rx) = running();
        assert!(scanner.run(rx).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_route_set_cycle() {
        let recorder = Recorder::default();
        let mut scanner = scanner(config(), Arc::new(StaticMarket::new()), &recorder);
        scanner.refresh().await.unwrap();

        let (_tx, rx) = running();
        let report = scanner.run_cycle(&rx).await;
        assert_eq!(report.scheduled, 0);
        assert_eq!(report.evaluated, 0);
        assert!(report.to_string().contains("no opportunities above threshold"));
    }
}
