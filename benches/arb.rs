use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use trine::arb::classifier::Classifier;
use trine::arb::fill::{fill, Target};
use trine::arb::market::MarketSnapshot;
use trine::arb::route::{build_routes, Route};
use trine::arb::sequencer::Sequencer;
use trine::arb::types::{Level, OrderBook, PairId, PairListing};

/// Price ceiling used throughout the benchmarks
const CEILING: f64 = 1_000_000.0;

/// Generate one book side of `depth` levels walking away from `start`
fn generate_levels(rng: &mut impl Rng, depth: usize, start: f64, step: f64) -> Vec<Level> {
    (0..depth)
        .map(|i| {
            let price = (start + step * i as f64).max(0.000_001);
            Level::new(price, rng.random_range(0.01..50.0))
        })
        .collect()
}

/// Generate a synthetic listing of `currency_count` currencies quoted in
/// USDT plus `cross_count` random cross pairs between them
fn generate_listings(currency_count: usize, cross_count: usize) -> Vec<PairListing> {
    let mut rng = rand::rng();
    let currencies: Vec<String> = (0..currency_count).map(|i| format!("C{i}")).collect();

    let mut listings: Vec<PairListing> = currencies
        .iter()
        .map(|c| PairListing {
            id: PairId::new(c, "USDT"),
            active: true,
        })
        .collect();

    for _ in 0..cross_count {
        let idx1 = rng.random_range(0..currency_count);
        let mut idx2 = rng.random_range(0..currency_count);

        // Ensure currencies are different
        while idx1 == idx2 {
            idx2 = rng.random_range(0..currency_count);
        }

        listings.push(PairListing {
            id: PairId::new(&currencies[idx1], &currencies[idx2]),
            active: rng.random_bool(0.95),
        });
    }

    listings
}

/// Benchmark walking a book for notional targets of growing size
fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");
    let mut rng = rand::rng();

    for depth in [10, 50, 200].iter() {
        let asks = generate_levels(&mut rng, *depth, 100.0, 0.05);
        let available: f64 = asks.iter().map(Level::notional).sum();

        group.throughput(criterion::Throughput::Elements(*depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, _| {
            b.iter(|| {
                // Ask for 90% of the side so most levels are walked
                black_box(fill(&asks, Target::Notional(available * 0.9), CEILING))
            });
        });
    }

    group.finish();
}

/// Benchmark route enumeration on synthetic markets
fn bench_build_routes(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_routes");

    // Configure measurement settings for more accurate results
    group.sample_size(10);
    group.measurement_time(std::time::Duration::from_secs(5));

    let settlements = vec!["USDT".to_string()];

    for currency_count in [50, 200, 600].iter() {
        let listings = generate_listings(*currency_count, currency_count * 4);
        println!(
            "BENCHMARK: {} currencies, {} listed pairs",
            currency_count,
            listings.len()
        );

        group.throughput(criterion::Throughput::Elements(listings.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(currency_count),
            currency_count,
            |b, _| {
                b.iter_batched(
                    || MarketSnapshot::new(listings.clone()),
                    |snapshot| black_box(build_routes(&snapshot, &settlements)),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark a full three-leg evaluation against frozen books
fn bench_evaluate_books(c: &mut Criterion) {
    let mut rng = rand::rng();
    let sequencer = Sequencer::new(100.0, 0.001, CEILING, Classifier::default());

    let route = Route::new(
        PairId::new("BTC", "USDT"),
        PairId::new("BTC", "ETH"),
        PairId::new("ETH", "USDT"),
    )
    .unwrap();

    let first = OrderBook {
        asks: generate_levels(&mut rng, 50, 65_000.0, 1.0),
        bids: generate_levels(&mut rng, 50, 64_999.0, -1.0),
    };
    let cross = OrderBook {
        asks: generate_levels(&mut rng, 50, 20.01, 0.001),
        bids: generate_levels(&mut rng, 50, 20.0, -0.001),
    };
    let last = OrderBook {
        asks: generate_levels(&mut rng, 50, 3_250.0, 0.1),
        bids: generate_levels(&mut rng, 50, 3_249.9, -0.1),
    };

    c.bench_function("evaluate_books", |b| {
        b.iter(|| black_box(sequencer.evaluate_books(&route, [&first, &cross, &last])));
    });
}

criterion_group!(benches, bench_fill, bench_build_routes, bench_evaluate_books);
criterion_main!(benches);
