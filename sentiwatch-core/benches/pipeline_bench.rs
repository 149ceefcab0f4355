//! Criterion benchmarks for the pipeline's hot paths.
//!
//! Benchmarks:
//! 1. Series normalization (raw payload to sorted bars)
//! 2. Indicator attach (moving average + Bollinger bands)
//! 3. As-of alignment (bars x articles sweep)
//! 4. Lexicon scoring (per-headline VADER)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};

use sentiwatch_core::align::align_backward;
use sentiwatch_core::data::normalize;
use sentiwatch_core::domain::{
    NewsArticle, PriceBar, PriceSeries, ScoredArticle, ScoringResult, SeriesKind,
};
use sentiwatch_core::indicators::{compute_bollinger, compute_moving_average};
use sentiwatch_core::sentiment::{LexiconScorer, SentimentScorer};

// ── Helpers ──────────────────────────────────────────────────────────

fn base() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn make_payload(n: usize) -> Value {
    let mut records = Map::new();
    for i in 0..n {
        let day = base().date() + chrono::Duration::days(i as i64);
        let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
        records.insert(
            day.format("%Y-%m-%d").to_string(),
            json!({
                "1. open": format!("{:.4}", close - 0.3),
                "2. high": format!("{:.4}", close + 1.5),
                "3. low": format!("{:.4}", close - 1.5),
                "4. close": format!("{:.4}", close),
                "5. volume": "1000000",
            }),
        );
    }
    json!({ "Time Series (Daily)": Value::Object(records) })
}

fn make_series(n: usize) -> PriceSeries {
    let bars: Vec<PriceBar> = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            PriceBar {
                timestamp: base() + chrono::Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: Some(1_000_000.0),
            }
        })
        .collect();
    PriceSeries::new("BENCH", SeriesKind::Daily, bars)
}

fn make_news(n: usize, span_days: i64) -> Vec<ScoredArticle> {
    (0..n)
        .map(|i| ScoredArticle {
            article: NewsArticle {
                published_at: base()
                    + chrono::Duration::hours((i as i64 * 24 * span_days) / n.max(1) as i64),
                title: format!("headline {i}"),
                description: String::new(),
                source_name: "Bench".into(),
                url: format!("https://example.com/{i}"),
            },
            score: Some(ScoringResult::lexicon(0.1, 0.8, 0.1, 0.0)),
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    for n in [100, 1000, 5000] {
        let payload = make_payload(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &payload, |b, payload| {
            b.iter(|| normalize(black_box(payload), SeriesKind::Daily))
        });
    }
    group.finish();
}

fn bench_indicators(c: &mut Criterion) {
    let series = make_series(5000);
    let mut group = c.benchmark_group("indicators");
    for window in [5, 20, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |b, &w| {
            b.iter(|| compute_bollinger(&compute_moving_average(black_box(&series), w), w))
        });
    }
    group.finish();
}

fn bench_align(c: &mut Criterion) {
    let series = make_series(5000);
    let mut group = c.benchmark_group("align");
    for articles in [10, 100, 1000] {
        let news = make_news(articles, 5000);
        group.bench_with_input(BenchmarkId::from_parameter(articles), &news, |b, news| {
            b.iter(|| align_backward(black_box(&series), black_box(news)))
        });
    }
    group.finish();
}

fn bench_lexicon(c: &mut Criterion) {
    let scorer = LexiconScorer::new();
    c.bench_function("lexicon_headline", |b| {
        b.iter(|| scorer.score(black_box("Shares rally after upbeat guidance, analysts cheer")))
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_indicators,
    bench_align,
    bench_lexicon,
);
criterion_main!(benches);
