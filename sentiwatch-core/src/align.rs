//! Temporal Aligner: backward (as-of) join of prices and scored news.
//!
//! Every bar is paired with the latest article whose `published_at` is at or
//! before the bar's timestamp. Several bars may share one article; bars
//! before the first article carry none. Ties among articles resolve to the
//! last one in sorted order.
//!
//! The join is a single two-pointer sweep, O(n + m) over inputs that are
//! already sorted. Unsorted inputs are put in order first (stable).

use chrono::NaiveDateTime;

use crate::domain::{AlignedRecord, NewsArticle, PriceBar, PriceSeries, ScoredArticle};
use crate::indicators::{BOLLINGER_LOWER, BOLLINGER_UPPER, MOVING_AVERAGE};

/// Anything carrying the timestamp it is joined on.
pub trait Timestamped {
    fn timestamp(&self) -> NaiveDateTime;
}

impl Timestamped for PriceBar {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl Timestamped for NewsArticle {
    fn timestamp(&self) -> NaiveDateTime {
        self.published_at
    }
}

impl Timestamped for ScoredArticle {
    fn timestamp(&self) -> NaiveDateTime {
        self.article.published_at
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn timestamp(&self) -> NaiveDateTime {
        (**self).timestamp()
    }
}

/// For each left item, the index of the last right item at or before it.
///
/// Both slices must be sorted ascending by timestamp.
pub fn asof_indices<L: Timestamped, R: Timestamped>(left: &[L], right: &[R]) -> Vec<Option<usize>> {
    let mut out = Vec::with_capacity(left.len());
    // Count of right items with timestamp <= the current left timestamp.
    let mut seen = 0;
    for item in left {
        let t = item.timestamp();
        while seen < right.len() && right[seen].timestamp() <= t {
            seen += 1;
        }
        out.push(seen.checked_sub(1));
    }
    out
}

/// Fractional close-to-close change; `None` for the first bar and whenever
/// the previous close is zero or not finite.
pub fn price_changes(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);
    for pair in closes.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let change = (prev != 0.0 && prev.is_finite()).then(|| (curr - prev) / prev);
        out.push(change.filter(|c| c.is_finite()));
    }
    out
}

/// Permutation that orders `items` ascending by timestamp (identity if already sorted).
fn sorted_order<T: Timestamped>(items: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    let sorted = items
        .windows(2)
        .all(|pair| pair[0].timestamp() <= pair[1].timestamp());
    if !sorted {
        order.sort_by_key(|&i| items[i].timestamp());
    }
    order
}

/// Join a price series with scored news, as of each bar.
///
/// Output is ordered by bar timestamp and carries the bar's indicator
/// columns plus its `price_change`.
pub fn align_backward(series: &PriceSeries, news: &[ScoredArticle]) -> Vec<AlignedRecord> {
    let bar_order = sorted_order(&series.bars);
    let news_order = sorted_order(news);

    let bars: Vec<&PriceBar> = bar_order.iter().map(|&i| &series.bars[i]).collect();
    let articles: Vec<&ScoredArticle> = news_order.iter().map(|&i| &news[i]).collect();

    let matches = asof_indices(&bars, &articles);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let changes = price_changes(&closes);

    bar_order
        .iter()
        .zip(bars)
        .zip(matches)
        .zip(changes)
        .map(|(((&source_index, bar), matched), price_change)| AlignedRecord {
            bar: bar.clone(),
            moving_average: series.column_value(MOVING_AVERAGE, source_index),
            bollinger_upper: series.column_value(BOLLINGER_UPPER, source_index),
            bollinger_lower: series.column_value(BOLLINGER_LOWER, source_index),
            article: matched.map(|j| articles[j].clone()),
            price_change,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScoringResult, SeriesKind};
    use crate::indicators::{assert_approx, compute_moving_average, make_bars, DEFAULT_EPSILON};
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn bars_at_hours(hours: &[i64], closes: &[f64]) -> Vec<PriceBar> {
        let mut bars = make_bars(closes);
        for (bar, h) in bars.iter_mut().zip(hours) {
            bar.timestamp = t0() + Duration::hours(*h);
        }
        bars
    }

    fn article_at_minutes(minutes: i64, title: &str, scalar: f64) -> ScoredArticle {
        ScoredArticle {
            article: NewsArticle {
                published_at: t0() + Duration::minutes(minutes),
                title: title.to_string(),
                description: String::new(),
                source_name: "Wire".into(),
                url: format!("https://example.com/{title}"),
            },
            score: Some(ScoringResult::lexicon(0.0, 1.0, 0.0, scalar)),
        }
    }

    #[test]
    fn article_between_bars_attaches_to_later_bars() {
        // Bars at t=1,2,3,4 hours; one article at t=2.5 hours.
        let series = PriceSeries::new(
            "T",
            SeriesKind::Daily,
            bars_at_hours(&[1, 2, 3, 4], &[10.0, 11.0, 12.0, 13.0]),
        );
        let news = vec![article_at_minutes(150, "mid", 0.5)];
        let records = align_backward(&series, &news);

        let attached: Vec<bool> = records.iter().map(AlignedRecord::has_article).collect();
        assert_eq!(attached, vec![false, false, true, true]);
        assert_eq!(records[2].article, records[3].article);
        assert_eq!(records[3].sentiment(), Some(0.5));
    }

    #[test]
    fn article_at_bar_timestamp_is_included() {
        let series = PriceSeries::new("T", SeriesKind::Daily, bars_at_hours(&[1, 2], &[1.0, 2.0]));
        let news = vec![article_at_minutes(60, "exact", 0.1)];
        let records = align_backward(&series, &news);
        assert!(records[0].has_article());
    }

    #[test]
    fn latest_preceding_article_wins() {
        let series = PriceSeries::new("T", SeriesKind::Daily, bars_at_hours(&[5], &[1.0]));
        let news = vec![
            article_at_minutes(60, "early", 0.1),
            article_at_minutes(240, "late", 0.9),
            article_at_minutes(400, "future", -0.9),
        ];
        let records = align_backward(&series, &news);
        assert_eq!(records[0].article.as_ref().unwrap().article.title, "late");
    }

    #[test]
    fn unsorted_inputs_are_sorted_first() {
        let mut bars = bars_at_hours(&[1, 2, 3], &[10.0, 20.0, 30.0]);
        bars.swap(0, 2);
        let series = PriceSeries::new("T", SeriesKind::Daily, bars);
        let news = vec![
            article_at_minutes(150, "b", 0.2),
            article_at_minutes(30, "a", 0.1),
        ];
        let records = align_backward(&series, &news);

        let closes: Vec<f64> = records.iter().map(|r| r.bar.close).collect();
        assert_eq!(closes, vec![10.0, 20.0, 30.0]);
        assert_eq!(records[0].article.as_ref().unwrap().article.title, "a");
        assert_eq!(records[2].article.as_ref().unwrap().article.title, "b");
    }

    #[test]
    fn empty_news_yields_unattached_records() {
        let series = PriceSeries::new("T", SeriesKind::Daily, make_bars(&[1.0, 2.0]));
        let records = align_backward(&series, &[]);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.has_article()));
    }

    #[test]
    fn price_change_known_values() {
        let changes = price_changes(&[100.0, 110.0, 99.0]);
        assert_eq!(changes[0], None);
        assert_approx(changes[1].unwrap(), 0.10, DEFAULT_EPSILON);
        assert_approx(changes[2].unwrap(), -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn price_change_after_zero_close_is_none() {
        assert_eq!(price_changes(&[0.0, 5.0]), vec![None, None]);
        assert!(price_changes(&[]).is_empty());
    }

    #[test]
    fn records_carry_indicator_columns() {
        let series = compute_moving_average(
            &PriceSeries::new("T", SeriesKind::Daily, make_bars(&[1.0, 2.0, 3.0])),
            2,
        );
        let records = align_backward(&series, &[]);
        assert_eq!(records[0].moving_average, None);
        assert_eq!(records[1].moving_average, Some(1.5));
        assert_eq!(records[2].bollinger_upper, None);
    }

    #[test]
    fn ties_resolve_to_last_article() {
        let series = PriceSeries::new("T", SeriesKind::Daily, bars_at_hours(&[3], &[1.0]));
        let news = vec![
            article_at_minutes(60, "first", 0.1),
            article_at_minutes(60, "second", 0.2),
        ];
        let records = align_backward(&series, &news);
        assert_eq!(records[0].article.as_ref().unwrap().article.title, "second");
    }
}
