//! Pipeline Orchestrator: one full, independent run per call.
//!
//! Sequence: fetch prices, normalize, attach indicators, fetch news, score
//! every article under each registered technique, align once per
//! technique, summarize.
//!
//! Failures on the price side abort the run. Failures local to one article
//! or one technique are recorded as `PipelineIssue`s and skipped. Overlapping
//! runs on the same `Pipeline` are rejected with `PipelineError::Busy`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use sentiwatch_core::align::align_backward;
use sentiwatch_core::data::{
    normalize, parse_articles, sort_by_published, AlphaVantageClient, DataError, NewsApiClient,
    NewsError, NewsRequest, NewsSource, PriceRequest, PriceSource, ReplayNewsSource,
    ReplayPriceSource,
};
use sentiwatch_core::domain::{
    AlignedRecord, NewsArticle, PriceSeries, ScoredArticle, ScoringResult, Technique,
};
use sentiwatch_core::indicators::{compute_bollinger, compute_moving_average};
use sentiwatch_core::sentiment::{ScoreError, ScorerRegistry, SentimentScorer};

use crate::config::{ConfigError, Credentials, RunConfig, Settings};
use crate::summary::RunSummary;

/// Current schema version of `PipelineOutput`.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("a pipeline run is already in progress")]
    Busy,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("price data error: {0}")]
    Data(#[from] DataError),
    #[error("failed to serialize aligned output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a recovered issue was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The news fetch failed; the run continued with no articles.
    NewsUnavailable,
    MalformedArticle,
    TechniqueUnavailable,
    /// A technique failed for one article's text.
    ScoringFailed,
}

/// A recovered, non-fatal issue recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineIssue {
    pub kind: IssueKind,
    pub technique: Option<Technique>,
    /// Article position: in the news payload for malformed articles, in the
    /// run's sorted article list for scoring failures.
    pub article: Option<usize>,
    pub message: String,
}

impl PipelineIssue {
    fn news_unavailable(err: &DataError) -> Self {
        Self {
            kind: IssueKind::NewsUnavailable,
            technique: None,
            article: None,
            message: err.to_string(),
        }
    }

    fn malformed(err: &NewsError) -> Self {
        let NewsError::MalformedArticle { index, .. } = err;
        Self {
            kind: IssueKind::MalformedArticle,
            technique: None,
            article: Some(*index),
            message: err.to_string(),
        }
    }

    fn score(err: &ScoreError, article: Option<usize>) -> Self {
        let (kind, technique) = match err {
            ScoreError::TechniqueUnavailable(t) => (IssueKind::TechniqueUnavailable, *t),
            ScoreError::ScoringFailed { technique, .. } => (IssueKind::ScoringFailed, *technique),
        };
        Self {
            kind,
            technique: Some(technique),
            article,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for PipelineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One well-formed article with every available technique's scores of its
/// title and its description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleReport {
    pub article: NewsArticle,
    pub title_scores: BTreeMap<Technique, ScoringResult>,
    pub description_scores: BTreeMap<Technique, ScoringResult>,
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub schema_version: u32,
    /// The validated configuration the run used.
    pub config: RunConfig,
    /// Normalized prices with indicator columns.
    pub series: PriceSeries,
    /// Aligned records per available technique. Unavailable techniques are absent.
    pub aligned: BTreeMap<Technique, Vec<AlignedRecord>>,
    /// Well-formed articles, ascending by `published_at`.
    pub articles: Vec<ArticleReport>,
    pub issues: Vec<PipelineIssue>,
    pub summary: RunSummary,
}

impl PipelineOutput {
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &PipelineIssue> + '_ {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

/// Marks a pipeline busy for the lifetime of one run.
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Result<Self, PipelineError> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PipelineError::Busy)?;
        Ok(Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Articles scored under one technique, in article order.
struct TechniqueScores {
    titles: Vec<Option<ScoringResult>>,
    descriptions: Vec<Option<ScoringResult>>,
}

/// The orchestrator. Holds its sources and the scorer registry, built once.
pub struct Pipeline {
    prices: Box<dyn PriceSource>,
    news: Box<dyn NewsSource>,
    scorers: ScorerRegistry,
    running: AtomicBool,
}

impl Pipeline {
    pub fn new(
        prices: Box<dyn PriceSource>,
        news: Box<dyn NewsSource>,
        scorers: ScorerRegistry,
    ) -> Self {
        Self {
            prices,
            news,
            scorers,
            running: AtomicBool::new(false),
        }
    }

    /// Live HTTP sources using the settings' timeout.
    pub fn live(
        settings: &Settings,
        credentials: &Credentials,
        scorers: ScorerRegistry,
    ) -> Result<Self, PipelineError> {
        let timeout = settings.timeout()?;
        let prices = AlphaVantageClient::new(credentials.price_api_key.clone(), timeout)?;
        let news = NewsApiClient::new(credentials.news_api_key.clone(), timeout)?;
        Ok(Self::new(Box::new(prices), Box::new(news), scorers))
    }

    /// Sources that replay `price.json` and `news.json` from `dir`.
    pub fn replay(dir: &Path, scorers: ScorerRegistry) -> Self {
        Self::new(
            Box::new(ReplayPriceSource::new(dir)),
            Box::new(ReplayNewsSource::new(dir)),
            scorers,
        )
    }

    pub fn scorers(&self) -> &ScorerRegistry {
        &self.scorers
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run the whole pipeline once.
    pub fn run(&self, config: &RunConfig) -> Result<PipelineOutput, PipelineError> {
        let _guard = RunGuard::acquire(&self.running)?;
        let config = config.clone().validated()?;
        info!(
            symbol = %config.symbol,
            series = %config.series,
            ma_window = config.ma_window,
            articles = config.article_count,
            "pipeline run started"
        );

        let series = self.load_series(&config)?;
        let mut issues = Vec::new();
        let (articles, skipped) = self.load_articles(&config, &mut issues);

        let mut aligned = BTreeMap::new();
        let mut scored_by_technique = BTreeMap::new();
        let mut reports: Vec<ArticleReport> = articles
            .iter()
            .map(|article| ArticleReport {
                article: article.clone(),
                title_scores: BTreeMap::new(),
                description_scores: BTreeMap::new(),
            })
            .collect();

        for technique in Technique::ALL {
            let scorer = match self.scorers.get(technique) {
                Ok(scorer) => scorer,
                Err(e) => {
                    warn!(%technique, "technique unavailable; skipping");
                    issues.push(PipelineIssue::score(&e, None));
                    continue;
                }
            };

            let scores = score_articles(scorer, &articles, &mut issues);
            for (report, (title, description)) in reports
                .iter_mut()
                .zip(scores.titles.iter().zip(&scores.descriptions))
            {
                if let Some(r) = title {
                    report.title_scores.insert(technique, r.clone());
                }
                if let Some(r) = description {
                    report.description_scores.insert(technique, r.clone());
                }
            }

            let scored: Vec<ScoredArticle> = articles
                .iter()
                .cloned()
                .zip(scores.titles)
                .map(|(article, score)| ScoredArticle { article, score })
                .collect();
            let records = align_backward(&series, &scored);
            debug!(
                %technique,
                attached = records.iter().filter(|r| r.has_article()).count(),
                "aligned"
            );
            aligned.insert(technique, records);
            scored_by_technique.insert(technique, scored);
        }

        let summary =
            RunSummary::compute(&series, &aligned, &scored_by_technique, articles.len(), skipped)?;
        info!(
            symbol = %config.symbol,
            bars = summary.bar_count,
            articles = summary.article_count,
            techniques = aligned.len(),
            issues = issues.len(),
            digest = %summary.digest,
            "pipeline run finished"
        );

        Ok(PipelineOutput {
            schema_version: SCHEMA_VERSION,
            config,
            series,
            aligned,
            articles: reports,
            issues,
            summary,
        })
    }

    /// Fetch, normalize, and attach indicators. Any failure aborts the run.
    fn load_series(&self, config: &RunConfig) -> Result<PriceSeries, PipelineError> {
        let request = PriceRequest {
            symbol: config.symbol.clone(),
            series: config.series,
        };
        let payload = self.prices.fetch_prices(&request).map_err(|e| {
            warn!(source = self.prices.name(), error = %e, "price fetch failed");
            e
        })?;

        let bars = normalize(&payload, config.series)?;
        if bars.is_empty() {
            return Err(DataError::NoData {
                series_key: config.series.series_key(),
                detail: Some("series is empty".into()),
            }
            .into());
        }
        let inconsistent = bars.iter().filter(|bar| !bar.is_consistent()).count();
        if inconsistent > 0 {
            warn!(symbol = %config.symbol, inconsistent, "bars with prices outside their high/low range");
        }
        info!(symbol = %config.symbol, bars = bars.len(), "prices normalized");

        let series = PriceSeries::new(config.symbol.clone(), config.series, bars);
        let mut series = compute_moving_average(&series, config.ma_window);
        if config.show_bollinger {
            series = compute_bollinger(&series, config.ma_window);
        }
        Ok(series)
    }

    /// Fetch and validate news. Returns well-formed articles in ascending
    /// order plus the count of malformed ones.
    fn load_articles(
        &self,
        config: &RunConfig,
        issues: &mut Vec<PipelineIssue>,
    ) -> (Vec<NewsArticle>, usize) {
        let request = NewsRequest {
            query: config.symbol.clone(),
            page_size: config.article_count,
        };
        let parsed = self
            .news
            .fetch_news(&request)
            .and_then(|payload| parse_articles(&payload));

        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(source = self.news.name(), error = %e, "news unavailable; continuing without articles");
                issues.push(PipelineIssue::news_unavailable(&e));
                return (Vec::new(), 0);
            }
        };

        let mut articles = Vec::with_capacity(parsed.len());
        let mut skipped = 0;
        for result in parsed {
            match result {
                Ok(article) => articles.push(article),
                Err(e) => {
                    warn!(error = %e, "skipping malformed article");
                    issues.push(PipelineIssue::malformed(&e));
                    skipped += 1;
                }
            }
        }
        sort_by_published(&mut articles);
        info!(articles = articles.len(), skipped, "news normalized");
        (articles, skipped)
    }
}

/// Score every article's title and description in parallel.
///
/// Per-article failures become `ScoringFailed` issues and `None` scores.
fn score_articles(
    scorer: &dyn SentimentScorer,
    articles: &[NewsArticle],
    issues: &mut Vec<PipelineIssue>,
) -> TechniqueScores {
    let results: Vec<(Result<ScoringResult, ScoreError>, Result<ScoringResult, ScoreError>)> =
        articles
            .par_iter()
            .map(|a| (scorer.score(&a.title), scorer.score(&a.description)))
            .collect();

    let mut titles = Vec::with_capacity(results.len());
    let mut descriptions = Vec::with_capacity(results.len());
    for (index, (title, description)) in results.into_iter().enumerate() {
        for (result, out) in [(title, &mut titles), (description, &mut descriptions)] {
            match result {
                Ok(r) => out.push(Some(r)),
                Err(e) => {
                    warn!(technique = %scorer.technique(), article = index, error = %e, "scoring failed");
                    issues.push(PipelineIssue::score(&e, Some(index)));
                    out.push(None);
                }
            }
        }
    }
    TechniqueScores {
        titles,
        descriptions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejects_second_acquire_and_releases_on_drop() {
        let running = AtomicBool::new(false);
        let guard = RunGuard::acquire(&running).unwrap();
        assert!(matches!(
            RunGuard::acquire(&running),
            Err(PipelineError::Busy)
        ));
        drop(guard);
        assert!(RunGuard::acquire(&running).is_ok());
    }

    #[test]
    fn score_issue_carries_technique() {
        let issue = PipelineIssue::score(&ScoreError::TechniqueUnavailable(Technique::Model), None);
        assert_eq!(issue.kind, IssueKind::TechniqueUnavailable);
        assert_eq!(issue.technique, Some(Technique::Model));
        assert_eq!(issue.to_string(), "sentiment technique 'model' is unavailable");
    }

    #[test]
    fn malformed_issue_carries_article_index() {
        let issue = PipelineIssue::malformed(&NewsError::MalformedArticle {
            index: 3,
            reason: "missing 'description'".into(),
        });
        assert_eq!(issue.kind, IssueKind::MalformedArticle);
        assert_eq!(issue.article, Some(3));
    }
}
