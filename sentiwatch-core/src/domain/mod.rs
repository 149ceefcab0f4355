//! Domain types for SentiWatch

pub mod article;
pub mod bar;
pub mod record;
pub mod score;
pub mod series;

pub use article::{NewsArticle, ScoredArticle};
pub use bar::PriceBar;
pub use record::AlignedRecord;
pub use score::{ScoreDetail, ScoringResult, SentimentLabel, Technique};
pub use series::{IntradayInterval, PriceSeries, SeriesKind};
