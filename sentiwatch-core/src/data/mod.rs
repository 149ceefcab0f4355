//! Data sources and normalization

pub mod alpha_vantage;
pub mod http;
pub mod news;
pub mod newsapi;
pub mod normalize;
pub mod provider;
pub mod replay;

pub use alpha_vantage::AlphaVantageClient;
pub use news::{parse_articles, sort_by_published, NewsError};
pub use newsapi::NewsApiClient;
pub use normalize::normalize;
pub use provider::{DataError, NewsRequest, NewsSource, PriceRequest, PriceSource};
pub use replay::{ReplayNewsSource, ReplayPriceSource};
