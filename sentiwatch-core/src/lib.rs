//! Sentiwatch Core: price and news normalization, indicators, sentiment scoring, alignment.
//!
//! This crate holds the pure and provider-facing pieces of the pipeline:
//! - Domain types (bars, series, articles, scores, aligned records)
//! - Price and news sources with their normalizers
//! - Moving average and Bollinger band indicators
//! - Sentiment techniques behind a single scorer trait
//! - As-of backward alignment of prices with scored news

pub mod align;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod sentiment;
pub mod stats;
