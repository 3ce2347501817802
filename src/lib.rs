//! # repack-search
//!
//! Finds a game across several repack catalogs and picks the best link from
//! each.
//!
//! Catalog sites are scraped through small source adapters that never fail:
//! a site that is down, changed its markup, or has nothing close enough to the
//! query simply contributes no candidate. The aggregator decides which
//! adapters run for a query, and in what order their answers are presented:
//!
//! - Title variants and fuzzy title similarity for matching
//! - Verification of search hits by fetching the hit's page
//! - Online-game preference for queries mentioning "online"
//! - Retry with exponential backoff and request pacing for HTTP
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use repack_search::{Aggregator, HttpFetcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = Arc::new(HttpFetcher::new()?);
//!     let aggregator = Aggregator::with_defaults(fetcher);
//!
//!     let result = aggregator.aggregate("elden ring").await;
//!     for candidate in result.ordered() {
//!         println!("{}: {} ({:.2})", candidate.source, candidate.url, candidate.score);
//!     }
//!     Ok(())
//! }
//! ```

mod aggregator;
mod config;
mod engine;
mod error;
mod fetcher;
mod fetcher_http;
mod html;
mod result;
mod similarity;

pub mod engines;
pub mod metadata;
pub mod query;
pub mod session;

pub use aggregator::{priority_order, Aggregator};
pub use config::{BackoffPolicy, FetchConfig, DEFAULT_USER_AGENT, MAX_BACKOFF_DELAY};
pub use engine::{SourceAdapter, SourceConfig};
pub use error::{Result, SearchError};
pub use fetcher::{FetchRequest, FetchResponse, Method, PageFetcher, Sleeper, TokioSleeper};
pub use fetcher_http::HttpFetcher;
pub use metadata::{DownloadLink, Metadata, MetadataExtractor};
pub use query::{QueryIntent, SearchQuery};
pub use result::{AggregatedResult, Candidate, PlayTime, SourceId};
pub use session::{Role, Session, Turn};
pub use similarity::similarity;
