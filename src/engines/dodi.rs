//! DODI repack catalog adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::plus_encoded;
use crate::fetcher::PageFetcher;
use crate::html::listing;
use crate::query::is_conversational;
use crate::similarity::similarity;
use crate::{Candidate, SourceAdapter, SourceConfig, SourceId};

/// Search entries inspected.
const SEARCH_LIMIT: usize = 3;
/// Minimum title similarity to accept an entry.
const ACCEPT_SCORE: f64 = 0.6;

/// DODI repacks adapter.
///
/// Single-shot: one keyword search with the raw query, first good-enough
/// entry wins.
pub struct Dodi {
    config: SourceConfig,
    fetcher: Arc<dyn PageFetcher>,
}

impl Dodi {
    /// Creates a new DODI adapter.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: SourceConfig::new("DODI", "dodi", "https://dodi-repacks.site"),
            fetcher,
        }
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: SourceConfig) -> Self {
        self.config = config;
        self
    }

    fn search_url(&self, query: &str) -> String {
        format!("{}/?s={}", self.config.base_url, plus_encoded(query))
    }
}

#[async_trait]
impl SourceAdapter for Dodi {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn source(&self) -> SourceId {
        SourceId::Dodi
    }

    async fn search(&self, query: &str) -> Option<Candidate> {
        if is_conversational(query) {
            return None;
        }

        let url = self.search_url(query);
        let html = match self.fetcher.get_html(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("DODI search failed for {:?}: {}", query, e);
                return None;
            }
        };

        let entries = match listing(&html, &url, "h2.title a", SEARCH_LIMIT) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("DODI: {}", e);
                return None;
            }
        };

        entries.into_iter().find_map(|entry| {
            let score = similarity(query, &entry.title);
            debug!("DODI: {:?} scored {:.3}", entry.title, score);
            (score > ACCEPT_SCORE)
                .then(|| Candidate::new(SourceId::Dodi, entry.url, entry.title, score))
        })
    }
}
