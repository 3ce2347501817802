//! Game3rb adapter, specialised for online games.
//!
//! Combines the site's "online games" category listing, where membership is
//! itself evidence, with a keyword search whose hits must show some sign of
//! being an online game.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use serde::Serialize;
use tracing::{debug, warn};

use super::{fetch_for_verification, plus_encoded};
use crate::fetcher::PageFetcher;
use crate::html::{listing, page_text, selector, text_of, ListingEntry};
use crate::query::{is_conversational, strip_online};
use crate::result::best_candidate;
use crate::similarity::similarity;
use crate::{Candidate, SourceAdapter, SourceConfig, SourceId};

const ENTRY_SELECTOR: &str = "article h2.post-title a";
/// Category entries inspected.
const CATEGORY_LIMIT: usize = 20;
/// Minimum similarity for a category entry.
const CATEGORY_MIN_SCORE: f64 = 0.4;
/// Flat boost for category membership.
const CATEGORY_BOOST: f64 = 0.2;
/// Search entries inspected.
const SEARCH_LIMIT: usize = 8;

const CATEGORY_TAG_BOOST: f64 = 0.25;
const TITLE_BOOST: f64 = 0.15;
const KEYWORD_BOOST: f64 = 0.1;

const ONLINE_KEYWORDS: &[&str] = &[
    "multiplayer",
    "browser game",
    "online game",
    "play online",
    "web-based",
];

/// Evidence that a game page describes an online game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OnlineSignals {
    /// A category tag mentions "online".
    pub category_tag: bool,
    /// The listed title mentions "online".
    pub title: bool,
    /// The page body contains one of the online keywords.
    pub keyword: bool,
}

impl OnlineSignals {
    /// Returns true if any signal fired.
    pub fn is_online(&self) -> bool {
        self.category_tag || self.title || self.keyword
    }

    /// Returns the score boost these signals earn.
    pub fn boost(&self) -> f64 {
        let mut boost = 0.0;
        if self.category_tag {
            boost += CATEGORY_TAG_BOOST;
        }
        if self.title {
            boost += TITLE_BOOST;
        }
        if self.keyword {
            boost += KEYWORD_BOOST;
        }
        boost
    }
}

/// Inspects a game page for online signals. `title` is the title listed in
/// the search results.
pub fn online_signals(html: &str, title: &str) -> OnlineSignals {
    let document = Html::parse_document(html);

    let category_tag = match selector("a[rel='category tag']") {
        Ok(tags) => document
            .select(&tags)
            .any(|tag| text_of(tag).to_lowercase().contains("online")),
        Err(e) => {
            warn!("Game3rb: {}", e);
            false
        }
    };

    let body = page_text(&document).to_lowercase();

    OnlineSignals {
        category_tag,
        title: title.to_lowercase().contains("online"),
        keyword: ONLINE_KEYWORDS.iter().any(|k| body.contains(k)),
    }
}

/// Game3rb adapter.
pub struct Game3rb {
    config: SourceConfig,
    fetcher: Arc<dyn PageFetcher>,
}

impl Game3rb {
    /// Creates a new Game3rb adapter.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: SourceConfig::new("Game3rb", "g3", "https://game3rb.com"),
            fetcher,
        }
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: SourceConfig) -> Self {
        self.config = config;
        self
    }

    fn category_url(&self) -> String {
        format!("{}/category/games/online/", self.config.base_url)
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/?s={}&post_type=post",
            self.config.base_url,
            plus_encoded(query)
        )
    }

    async fn entries(&self, url: &str, limit: usize) -> Vec<ListingEntry> {
        let html = match self.fetcher.get_html(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Game3rb: failed to load {}: {}", url, e);
                return Vec::new();
            }
        };
        listing(&html, url, ENTRY_SELECTOR, limit).unwrap_or_else(|e| {
            warn!("Game3rb: {}", e);
            Vec::new()
        })
    }

    async fn category_candidates(&self, query: &str) -> Vec<Candidate> {
        self.entries(&self.category_url(), CATEGORY_LIMIT)
            .await
            .into_iter()
            .filter_map(|entry| {
                let score = similarity(query, &entry.title);
                (score > CATEGORY_MIN_SCORE).then(|| {
                    Candidate::new(SourceId::Game3rb, entry.url, entry.title, score + CATEGORY_BOOST)
                        .verified()
                })
            })
            .collect()
    }

    async fn search_candidates(&self, query: &str) -> Vec<Candidate> {
        let entries = self.entries(&self.search_url(query), SEARCH_LIMIT).await;

        let mut candidates = Vec::new();
        for ListingEntry { title, url: link, .. } in entries {
            let score = similarity(query, &title);
            let title_says_online = title.to_lowercase().contains("online");

            match fetch_for_verification(self.fetcher.as_ref(), &link).await {
                Ok(html) => {
                    let signals = online_signals(&html, &title);
                    debug!("Game3rb: {:?} signals {:?}", title, signals);
                    if signals.is_online() {
                        candidates.push(
                            Candidate::new(SourceId::Game3rb, link, title, score + signals.boost())
                                .verified(),
                        );
                    } else if title_says_online {
                        candidates.push(Candidate::new(SourceId::Game3rb, link, title, score));
                    }
                }
                Err(e) => {
                    debug!("Game3rb: could not check {}: {}", link, e);
                    if title_says_online {
                        candidates.push(Candidate::new(SourceId::Game3rb, link, title, score));
                    }
                }
            }
        }
        candidates
    }
}

#[async_trait]
impl SourceAdapter for Game3rb {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn source(&self) -> SourceId {
        SourceId::Game3rb
    }

    /// Returns the highest-scoring online match. Unlike the repack catalogs
    /// there is no minimum score.
    async fn search(&self, query: &str) -> Option<Candidate> {
        if is_conversational(query) {
            return None;
        }

        let query = strip_online(query);
        let mut pool = self.category_candidates(&query).await;
        pool.extend(self.search_candidates(&query).await);

        let best = best_candidate(pool)?;
        debug!("Game3rb: best {:?} at {:.3}", best.title, best.score);
        Some(best)
    }
}
