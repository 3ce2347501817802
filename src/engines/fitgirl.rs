//! FitGirl repack catalog adapter.
//!
//! Tries a direct page at the title's slug, then the site search, for every
//! query variant. Search hits are confirmed by fetching their page.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, warn};

use super::fetch_for_verification;
use crate::fetcher::PageFetcher;
use crate::html::{listing, page_text, selector, text_of};
use crate::query::{is_conversational, variants};
use crate::result::best_candidate;
use crate::similarity::similarity;
use crate::{Candidate, Result, SearchError, SourceAdapter, SourceConfig, SourceId};

/// Score given to a page found at its predictable slug.
const DIRECT_HIT_SCORE: f64 = 0.95;
/// Minimum title similarity for a direct page to count.
const DIRECT_MIN_SIMILARITY: f64 = 0.6;
/// Search entries inspected per variant.
const SEARCH_LIMIT: usize = 5;
/// Minimum rank-weighted score for a search entry to be verified.
const SEARCH_MIN_SCORE: f64 = 0.55;
/// Penalty applied when a hit could not be verified.
const UNVERIFIED_FACTOR: f64 = 0.8;
/// Minimum score for the best candidate to be reported.
const ACCEPT_SCORE: f64 = 0.6;

/// FitGirl repacks adapter.
pub struct FitGirl {
    config: SourceConfig,
    fetcher: Arc<dyn PageFetcher>,
}

impl FitGirl {
    /// Creates a new FitGirl adapter.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: SourceConfig::new("FitGirl", "fg", "https://fitgirl-repacks.site"),
            fetcher,
        }
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: SourceConfig) -> Self {
        self.config = config;
        self
    }

    fn direct_url(&self, slug: &str) -> String {
        format!("{}/{}/", self.config.base_url, slug)
    }

    fn search_url(&self, variant: &str) -> String {
        format!(
            "{}/?s={}",
            self.config.base_url,
            urlencoding::encode(variant)
        )
    }

    async fn direct_candidate(&self, variant: &str) -> Option<Candidate> {
        let slug = slug(variant);
        if slug.is_empty() {
            return None;
        }
        let url = self.direct_url(&slug);

        let html = match self.fetcher.get_html(&url).await {
            Ok(html) => html,
            Err(e) => {
                debug!("FitGirl: no direct page at {}: {}", url, e);
                return None;
            }
        };

        let title = match parse_entry_title(&html) {
            Ok(Some(title)) if !title.contains("404") => title,
            Ok(_) => return None,
            Err(e) => {
                warn!("FitGirl: {}", e);
                return None;
            }
        };

        let similarity = similarity(variant, &title);
        debug!("FitGirl: direct page {:?} similarity {:.3}", title, similarity);
        (similarity > DIRECT_MIN_SIMILARITY)
            .then(|| Candidate::new(SourceId::FitGirl, url, title, DIRECT_HIT_SCORE).verified())
    }

    async fn search_candidates(&self, variant: &str) -> Vec<Candidate> {
        let url = self.search_url(variant);
        let entries = match self.fetcher.get_html(&url).await {
            Ok(html) => match listing(&html, &url, "h1.entry-title a", SEARCH_LIMIT) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("FitGirl: {}", e);
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!("FitGirl search failed for {:?}: {}", variant, e);
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for entry in entries {
            let score = similarity(variant, &entry.title) * rank_weight(entry.rank);
            if score <= SEARCH_MIN_SCORE {
                continue;
            }
            let candidate = Candidate::new(SourceId::FitGirl, entry.url, entry.title, score);
            if let Some(candidate) = self.verify(candidate).await {
                candidates.push(candidate);
            }
        }
        candidates
    }

    /// Confirms a search hit looks like a repack page.
    ///
    /// A page without the evidence words is dropped, and so is one answering
    /// with an error status. A page that cannot be reached at all keeps the
    /// hit at a reduced score.
    async fn verify(&self, candidate: Candidate) -> Option<Candidate> {
        match fetch_for_verification(self.fetcher.as_ref(), &candidate.url).await {
            Ok(html) if has_repack_evidence(&html) => Some(candidate.verified()),
            Ok(_) => {
                debug!("FitGirl: {} is not a repack page", candidate.url);
                None
            }
            Err(e @ SearchError::Unavailable { .. }) => {
                debug!("FitGirl: could not verify {}: {}", candidate.url, e);
                let score = candidate.score * UNVERIFIED_FACTOR;
                Some(Candidate { score, ..candidate })
            }
            Err(e) => {
                debug!("FitGirl: dropping {}: {}", candidate.url, e);
                None
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for FitGirl {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn source(&self) -> SourceId {
        SourceId::FitGirl
    }

    async fn search(&self, query: &str) -> Option<Candidate> {
        if is_conversational(query) {
            return None;
        }

        let mut pool = Vec::new();
        for variant in variants(query) {
            if let Some(candidate) = self.direct_candidate(&variant).await {
                pool.push(candidate);
            }
            pool.extend(self.search_candidates(&variant).await);
        }

        let best = best_candidate(pool)?;
        debug!("FitGirl: best {:?} at {:.3}", best.title, best.score);
        (best.score > ACCEPT_SCORE).then_some(best)
    }
}

/// Turns a title into the site's URL slug: lowercase, punctuation removed,
/// whitespace runs replaced by `-`.
pub fn slug(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Weight for the search entry at `rank` (0-based): 0.9, 0.8, 0.7, ...
fn rank_weight(rank: usize) -> f64 {
    (9.0 - rank as f64) / 10.0
}

fn parse_entry_title(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let heading = selector("h1.entry-title")?;
    Ok(document.select(&heading).next().map(text_of))
}

fn has_repack_evidence(html: &str) -> bool {
    let text = page_text(&Html::parse_document(html)).to_lowercase();
    text.contains("repack") && (text.contains("download") || text.contains("torrent"))
}
