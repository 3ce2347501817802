//! Candidate and aggregated result types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::QueryIntent;

/// The catalogs the engine knows how to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// Repack catalog with predictable slugs and a keyword search.
    FitGirl,
    /// Repack catalog with a keyword search only.
    Dodi,
    /// Catalog with a dedicated online-games category.
    Game3rb,
}

impl SourceId {
    /// All sources, in declaration order.
    pub const ALL: [SourceId; 3] = [SourceId::FitGirl, SourceId::Dodi, SourceId::Game3rb];

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            SourceId::FitGirl => "FitGirl",
            SourceId::Dodi => "DODI",
            SourceId::Game3rb => "Game3rb",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A page one source adapter proposes as the answer to a query.
///
/// `score` is an additive ranking value; source-specific boosts can push it
/// above `1.0`, so it is not a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Source that produced the candidate.
    pub source: SourceId,
    /// Page URL.
    pub url: String,
    /// Page title as listed by the source.
    pub title: String,
    /// Ranking score.
    pub score: f64,
    /// Whether a page fetch confirmed the match.
    pub verified: bool,
}

impl Candidate {
    /// Creates an unverified candidate.
    pub fn new(source: SourceId, url: impl Into<String>, title: impl Into<String>, score: f64) -> Self {
        Self {
            source,
            url: url.into(),
            title: title.into(),
            score,
            verified: false,
        }
    }

    /// Marks the candidate as verified.
    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }
}

/// Sorts candidates by descending score, keeping insertion order for ties,
/// and returns the best one.
pub(crate) fn best_candidate(mut pool: Vec<Candidate>) -> Option<Candidate> {
    pool.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    pool.into_iter().next()
}

/// Completion times reported by the game-length lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayTime {
    /// Title of the matched game.
    pub title: String,
    /// Main story, in hours.
    pub main_hours: Option<f64>,
    /// Main story plus extras, in hours.
    pub main_extra_hours: Option<f64>,
    /// Completionist, in hours.
    pub completionist_hours: Option<f64>,
}

impl PlayTime {
    /// Returns `(label, hours)` pairs for the times that are known.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        [
            ("Main", self.main_hours),
            ("Main+Extras", self.main_extra_hours),
            ("Completionist", self.completionist_hours),
        ]
        .into_iter()
        .filter_map(|(label, hours)| hours.map(|h| (label, h)))
        .collect()
    }
}

/// Everything the engine found for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// How the query was classified.
    pub intent: QueryIntent,
    /// Whether the user asked for an online game.
    pub online: bool,
    /// Best candidate per source, for sources that produced one.
    pub per_source: BTreeMap<SourceId, Candidate>,
    /// Order in which the sources should be presented.
    pub priority_order: Vec<SourceId>,
    /// Completion times, when the lookup found the game.
    pub play_time: Option<PlayTime>,
}

impl AggregatedResult {
    /// Creates an empty result for the given intent.
    pub fn empty(intent: QueryIntent) -> Self {
        Self {
            intent,
            ..Default::default()
        }
    }

    /// Returns the candidate found for `source`.
    pub fn get(&self, source: SourceId) -> Option<&Candidate> {
        self.per_source.get(&source)
    }

    /// Returns candidates in presentation order.
    pub fn ordered(&self) -> impl Iterator<Item = &Candidate> {
        self.priority_order
            .iter()
            .filter_map(|source| self.per_source.get(source))
    }

    /// Returns true if no source produced a candidate.
    pub fn is_empty(&self) -> bool {
        self.per_source.is_empty()
    }
}
