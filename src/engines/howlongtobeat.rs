//! HowLongToBeat game-length lookup using its JSON search endpoint.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fetcher::{FetchRequest, PageFetcher};
use crate::query::is_conversational;
use crate::{PlayTime, Result, SearchError, SourceConfig};

/// HowLongToBeat lookup.
pub struct HowLongToBeat {
    config: SourceConfig,
    fetcher: Arc<dyn PageFetcher>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchPayload<'a> {
    search_type: &'static str,
    search_terms: Vec<&'a str>,
    sort_category: &'static str,
    range_category: &'static str,
    range_time: RangeTime,
    gameplay: Gameplay,
    platform: &'static str,
    modifier: &'static str,
    user_lists: UserLists,
    search_page: u32,
    size: u32,
    randomizer: u32,
}

#[derive(Serialize, Default)]
struct RangeTime {
    min: u32,
    max: u32,
}

#[derive(Serialize, Default)]
struct Gameplay {
    perspective: &'static str,
    flow: &'static str,
    genre: &'static str,
}

#[derive(Serialize, Default)]
struct UserLists {
    include: Vec<String>,
    exclude: Vec<String>,
}

#[derive(Deserialize)]
struct HltbResponse {
    #[serde(default)]
    data: Vec<HltbGame>,
}

#[derive(Deserialize)]
struct HltbGame {
    game_name: Option<String>,
    #[serde(default)]
    comp_main: f64,
    #[serde(default)]
    comp_plus: f64,
    #[serde(default)]
    comp_100: f64,
}

impl HowLongToBeat {
    /// Creates a new lookup against the public API.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: SourceConfig::new("HowLongToBeat", "hltb", "https://howlongtobeat.com"),
            fetcher,
        }
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: SourceConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the lookup configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Looks up completion times for the best match of `query`.
    ///
    /// Returns `None` for conversational input, when nothing matches, or when
    /// the API cannot be reached.
    pub async fn lookup(&self, query: &str) -> Option<PlayTime> {
        if is_conversational(query) {
            return None;
        }
        match self.try_lookup(query).await {
            Ok(found) => found,
            Err(e) => {
                warn!("HowLongToBeat lookup failed for {:?}: {}", query, e);
                None
            }
        }
    }

    async fn try_lookup(&self, query: &str) -> Result<Option<PlayTime>> {
        let url = format!("{}/api/search", self.config.base_url);
        let body = serde_json::to_value(payload(query))?;
        let request = FetchRequest::post_json(&url, body)
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/json");

        let response = self.fetcher.fetch(request).await?;
        if !response.is_ok() {
            return Err(SearchError::Status {
                url,
                status: response.status,
            });
        }

        let parsed: HltbResponse = serde_json::from_str(&response.body)?;
        let found = parsed.data.into_iter().next().map(play_time);
        debug!("HowLongToBeat: {:?}", found);
        Ok(found)
    }
}

fn payload(query: &str) -> SearchPayload<'_> {
    SearchPayload {
        search_type: "games",
        search_terms: query.split_whitespace().collect(),
        sort_category: "popular",
        range_category: "main",
        range_time: RangeTime::default(),
        gameplay: Gameplay::default(),
        platform: "",
        modifier: "",
        user_lists: UserLists::default(),
        search_page: 1,
        size: 1,
        randomizer: 0,
    }
}

fn play_time(game: HltbGame) -> PlayTime {
    PlayTime {
        title: game.game_name.unwrap_or_else(|| "Unknown".to_string()),
        main_hours: hours(game.comp_main),
        main_extra_hours: hours(game.comp_plus),
        completionist_hours: hours(game.comp_100),
    }
}

fn hours(seconds: f64) -> Option<f64> {
    (seconds > 0.0).then(|| seconds / 3600.0)
}
