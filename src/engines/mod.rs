//! Source adapter implementations.

use std::time::Duration;

use crate::fetcher::{FetchRequest, PageFetcher};
use crate::{Result, SearchError};

// Download catalogs
mod dodi;
mod fitgirl;
mod game3rb;

// Game-length lookup
mod howlongtobeat;

pub use dodi::Dodi;
pub use fitgirl::{slug, FitGirl};
pub use game3rb::{online_signals, Game3rb, OnlineSignals};
pub use howlongtobeat::HowLongToBeat;

/// Timeout for the follow-up fetch that confirms a search hit.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches a search hit's page for verification, with a shorter timeout.
async fn fetch_for_verification(fetcher: &dyn PageFetcher, url: &str) -> Result<String> {
    let response = fetcher
        .fetch(FetchRequest::get(url).with_timeout(VERIFY_TIMEOUT))
        .await?;
    if !response.is_ok() {
        return Err(SearchError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response.body)
}

/// Lowercases `text` and joins its percent-encoded words with `+`.
fn plus_encoded(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}
