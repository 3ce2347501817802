//! Source adapter trait and configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Candidate, SourceId};

/// Configuration for a source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name of the source.
    pub name: String,
    /// Short identifier (e.g., "fg" for FitGirl).
    pub shortcut: String,
    /// Site root, without a trailing slash.
    pub base_url: String,
    /// Whether the aggregator should query this source.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    /// Creates an enabled configuration.
    pub fn new(
        name: impl Into<String>,
        shortcut: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            shortcut: shortcut.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            enabled: true,
        }
    }

    /// Points the source at a different site root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Disables the source.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Trait implemented by every catalog the engine can search.
///
/// `search` never fails: transport errors, unexpected markup and weak matches
/// all come back as `None`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Returns the adapter configuration.
    fn config(&self) -> &SourceConfig;

    /// Returns which source this adapter searches.
    fn source(&self) -> SourceId;

    /// Finds the best match for `query`, if it is good enough.
    async fn search(&self, query: &str) -> Option<Candidate>;

    /// Returns the source name.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Returns the source shortcut.
    fn shortcut(&self) -> &str {
        &self.config().shortcut
    }

    /// Returns whether the source is enabled.
    fn is_enabled(&self) -> bool {
        self.config().enabled
    }
}
