//! Search query representation, intent classification and variant generation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Result, SearchError};

/// Well-known long titles and the short forms people type instead.
const ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("call of duty", &["cod", "call of duty"]),
    ("grand theft auto", &["gta"]),
    ("assassin's creed", &["ac", "assassins creed"]),
    ("red dead redemption", &["rdr"]),
    ("need for speed", &["nfs"]),
    ("the elder scrolls", &["tes", "elder scrolls"]),
    ("counter strike", &["cs"]),
    ("final fantasy", &["ff"]),
    ("resident evil", &["re"]),
    ("metal gear solid", &["mgs"]),
];

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hola",
    "yo",
    "sup",
    "what's up",
    "greetings",
    "howdy",
];

const CONVERSATION_STARTERS: &[&str] = &[
    "how are you",
    "what can you do",
    "tell me about",
    "who are you",
    "what is your",
];

static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());
static NUMBER_PAIR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s+\d+$").unwrap());
static DOWNLOAD_TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+(?:\.\d+)?\s+\d+(?:\.\d+)?\s*$").unwrap());
static ONLINE_WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bonline\b").unwrap());

/// What the user meant by a line of input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Looking for a game.
    #[default]
    Search,
    /// Small talk; no source is queried.
    Conversational,
    /// "<speed> <size>" pair for the download-time calculator.
    DownloadTime,
}

/// A validated search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    text: String,
}

impl SearchQuery {
    /// Creates a query from user input, trimming surrounding whitespace.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
        }
        Ok(Self {
            text: trimmed.to_string(),
        })
    }

    /// Returns the query text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Classifies the query.
    pub fn intent(&self) -> QueryIntent {
        classify(&self.text)
    }

    /// Returns true if the user asked for an online game.
    pub fn is_online(&self) -> bool {
        has_online_intent(&self.text)
    }

    /// Returns the query with the word "online" removed.
    pub fn without_online(&self) -> String {
        strip_online(&self.text)
    }

    /// Returns the search variants for this query.
    pub fn variants(&self) -> Vec<String> {
        variants(&self.text)
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Expands a query into alternate spellings to widen recall.
///
/// The first element is always `query` unchanged. Abbreviation variants are
/// lowercased; a year-stripped variant is added when the query mentions a
/// year between 1900 and 2099. The result may contain duplicates.
pub fn variants(query: &str) -> Vec<String> {
    let mut out = vec![query.to_string()];
    let lowered = query.to_lowercase();

    for (phrase, short_forms) in ABBREVIATIONS {
        if !lowered.contains(phrase) {
            continue;
        }
        for short in short_forms.iter().filter(|s| *s != phrase) {
            out.push(lowered.replace(phrase, short));
        }
    }

    if YEAR_PATTERN.is_match(query) {
        let stripped = YEAR_PATTERN.replace_all(query, "");
        out.push(collapse_whitespace(&stripped));
    }

    out
}

/// Classifies a line of input.
pub fn classify(text: &str) -> QueryIntent {
    if is_download_time_request(text) {
        QueryIntent::DownloadTime
    } else if is_conversational(text) {
        QueryIntent::Conversational
    } else {
        QueryIntent::Search
    }
}

/// Returns true if `text` looks like chat rather than a game title.
pub fn is_conversational(text: &str) -> bool {
    let text = text.trim().to_lowercase();

    if GREETINGS.contains(&text.as_str()) {
        return true;
    }
    if CONVERSATION_STARTERS.iter().any(|s| text.starts_with(s)) {
        return true;
    }
    if text.chars().count() < 3 && !NUMBER_PAIR_PATTERN.is_match(&text) {
        return true;
    }
    text.ends_with('?')
}

/// Returns true for "<speed> <size>" input such as `"150 30"`.
pub fn is_download_time_request(text: &str) -> bool {
    DOWNLOAD_TIME_PATTERN.is_match(text)
}

/// Returns true if the query mentions "online" anywhere.
pub fn has_online_intent(text: &str) -> bool {
    text.to_lowercase().contains("online")
}

/// Removes the word "online" from `text`, falling back to `text` itself
/// when nothing else is left.
pub fn strip_online(text: &str) -> String {
    let cleaned = collapse_whitespace(&ONLINE_WORD_PATTERN.replace_all(text, ""));
    if cleaned.is_empty() {
        text.trim().to_string()
    } else {
        cleaned
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_trims() {
        let query = SearchQuery::new("  Elden Ring  ").unwrap();
        assert_eq!(query.as_str(), "Elden Ring");
        assert_eq!(query.to_string(), "Elden Ring");
    }

    #[test]
    fn test_search_query_rejects_empty() {
        assert!(matches!(
            SearchQuery::new("   "),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(SearchQuery::new("").is_err());
    }

    #[test]
    fn test_variants_start_with_query() {
        for q in ["Elden Ring", "Call of Duty Black Ops", "cod 2024", "x"] {
            assert_eq!(variants(q)[0], q);
        }
    }

    #[test]
    fn test_variants_abbreviation() {
        let v = variants("Grand Theft Auto V");
        assert_eq!(v, vec!["Grand Theft Auto V", "gta v"]);
    }

    #[test]
    fn test_variants_skip_identical_short_form() {
        let v = variants("call of duty modern warfare");
        assert_eq!(v, vec!["call of duty modern warfare", "cod modern warfare"]);
    }

    #[test]
    fn test_variants_multiple_short_forms() {
        let v = variants("The Elder Scrolls Skyrim");
        assert!(v.contains(&"tes skyrim".to_string()));
        assert!(v.contains(&"elder scrolls skyrim".to_string()));
    }

    #[test]
    fn test_variants_year_stripped() {
        let v = variants("cod 2024");
        assert!(v.contains(&"cod".to_string()));
    }

    #[test]
    fn test_variants_year_in_middle_collapses_whitespace() {
        let v = variants("FIFA 2023 Ultimate");
        assert_eq!(v.last().unwrap(), "FIFA Ultimate");
    }

    #[test]
    fn test_variants_ignores_non_years() {
        assert_eq!(variants("Frostpunk 1886").len(), 1);
        assert_eq!(variants("Fallout 76").len(), 1);
        assert_eq!(variants("Doom 12345").len(), 1);
        assert_eq!(variants("Hades"), vec!["Hades"]);
    }

    #[test]
    fn test_conversational_inputs() {
        assert!(is_conversational("hi"));
        assert!(is_conversational("Hello"));
        assert!(is_conversational("hello?"));
        assert!(is_conversational("tell me about yourself"));
        assert!(is_conversational("What can you do for me"));
        assert!(is_conversational("ok"));
        assert!(is_conversational("is it free?"));
    }

    #[test]
    fn test_search_inputs() {
        assert!(!is_conversational("Red Dead Redemption 2"));
        assert!(!is_conversational("fortnite online"));
        assert!(!is_conversational("Hi-Fi Rush"));
    }

    #[test]
    fn test_download_time_request() {
        assert!(is_download_time_request("150 30"));
        assert!(is_download_time_request(" 12.5  4.2 "));
        assert!(!is_download_time_request("cod 2024"));
        assert!(!is_download_time_request("150"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("150 30"), QueryIntent::DownloadTime);
        assert_eq!(classify("hey"), QueryIntent::Conversational);
        assert_eq!(classify("Red Dead Redemption 2"), QueryIntent::Search);
        assert_eq!(
            SearchQuery::new("hello?").unwrap().intent(),
            QueryIntent::Conversational
        );
    }

    #[test]
    fn test_online_intent() {
        assert!(has_online_intent("Fortnite ONLINE"));
        assert!(has_online_intent("gta online"));
        assert!(!has_online_intent("Hades"));
        assert!(SearchQuery::new("fortnite online").unwrap().is_online());
    }

    #[test]
    fn test_strip_online() {
        assert_eq!(strip_online("fortnite online"), "fortnite");
        assert_eq!(strip_online("Online Chess Online"), "Chess");
        assert_eq!(strip_online("online"), "online");
        assert_eq!(
            SearchQuery::new("gta online v").unwrap().without_online(),
            "gta v"
        );
    }

    #[test]
    fn test_query_intent_serialization() {
        let json = serde_json::to_string(&QueryIntent::DownloadTime).unwrap();
        assert_eq!(json, "\"download_time\"");
    }
}
