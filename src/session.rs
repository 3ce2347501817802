//! Per-conversation state.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{AggregatedResult, Aggregator, QueryIntent};

/// Number of turns retained in the history.
pub const HISTORY_LIMIT: usize = 6;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the person searching.
    User,
    /// Reply shown back to them.
    Assistant,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author of the message.
    pub role: Role,
    /// Message text as entered or shown.
    pub content: String,
}

/// A conversation with a shared aggregator.
///
/// Each session owns its history; the aggregator and its fetcher are shared
/// between sessions.
pub struct Session {
    aggregator: Arc<Aggregator>,
    history: VecDeque<Turn>,
}

impl Session {
    /// Starts an empty conversation.
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Records the user's message and searches for it.
    ///
    /// Download-time input is answered without being recorded.
    pub async fn search(&mut self, text: &str) -> AggregatedResult {
        let result = self.aggregator.aggregate(text).await;
        if result.intent != QueryIntent::DownloadTime {
            self.push(Role::User, text);
        }
        result
    }

    /// Records a reply produced for the user.
    pub fn record_reply(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    /// Returns the retained turns, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(Turn {
            role,
            content: content.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Arc::new(Aggregator::new()))
    }

    #[tokio::test]
    async fn test_search_records_user_turn() {
        let mut session = session();
        let result = session.search("elden ring").await;
        assert!(result.is_empty());
        session.record_reply("nothing found");

        let history: Vec<&Turn> = session.history().collect();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "elden ring");
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_download_time_not_recorded() {
        let mut session = session();
        let result = session.search("150 30").await;
        assert_eq!(result.intent, QueryIntent::DownloadTime);
        assert_eq!(session.history().count(), 0);
    }

    #[tokio::test]
    async fn test_history_bounded() {
        let mut session = session();
        for i in 0..10 {
            session.record_reply(format!("reply {i}"));
        }
        let contents: Vec<&str> = session.history().map(|t| t.content.as_str()).collect();
        assert_eq!(contents.len(), HISTORY_LIMIT);
        assert_eq!(contents[0], "reply 4");
        assert_eq!(contents[5], "reply 9");
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let aggregator = Arc::new(Aggregator::new());
        let mut first = Session::new(aggregator.clone());
        let second = Session::new(aggregator);
        first.search("hades").await;
        assert_eq!(first.history().count(), 1);
        assert_eq!(second.history().count(), 0);
    }
}
