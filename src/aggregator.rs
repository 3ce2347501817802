//! Cross-source orchestration and prioritisation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::engines::{Dodi, FitGirl, Game3rb, HowLongToBeat};
use crate::fetcher::PageFetcher;
use crate::query::{classify, has_online_intent, strip_online};
use crate::{AggregatedResult, Candidate, QueryIntent, SourceAdapter, SourceId};

/// Order in which found sources are presented.
const PRESENTATION_ORDER: [SourceId; 3] = [SourceId::Game3rb, SourceId::FitGirl, SourceId::Dodi];

/// Runs the source adapters for a query and merges their answers.
///
/// Policy:
/// - conversational and download-time input never reaches an adapter;
/// - an "online" query asks Game3rb first and stops there if it answers;
/// - otherwise FitGirl and DODI run, with Game3rb as a backup.
#[derive(Default)]
pub struct Aggregator {
    adapters: HashMap<SourceId, Arc<dyn SourceAdapter>>,
    play_time: Option<HowLongToBeat>,
}

impl Aggregator {
    /// Creates an aggregator with no adapters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an aggregator wired to the public sites through `fetcher`.
    pub fn with_defaults(fetcher: Arc<dyn PageFetcher>) -> Self {
        let mut aggregator = Self::new();
        aggregator.add_adapter(FitGirl::new(fetcher.clone()));
        aggregator.add_adapter(Dodi::new(fetcher.clone()));
        aggregator.add_adapter(Game3rb::new(fetcher.clone()));
        aggregator.set_play_time_lookup(HowLongToBeat::new(fetcher));
        aggregator
    }

    /// Adds a source adapter, replacing any adapter for the same source.
    pub fn add_adapter<A: SourceAdapter + 'static>(&mut self, adapter: A) {
        self.adapters.insert(adapter.source(), Arc::new(adapter));
    }

    /// Sets the game-length lookup run alongside searches.
    pub fn set_play_time_lookup(&mut self, lookup: HowLongToBeat) {
        self.play_time = Some(lookup);
    }

    /// Returns the game-length lookup, if one is set.
    pub fn play_time_lookup(&self) -> Option<&HowLongToBeat> {
        self.play_time.as_ref()
    }

    /// Returns the number of configured adapters.
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Returns the configured adapter for `source`.
    pub fn adapter(&self, source: SourceId) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.get(&source)
    }

    /// Searches every relevant source for `query`. Never fails: a query no
    /// source can answer yields an empty result.
    pub async fn aggregate(&self, query: &str) -> AggregatedResult {
        let intent = classify(query);
        if intent != QueryIntent::Search {
            debug!("Skipping sources for {:?} input {:?}", intent, query);
            return AggregatedResult::empty(intent);
        }

        let query = query.trim();
        let online = has_online_intent(query);
        let mut per_source = BTreeMap::new();

        let mut game3rb = None;
        if online {
            game3rb = self.run(SourceId::Game3rb, &strip_online(query)).await;
        }

        if game3rb.is_none() {
            let (fitgirl, dodi) = futures::join!(
                self.run(SourceId::FitGirl, query),
                self.run(SourceId::Dodi, query)
            );
            per_source.extend(fitgirl.map(|c| (SourceId::FitGirl, c)));
            per_source.extend(dodi.map(|c| (SourceId::Dodi, c)));
            game3rb = self.run(SourceId::Game3rb, query).await;
        }
        per_source.extend(game3rb.map(|c| (SourceId::Game3rb, c)));

        let play_time = match &self.play_time {
            Some(lookup) => lookup.lookup(query).await,
            None => None,
        };

        let priority_order = priority_order(&per_source);
        debug!("Aggregated {:?}: {:?}", query, priority_order);

        AggregatedResult {
            intent,
            online,
            per_source,
            priority_order,
            play_time,
        }
    }

    async fn run(&self, source: SourceId, query: &str) -> Option<Candidate> {
        let adapter = self.adapters.get(&source)?;
        if !adapter.is_enabled() {
            debug!("{} is disabled", adapter.name());
            return None;
        }
        let candidate = adapter.search(query).await;
        debug!("{} answered {:?}", adapter.name(), candidate.as_ref().map(|c| &c.url));
        candidate
    }
}

/// Lists the sources present in `per_source`, Game3rb first.
pub fn priority_order(per_source: &BTreeMap<SourceId, Candidate>) -> Vec<SourceId> {
    PRESENTATION_ORDER
        .into_iter()
        .filter(|source| per_source.contains_key(source))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::fetcher::mock::StaticFetcher;
    use crate::SourceConfig;

    struct MockAdapter {
        config: SourceConfig,
        source: SourceId,
        result: Option<Candidate>,
        calls: Arc<AtomicUsize>,
        queries: Arc<Mutex<Vec<String>>>,
    }

    impl MockAdapter {
        fn new(source: SourceId, found: bool) -> Self {
            Self {
                config: SourceConfig::new(source.name(), source.name(), "https://example.com"),
                source,
                result: found.then(|| {
                    Candidate::new(source, format!("https://{}.example/game/", source), "Game", 0.9)
                }),
                calls: Arc::new(AtomicUsize::new(0)),
                queries: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn disabled(mut self) -> Self {
            self.config.enabled = false;
            self
        }
    }

    #[async_trait]
    impl SourceAdapter for MockAdapter {
        fn config(&self) -> &SourceConfig {
            &self.config
        }

        fn source(&self) -> SourceId {
            self.source
        }

        async fn search(&self, query: &str) -> Option<Candidate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            self.result.clone()
        }
    }

    struct Harness {
        aggregator: Aggregator,
        calls: HashMap<SourceId, Arc<AtomicUsize>>,
        queries: HashMap<SourceId, Arc<Mutex<Vec<String>>>>,
    }

    impl Harness {
        fn new(adapters: Vec<MockAdapter>) -> Self {
            let mut aggregator = Aggregator::new();
            let mut calls = HashMap::new();
            let mut queries = HashMap::new();
            for adapter in adapters {
                calls.insert(adapter.source, adapter.calls.clone());
                queries.insert(adapter.source, adapter.queries.clone());
                aggregator.add_adapter(adapter);
            }
            Self {
                aggregator,
                calls,
                queries,
            }
        }

        fn found(fitgirl: bool, dodi: bool, game3rb: bool) -> Self {
            Self::new(vec![
                MockAdapter::new(SourceId::FitGirl, fitgirl),
                MockAdapter::new(SourceId::Dodi, dodi),
                MockAdapter::new(SourceId::Game3rb, game3rb),
            ])
        }

        fn calls(&self, source: SourceId) -> usize {
            self.calls[&source].load(Ordering::SeqCst)
        }

        fn queries(&self, source: SourceId) -> Vec<String> {
            self.queries[&source].lock().unwrap().clone()
        }
    }

    #[test]
    fn test_aggregator_new() {
        let aggregator = Aggregator::new();
        assert_eq!(aggregator.adapter_count(), 0);
        assert!(aggregator.adapter(SourceId::FitGirl).is_none());
    }

    #[test]
    fn test_with_defaults_registers_all_sources() {
        let aggregator = Aggregator::with_defaults(Arc::new(StaticFetcher::new()));
        assert_eq!(aggregator.adapter_count(), 3);
        for source in SourceId::ALL {
            assert_eq!(aggregator.adapter(source).unwrap().source(), source);
        }
        assert_eq!(
            aggregator.play_time_lookup().unwrap().config().shortcut,
            "hltb"
        );
    }

    #[test]
    fn test_priority_order_game3rb_first() {
        let mut per_source = BTreeMap::new();
        for source in SourceId::ALL {
            per_source.insert(source, Candidate::new(source, "u", "t", 0.7));
        }
        assert_eq!(
            priority_order(&per_source),
            vec![SourceId::Game3rb, SourceId::FitGirl, SourceId::Dodi]
        );
        per_source.remove(&SourceId::Game3rb);
        assert_eq!(
            priority_order(&per_source),
            vec![SourceId::FitGirl, SourceId::Dodi]
        );
    }

    #[tokio::test]
    async fn test_online_hit_short_circuits_repack_sources() {
        let harness = Harness::found(true, true, true);
        let result = harness.aggregator.aggregate("fortnite online").await;

        assert_eq!(harness.calls(SourceId::Game3rb), 1);
        assert_eq!(harness.calls(SourceId::FitGirl), 0);
        assert_eq!(harness.calls(SourceId::Dodi), 0);
        assert_eq!(harness.queries(SourceId::Game3rb), vec!["fortnite"]);
        assert!(result.online);
        assert_eq!(result.priority_order, vec![SourceId::Game3rb]);
    }

    #[tokio::test]
    async fn test_online_miss_falls_through_with_backup() {
        let harness = Harness::found(true, false, false);
        let result = harness.aggregator.aggregate("gta online").await;

        assert_eq!(harness.calls(SourceId::FitGirl), 1);
        assert_eq!(harness.calls(SourceId::Dodi), 1);
        assert_eq!(
            harness.queries(SourceId::Game3rb),
            vec!["gta", "gta online"]
        );
        assert_eq!(harness.queries(SourceId::FitGirl), vec!["gta online"]);
        assert_eq!(result.priority_order, vec![SourceId::FitGirl]);
    }

    #[tokio::test]
    async fn test_plain_query_runs_all_sources() {
        let harness = Harness::found(true, true, true);
        let result = harness.aggregator.aggregate("  Red Dead Redemption 2 ").await;

        for source in SourceId::ALL {
            assert_eq!(harness.calls(source), 1, "{source}");
        }
        assert_eq!(
            harness.queries(SourceId::FitGirl),
            vec!["Red Dead Redemption 2"]
        );
        assert!(!result.online);
        assert_eq!(result.intent, QueryIntent::Search);
        assert_eq!(
            result.priority_order,
            vec![SourceId::Game3rb, SourceId::FitGirl, SourceId::Dodi]
        );
        assert_eq!(result.ordered().count(), 3);
    }

    #[tokio::test]
    async fn test_conversational_query_reaches_no_adapter() {
        let harness = Harness::found(true, true, true);
        for input in ["hi", "hello?", "tell me about yourself"] {
            let result = harness.aggregator.aggregate(input).await;
            assert_eq!(result.intent, QueryIntent::Conversational);
            assert!(result.is_empty());
        }
        for source in SourceId::ALL {
            assert_eq!(harness.calls(source), 0);
        }
    }

    #[tokio::test]
    async fn test_download_time_input_reaches_no_adapter() {
        let harness = Harness::found(true, true, true);
        let result = harness.aggregator.aggregate("150 30").await;
        assert_eq!(result.intent, QueryIntent::DownloadTime);
        assert!(result.is_empty());
        assert!(result.priority_order.is_empty());
        for source in SourceId::ALL {
            assert_eq!(harness.calls(source), 0);
        }
    }

    #[tokio::test]
    async fn test_disabled_adapter_skipped() {
        let harness = Harness::new(vec![
            MockAdapter::new(SourceId::FitGirl, true).disabled(),
            MockAdapter::new(SourceId::Dodi, true),
        ]);
        let result = harness.aggregator.aggregate("hades").await;
        assert_eq!(harness.calls(SourceId::FitGirl), 0);
        assert_eq!(result.priority_order, vec![SourceId::Dodi]);
    }

    #[tokio::test]
    async fn test_no_results_is_valid() {
        let harness = Harness::found(false, false, false);
        let result = harness.aggregator.aggregate("nonexistent game").await;
        assert!(result.is_empty());
        assert_eq!(result.intent, QueryIntent::Search);
        assert!(result.play_time.is_none());
    }

    #[tokio::test]
    async fn test_aggregate_is_idempotent_over_identical_pages() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page(
                    "https://fitgirl-repacks.site/hades/",
                    r#"<h1 class="entry-title">Hades</h1>"#,
                )
                .page(
                    "https://dodi-repacks.site/?s=hades",
                    r#"<h2 class="title"><a href="https://dodi-repacks.site/hades/">Hades</a></h2>"#,
                )
                .page(
                    "https://game3rb.com/category/games/online/",
                    r#"<article><h2 class="post-title"><a href="https://game3rb.com/hades/">Hades</a></h2></article>"#,
                )
                .page(
                    "https://howlongtobeat.com/api/search",
                    r#"{"data":[{"game_name":"Hades","comp_main":72000}]}"#,
                ),
        );
        let aggregator = Aggregator::with_defaults(fetcher);

        let first = aggregator.aggregate("Hades").await;
        let second = aggregator.aggregate("Hades").await;

        assert_eq!(first, second);
        assert_eq!(
            first.priority_order,
            vec![SourceId::Game3rb, SourceId::FitGirl, SourceId::Dodi]
        );
        assert_eq!(first.get(SourceId::FitGirl).unwrap().score, 0.95);
        assert!((first.get(SourceId::Game3rb).unwrap().score - 1.2).abs() < 1e-9);
        assert_eq!(first.play_time.as_ref().unwrap().main_hours, Some(20.0));
    }
}
