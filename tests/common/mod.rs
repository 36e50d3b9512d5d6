// Shared fakes for integration tests: feed sources and a scripted personalizer.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sportnews_personalizer::error::{FeedError, RankError, RewardError};
use sportnews_personalizer::ingest::types::{FeedItem, FeedSource, FetchedFeed};
use sportnews_personalizer::rank::{
    DynPersonalizer, EventId, Personalizer, RankRequest, RankResponse, RankedAction,
};

pub fn item(id: &str, ts: Option<i64>, source: &str) -> FeedItem {
    FeedItem {
        id: id.to_string(),
        title: Some(format!("Headline {id}")),
        author: None,
        description: Some(format!(
            r#"<img src="https://img.example.se/{id}.jpg" /> story {id}"#
        )),
        link: Some(format!("{source}/{id}")),
        published_at: ts.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
        source_link: source.to_string(),
    }
}

/// Returns a fixed feed, optionally after a delay.
pub struct StaticSource {
    pub feed: FetchedFeed,
    pub delay: Duration,
}

impl StaticSource {
    pub fn new(link: &str, items: Vec<FeedItem>) -> Arc<dyn FeedSource> {
        Arc::new(Self {
            feed: FetchedFeed {
                link: link.to_string(),
                items,
            },
            delay: Duration::ZERO,
        })
    }

    pub fn slow(link: &str, items: Vec<FeedItem>, delay: Duration) -> Arc<dyn FeedSource> {
        Arc::new(Self {
            feed: FetchedFeed {
                link: link.to_string(),
                items,
            },
            delay,
        })
    }
}

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch_latest(&self) -> Result<FetchedFeed, FeedError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.feed.clone())
    }
    fn name(&self) -> &str {
        &self.feed.link
    }
}

/// Same feed every call; the n-th call waits `delays[n]` (zero past the end).
pub struct StaggeredSource {
    pub feed: FetchedFeed,
    pub delays: Vec<Duration>,
    pub calls: AtomicUsize,
}

impl StaggeredSource {
    pub fn new(link: &str, items: Vec<FeedItem>, delays: Vec<Duration>) -> Arc<dyn FeedSource> {
        Arc::new(Self {
            feed: FetchedFeed {
                link: link.to_string(),
                items,
            },
            delays,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FeedSource for StaggeredSource {
    async fn fetch_latest(&self) -> Result<FetchedFeed, FeedError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.get(n).copied().unwrap_or(Duration::ZERO);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.feed.clone())
    }
    fn name(&self) -> &str {
        &self.feed.link
    }
}

pub struct FailingSource;

#[async_trait]
impl FeedSource for FailingSource {
    async fn fetch_latest(&self) -> Result<FetchedFeed, FeedError> {
        Err(FeedError::Parse("broken feed".to_string()))
    }
    fn name(&self) -> &str {
        "failing"
    }
}

/// The two feeds from the reference scenario:
/// A = [{1,t10},{2,t5}], B = [{3,t8}] → aggregator order [1,3,2].
pub fn scenario_sources() -> Vec<Arc<dyn FeedSource>> {
    vec![
        StaticSource::new(
            "https://a.example",
            vec![
                item("1", Some(10), "https://a.example"),
                item("2", Some(5), "https://a.example"),
            ],
        ),
        StaticSource::new("https://b.example", vec![item("3", Some(8), "https://b.example")]),
    ]
}

pub enum Script {
    /// Every rank call fails as unavailable.
    Fail,
    /// Fixed probabilities per action id.
    Probabilities(Vec<(&'static str, f64)>),
}

/// Personalizer fake that records what it was asked.
pub struct ScriptedPersonalizer {
    script: Script,
    pub rank_calls: Mutex<Vec<RankRequest>>,
    pub rewards: Mutex<Vec<(EventId, f64)>>,
}

impl ScriptedPersonalizer {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            rank_calls: Mutex::new(Vec::new()),
            rewards: Mutex::new(Vec::new()),
        })
    }

    pub fn dyn_of(this: &Arc<Self>) -> DynPersonalizer {
        this.clone()
    }

    pub fn rewards(&self) -> Vec<(EventId, f64)> {
        self.rewards.lock().unwrap().clone()
    }
}

#[async_trait]
impl Personalizer for ScriptedPersonalizer {
    async fn rank(&self, request: &RankRequest) -> Result<RankResponse, RankError> {
        self.rank_calls.lock().unwrap().push(request.clone());
        match &self.script {
            Script::Fail => Err(RankError::Unavailable("scripted outage".to_string())),
            Script::Probabilities(p) => Ok(RankResponse {
                ranking: p
                    .iter()
                    .map(|(id, prob)| RankedAction {
                        id: id.to_string(),
                        probability: *prob,
                    })
                    .collect(),
                event_id: Some(request.event_id.to_string()),
            }),
        }
    }

    async fn reward(&self, event_id: EventId, value: f64) -> Result<(), RewardError> {
        self.rewards.lock().unwrap().push((event_id, value));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn ids(round: &sportnews_personalizer::RenderedRound) -> Vec<String> {
    round
        .items
        .iter()
        .map(|i| i.source_item.id.clone())
        .collect()
}
