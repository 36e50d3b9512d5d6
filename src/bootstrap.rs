// src/bootstrap.rs
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::personalizer::PersonalizerConfig;
use crate::engine::RoundEngine;
use crate::ingest::providers::rss::RssFeedProvider;
use crate::ingest::types::FeedSource;
use crate::ingest::DEFAULT_FEEDS;
use crate::rank::build_personalizer;
use crate::reward::RewardReporter;
use crate::session::NewsSession;

/// Everything a running service needs, wired from one config.
pub struct NewsRuntime {
    pub session: Arc<NewsSession>,
}

impl NewsRuntime {
    pub fn from_config(cfg: PersonalizerConfig) -> anyhow::Result<Self> {
        // Safe diagnostics: only endpoint + enabled + key length
        info!(
            "personalizer cfg loaded: endpoint={}, enabled={}, key_len={}",
            cfg.endpoint,
            cfg.enabled,
            cfg.api_key.len()
        );

        let fetch_timeout = Duration::from_secs(cfg.fetch_timeout_secs);
        let http = reqwest::Client::builder()
            .user_agent("sportnews-personalizer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .build()?;
        let sources: Vec<Arc<dyn FeedSource>> = DEFAULT_FEEDS
            .iter()
            .map(|url| {
                Arc::new(RssFeedProvider::from_url(url, http.clone(), fetch_timeout))
                    as Arc<dyn FeedSource>
            })
            .collect();

        let personalizer = build_personalizer(&cfg)?;
        let engine = RoundEngine::new(sources, personalizer.clone()).with_fetch_timeout(fetch_timeout);
        let session = Arc::new(NewsSession::new(engine, RewardReporter::new(personalizer)));

        Ok(Self { session })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_config(PersonalizerConfig::load_default()?)
    }
}
