use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::error::FeedError;
use crate::ingest::parse::parse_feed;
use crate::ingest::types::{FeedSource, FetchedFeed};

/// RSS/Atom source backed either by a live URL or by an in-memory document.
pub struct RssFeedProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl RssFeedProvider {
    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    /// Live source. `client` is shared between providers; `timeout` caps one request.
    pub fn from_url(url: &str, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            name: url.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
                timeout,
            },
        }
    }

    fn parse_document(&self, xml: &str, fallback_link: &str) -> Result<FetchedFeed, FeedError> {
        let t0 = std::time::Instant::now();
        let feed = parse_feed(xml, fallback_link)?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_feed_parse_ms").record(ms);
        tracing::debug!(
            provider = %self.name,
            items = feed.items.len(),
            parse_ms = ms,
            "feed parsed"
        );
        Ok(feed)
    }
}

#[async_trait]
impl FeedSource for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<FetchedFeed, FeedError> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_document(xml, &self.name),

            Mode::Http {
                url,
                client,
                timeout,
            } => {
                let resp = client.get(url).timeout(*timeout).send().await;
                let resp = match resp {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = %self.name, "provider http error");
                        counter!("news_feed_http_errors_total").increment(1);
                        return Err(FeedError::Request(e));
                    }
                };
                let status = resp.status();
                if !status.is_success() {
                    tracing::warn!(status = status.as_u16(), provider = %self.name, "provider http status");
                    counter!("news_feed_http_errors_total").increment(1);
                    return Err(FeedError::Status {
                        status: status.as_u16(),
                        url: url.clone(),
                    });
                }
                let body = resp.text().await?;
                self.parse_document(&body, url)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
