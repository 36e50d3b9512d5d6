// src/ingest/types.rs
use chrono::{DateTime, Utc};

use crate::error::FeedError;

/// One syndication item, immutable once fetched.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String, // guid / atom id, falls back to the item link
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>, // raw, may embed HTML and URLs
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_link: String, // link of the feed this item came from
}

/// A parsed feed document: its own link plus items tagged with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFeed {
    pub link: String,
    pub items: Vec<FeedItem>,
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<FetchedFeed, FeedError>;
    fn name(&self) -> &str;
}
