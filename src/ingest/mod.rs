// src/ingest/mod.rs
pub mod parse;
pub mod providers;
pub mod types;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;

use crate::error::{AggregateError, FeedError};
use crate::ingest::types::{FeedItem, FeedSource, FetchedFeed};

/// Candidate set size handed to the ranking service per round.
pub const CANDIDATE_LIMIT: usize = 50;

/// The fixed pair of sources the app reads.
pub const DEFAULT_FEEDS: [&str; 2] = [
    "https://feeds.expressen.se/sport/",
    "https://www.aftonbladet.se/sportbladet/rss.xml",
];

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_feed_errors_total", "Feed sources that failed in a round.");
        describe_counter!(
            "news_feed_items_total",
            "Items fetched across all sources before truncation."
        );
        describe_counter!(
            "news_feed_http_errors_total",
            "Feed requests that failed in transport or returned a non-2xx status."
        );
        describe_histogram!("news_feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Fetch every source concurrently and build the round's candidate set.
///
/// A failing or slow source is logged and skipped; the round only fails when
/// no source produced a feed.
pub async fn aggregate(
    sources: &[Arc<dyn FeedSource>],
    limit: usize,
    per_source_timeout: Duration,
) -> Result<Vec<FeedItem>, AggregateError> {
    ensure_metrics_described();

    let mut set = JoinSet::new();
    for (idx, src) in sources.iter().enumerate() {
        let src = Arc::clone(src);
        set.spawn(async move {
            let res = match tokio::time::timeout(per_source_timeout, src.fetch_latest()).await {
                Ok(r) => r,
                Err(_) => Err(FeedError::Timeout(per_source_timeout)),
            };
            (idx, res)
        });
    }

    // Slots keep source order regardless of completion order.
    let mut slots: Vec<Option<FetchedFeed>> = sources.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, Ok(feed))) => slots[idx] = Some(feed),
            Ok((idx, Err(e))) => {
                tracing::warn!(error = %e, provider = sources[idx].name(), "feed source failed");
                counter!("news_feed_errors_total").increment(1);
            }
            Err(e) => {
                tracing::warn!(error = %e, "feed fetch task aborted");
                counter!("news_feed_errors_total").increment(1);
            }
        }
    }

    let feeds: Vec<FetchedFeed> = slots.into_iter().flatten().collect();
    if feeds.is_empty() {
        return Err(AggregateError::AllSourcesFailed {
            attempted: sources.len(),
        });
    }

    let fetched: usize = feeds.iter().map(|f| f.items.len()).sum();
    counter!("news_feed_items_total").increment(fetched as u64);

    Ok(merge_candidates(feeds, limit))
}

/// Merge feeds in source order, newest first, unique ids, at most `limit`.
///
/// The sort is stable: equal or missing timestamps keep feed order, and
/// undated items go last. The first occurrence of a repeated id wins.
pub fn merge_candidates(feeds: Vec<FetchedFeed>, limit: usize) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = feeds.into_iter().flat_map(|f| f.items).collect();
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items.retain(|it| seen.insert(it.id.clone()));
    items.truncate(limit);
    items
}
