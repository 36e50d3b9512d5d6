//! # Round Engine
//! One fetch → rank → display cycle. Every piece of per-round state (event id,
//! candidates, ordering) lives in the returned `RenderedRound`, so overlapping
//! rounds never share anything mutable.
//!
//! Ranking failures are recovered here: the round is then displayed in
//! aggregator order and carries the reason.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;

use crate::display::{self, RankedItem};
use crate::error::{AggregateError, RankError};
use crate::ingest::types::{FeedItem, FeedSource};
use crate::ingest::{self, CANDIDATE_LIMIT};
use crate::rank::{
    build_actions, order_by_ranking, ContextFeatures, DynPersonalizer, EventId, RankRequest,
};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RoundOrdering {
    Personalized,
    Fallback { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRound {
    pub event_id: EventId,
    pub context: ContextFeatures,
    pub ordering: RoundOrdering,
    pub items: Vec<RankedItem>,
}

impl RenderedRound {
    pub fn is_personalized(&self) -> bool {
        self.ordering == RoundOrdering::Personalized
    }
}

pub struct RoundEngine {
    sources: Vec<Arc<dyn FeedSource>>,
    personalizer: DynPersonalizer,
    fetch_timeout: Duration,
}

impl RoundEngine {
    pub fn new(sources: Vec<Arc<dyn FeedSource>>, personalizer: DynPersonalizer) -> Self {
        Self {
            sources,
            personalizer,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Run a round with the context taken from the local clock now.
    pub async fn run_round(&self) -> Result<RenderedRound, AggregateError> {
        self.run_round_with_context(ContextFeatures::now()).await
    }

    pub async fn run_round_with_context(
        &self,
        context: ContextFeatures,
    ) -> Result<RenderedRound, AggregateError> {
        let t0 = Instant::now();
        let candidates =
            ingest::aggregate(&self.sources, CANDIDATE_LIMIT, self.fetch_timeout).await?;

        let event_id = EventId::new();
        let (order, ordering) = match self.rank(event_id, &candidates, &context).await {
            Ok(order) => (order, RoundOrdering::Personalized),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    %event_id,
                    client = self.personalizer.name(),
                    "ranking failed, using feed order"
                );
                counter!("news_rank_fallback_total", "reason" => e.kind()).increment(1);
                (
                    (0..candidates.len()).collect(),
                    RoundOrdering::Fallback {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let items = display::render(&candidates, &order);

        counter!("news_rounds_total").increment(1);
        histogram!("news_round_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::info!(
            %event_id,
            items = items.len(),
            personalized = ordering == RoundOrdering::Personalized,
            time_of_day = context.time_of_day.as_str(),
            "round ready"
        );

        Ok(RenderedRound {
            event_id,
            context,
            ordering,
            items,
        })
    }

    async fn rank(
        &self,
        event_id: EventId,
        candidates: &[FeedItem],
        context: &ContextFeatures,
    ) -> Result<Vec<usize>, RankError> {
        let request = RankRequest::new(event_id, build_actions(candidates), context)?;
        let response = self.personalizer.rank(&request).await?;
        order_by_ranking(candidates, &response.ranking)
    }
}
