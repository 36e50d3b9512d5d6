//! Ranking round building blocks: actions, context, the service client and
//! the ordering applied to its answer.

pub mod actions;
pub mod client;
pub mod context;
pub mod order;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use actions::{build_actions, ActionFeature, RankingAction};
pub use client::{
    build_personalizer, DisabledPersonalizer, DynPersonalizer, HttpPersonalizer, Personalizer,
    RankRequest, RankResponse, RankedAction,
};
pub use context::{ContextFeature, ContextFeatures, TimeOfDay};
pub use order::order_by_ranking;

/// Correlation key between a rank call and the reward for the same round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Fresh random (v4, 128-bit) id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
