//! Error types for each seam of a ranking round.
//!
//! - `FeedError`: one feed source failed (never fatal on its own)
//! - `AggregateError`: every source failed, the round cannot be built
//! - `RankError`: the personalization service could not rank; callers fall back
//! - `RewardError`: a reward report failed; logged by the reporter, never surfaced
//! - `SessionError`: a selection could not be attributed to a delivered round

use std::time::Duration;

use thiserror::Error;

use crate::rank::EventId;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("All {attempted} feed sources failed")]
    AllSourcesFailed { attempted: usize },
}

#[derive(Debug, Error)]
pub enum RankError {
    /// Network, timeout, auth, throttling or server-side failure.
    #[error("Ranking service unavailable: {0}")]
    Unavailable(String),

    /// The round itself cannot be ranked (no actions, duplicate ids, rejected by the service).
    #[error("Malformed round: {0}")]
    MalformedRound(String),

    #[error("Malformed ranking response: {0}")]
    MalformedResponse(String),
}

impl RankError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RankError::Unavailable(_) => "unavailable",
            RankError::MalformedRound(_) => "malformed_round",
            RankError::MalformedResponse(_) => "malformed_response",
        }
    }
}

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Reward rejected: HTTP {0}")]
    Rejected(u16),

    #[error("Ranking service disabled")]
    Disabled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown or already rewarded round: {0}")]
    UnknownRound(EventId),

    #[error("Position {index} out of range for a list of {len} items")]
    PositionOutOfRange { index: usize, len: usize },
}
