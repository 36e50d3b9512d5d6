//! News session: the state behind one displayed list.
//!
//! - Each refresh gets a generation number. A round that completes after a
//!   newer one was already displayed is ignored; the newer list stays.
//! - Every delivered round is remembered by its own event id (bounded
//!   history), so a tap on a stale list is rewarded under the id of the round
//!   that produced that list, never the latest one.
//! - One reward per round: the round is forgotten once its reward is handed off.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::engine::{RenderedRound, RoundEngine};
use crate::error::{AggregateError, SessionError};
use crate::rank::EventId;
use crate::reward::{reward_for_position, RewardReporter};

/// Delivered rounds kept for late taps.
pub const ROUND_HISTORY: usize = 32;

#[derive(Debug, Clone, Copy)]
struct DeliveredRound {
    event_id: EventId,
    len: usize,
}

#[derive(Default)]
struct SessionState {
    displayed: Option<(u64, Arc<RenderedRound>)>,
    delivered: VecDeque<DeliveredRound>,
}

impl SessionState {
    fn remember(&mut self, round: &RenderedRound) {
        if self.delivered.len() == ROUND_HISTORY {
            if let Some(old) = self.delivered.pop_front() {
                tracing::debug!(event_id = %old.event_id, "round aged out without reward");
            }
        }
        self.delivered.push_back(DeliveredRound {
            event_id: round.event_id,
            len: round.items.len(),
        });
    }
}

/// Outcome of a tap. `report` is the detached reward task.
#[derive(Debug)]
pub struct Selection {
    pub event_id: EventId,
    pub index: usize,
    pub reward: f64,
    pub report: JoinHandle<()>,
}

pub struct NewsSession {
    engine: RoundEngine,
    reporter: RewardReporter,
    generation: AtomicU64,
    state: Mutex<SessionState>,
}

impl NewsSession {
    pub fn new(engine: RoundEngine, reporter: RewardReporter) -> Self {
        Self {
            engine,
            reporter,
            generation: AtomicU64::new(0),
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// The list currently on screen, if any round completed yet.
    pub fn current(&self) -> Option<Arc<RenderedRound>> {
        self.lock().displayed.as_ref().map(|(_, r)| Arc::clone(r))
    }

    /// Run a round and display it, unless a newer round got there first.
    ///
    /// On total feed failure the previous list (if any) stays displayed and
    /// the error is returned for the presentation layer's error state.
    pub async fn refresh(&self) -> Result<Arc<RenderedRound>, AggregateError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let round = self.engine.run_round().await?;
        Ok(self.publish(generation, round))
    }

    fn publish(&self, generation: u64, round: RenderedRound) -> Arc<RenderedRound> {
        let mut state = self.lock();
        if let Some((shown_generation, shown)) = &state.displayed {
            if *shown_generation > generation {
                tracing::debug!(
                    late = %round.event_id,
                    displayed = %shown.event_id,
                    "ignoring superseded round"
                );
                return Arc::clone(shown);
            }
        }
        let round = Arc::new(round);
        state.remember(&round);
        state.displayed = Some((generation, Arc::clone(&round)));
        round
    }

    /// The user tapped `index` in the list produced by `event_id`.
    pub fn select(&self, event_id: EventId, index: usize) -> Result<Selection, SessionError> {
        let mut state = self.lock();
        let pos = state
            .delivered
            .iter()
            .position(|r| r.event_id == event_id)
            .ok_or(SessionError::UnknownRound(event_id))?;

        let len = state.delivered[pos].len;
        if index >= len {
            return Err(SessionError::PositionOutOfRange { index, len });
        }
        state.delivered.remove(pos);
        drop(state);

        let reward = reward_for_position(index);
        tracing::info!(%event_id, index, reward, "item selected");
        let report = self.reporter.report(event_id, index);
        Ok(Selection {
            event_id,
            index,
            reward,
            report,
        })
    }
}
