//! Reward reporting: position → reward step table, fire-and-forget report.

use metrics::counter;
use tokio::task::JoinHandle;

use crate::error::RewardError;
use crate::rank::{DynPersonalizer, EventId};

/// Coarse, non-increasing step function of the tapped position.
pub fn reward_for_position(index: usize) -> f64 {
    match index {
        0..=2 => 1.0,
        3..=4 => 0.8,
        5..=9 => 0.6,
        10..=14 => 0.5,
        15..=19 => 0.4,
        20..=29 => 0.3,
        30..=39 => 0.2,
        _ => 0.1,
    }
}

#[derive(Clone)]
pub struct RewardReporter {
    personalizer: DynPersonalizer,
}

impl RewardReporter {
    pub fn new(personalizer: DynPersonalizer) -> Self {
        Self { personalizer }
    }

    /// Sends the reward for `position` in the round `event_id` on a detached task.
    ///
    /// Nobody awaits or retries this. Failures end up in the log and in
    /// `news_reward_errors_total`. The handle is returned only so tests can
    /// wait for delivery; dropping it leaves the task running.
    pub fn report(&self, event_id: EventId, position: usize) -> JoinHandle<()> {
        let reward = reward_for_position(position);
        let personalizer = self.personalizer.clone();
        tokio::spawn(async move {
            match personalizer.reward(event_id, reward).await {
                Ok(()) => {
                    counter!("news_rewards_sent_total").increment(1);
                    tracing::debug!(%event_id, position, reward, "reward reported");
                }
                Err(RewardError::Disabled) => {
                    tracing::debug!(%event_id, reward, "reward skipped, personalizer disabled");
                }
                Err(e) => {
                    counter!("news_reward_errors_total").increment(1);
                    tracing::warn!(error = %e, %event_id, position, reward, "reward report failed");
                }
            }
        })
    }
}
