// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod rank;
pub mod reward;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::engine::{RenderedRound, RoundEngine, RoundOrdering};
pub use crate::rank::EventId;
pub use crate::reward::{reward_for_position, RewardReporter};
pub use crate::session::NewsSession;

use tracing::info;

/// One-off probe: runs a single round against the live feeds and the
/// configured service and logs the outcome. Never panics.
///
/// Example usage inside a `#[shuttle_runtime::main]` function:
/// ```ignore
/// if let Err(e) = sportnews_personalizer::run_round_probe().await {
///     tracing::warn!(error=?e, "round probe didn't run");
/// }
/// ```
pub async fn run_round_probe() -> anyhow::Result<()> {
    let rt = bootstrap::NewsRuntime::from_env()?;
    match rt.session.refresh().await {
        Ok(round) => info!(
            event_id = %round.event_id,
            items = round.items.len(),
            personalized = round.is_personalized(),
            "round probe finished"
        ),
        Err(e) => tracing::warn!(error = %e, "round probe failed"),
    }
    Ok(())
}
