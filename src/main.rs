//! Sport news personalization service: binary entrypoint.
//! Boots the Axum HTTP server the app talks to: wires config, feeds, the
//! ranking client, the session and metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sportnews_personalizer::{api, bootstrap::NewsRuntime, metrics::Metrics};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEWS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sportnews_personalizer=debug,warn"));

    // Shuttle may already have installed a subscriber; keep that one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables PERSONALIZER_ENDPOINT / PERSONALIZER_API_KEY from .env.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let runtime = NewsRuntime::from_env()?;
    let metrics = Metrics::init()?;

    let state = api::AppState {
        session: runtime.session,
    };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
