//! HTTP bridge to the presentation layer.
//!
//! - `GET  /health`
//! - `GET  /news`          list currently displayed (404 before the first round)
//! - `POST /news/refresh`  run a round; 503 when every feed failed
//! - `POST /news/select`   `{eventId, index}` → reward handed to the reporter

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::engine::RenderedRound;
use crate::error::{AggregateError, SessionError};
use crate::rank::EventId;
use crate::session::NewsSession;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<NewsSession>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(current_news))
        .route("/news/refresh", post(refresh_news))
        .route("/news/select", post(select_item))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    NoRoundYet,
    Feeds(AggregateError),
    Session(SessionError),
}

impl From<AggregateError> for ApiError {
    fn from(e: AggregateError) -> Self {
        ApiError::Feeds(e)
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        ApiError::Session(e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            ApiError::NoRoundYet => (StatusCode::NOT_FOUND, "No news loaded yet", None),
            ApiError::Feeds(e) => {
                tracing::error!("feed error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "News feeds unavailable",
                    Some(e.to_string()),
                )
            }
            ApiError::Session(e @ SessionError::UnknownRound(_)) => {
                (StatusCode::NOT_FOUND, "Unknown round", Some(e.to_string()))
            }
            ApiError::Session(e @ SessionError::PositionOutOfRange { .. }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Position out of range",
                Some(e.to_string()),
            ),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });
        (status, body).into_response()
    }
}

async fn current_news(State(state): State<AppState>) -> Result<Json<RenderedRound>, ApiError> {
    let round = state.session.current().ok_or(ApiError::NoRoundYet)?;
    Ok(Json(round.as_ref().clone()))
}

async fn refresh_news(State(state): State<AppState>) -> Result<Json<RenderedRound>, ApiError> {
    let round = state.session.refresh().await?;
    Ok(Json(round.as_ref().clone()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectReq {
    event_id: EventId,
    index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectResp {
    event_id: EventId,
    index: usize,
    reward: f64,
}

async fn select_item(
    State(state): State<AppState>,
    Json(body): Json<SelectReq>,
) -> Result<(StatusCode, Json<SelectResp>), ApiError> {
    // The reward task runs detached; dropping the handle does not cancel it.
    let sel = state.session.select(body.event_id, body.index)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SelectResp {
            event_id: sel.event_id,
            index: sel.index,
            reward: sel.reward,
        }),
    ))
}
