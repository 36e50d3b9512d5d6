//! Ranking client: personalization service abstraction + concrete clients.
//!
//! The HTTP client speaks the Azure Personalizer compatible REST shape:
//! `POST {endpoint}/personalizer/v1.0/rank` and
//! `POST {endpoint}/personalizer/v1.0/events/{eventId}/reward`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::personalizer::PersonalizerConfig;
use crate::error::{RankError, RewardError};
use crate::rank::actions::RankingAction;
use crate::rank::context::{ContextFeature, ContextFeatures};
use crate::rank::EventId;

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const USER_AGENT: &str = "sportnews-personalizer/0.1";

// ------------------------------------------------------------
// Wire types
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    pub event_id: EventId,
    pub context_features: Vec<ContextFeature>,
    pub actions: Vec<RankingAction>,
    pub excluded_actions: Vec<String>,
    pub defer_activation: bool,
}

impl RankRequest {
    /// Validates the round before it leaves the process: at least one action,
    /// and action ids unique.
    pub fn new(
        event_id: EventId,
        actions: Vec<RankingAction>,
        context: &ContextFeatures,
    ) -> Result<Self, RankError> {
        if actions.is_empty() {
            return Err(RankError::MalformedRound("no actions to rank".to_string()));
        }
        let mut seen = HashSet::with_capacity(actions.len());
        if let Some(dup) = actions.iter().find(|a| !seen.insert(a.id.as_str())) {
            return Err(RankError::MalformedRound(format!(
                "duplicate action id {}",
                dup.id
            )));
        }

        Ok(Self {
            event_id,
            context_features: context.to_features(),
            actions,
            excluded_actions: Vec::new(),
            defer_activation: false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAction {
    pub id: String,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    pub ranking: Vec<RankedAction>,
    #[serde(default)]
    pub event_id: Option<String>,
}

#[derive(Serialize)]
struct RewardBody {
    value: f64,
}

// ------------------------------------------------------------
// Client abstraction
// ------------------------------------------------------------

#[async_trait]
pub trait Personalizer: Send + Sync {
    async fn rank(&self, request: &RankRequest) -> Result<RankResponse, RankError>;
    async fn reward(&self, event_id: EventId, value: f64) -> Result<(), RewardError>;
    /// Client name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Shared, read-only after construction.
pub type DynPersonalizer = Arc<dyn Personalizer>;

/// Factory: the HTTP client when endpoint and key are present, otherwise the
/// disabled client (every round then uses feed order).
pub fn build_personalizer(cfg: &PersonalizerConfig) -> anyhow::Result<DynPersonalizer> {
    if !cfg.is_usable() {
        tracing::info!(
            enabled = cfg.enabled,
            has_endpoint = !cfg.endpoint.is_empty(),
            key_len = cfg.api_key.len(),
            "personalizer disabled; rounds will use feed order"
        );
        return Ok(Arc::new(DisabledPersonalizer));
    }
    let client = HttpPersonalizer::new(
        &cfg.endpoint,
        &cfg.api_key,
        Duration::from_secs(cfg.rank_timeout_secs),
    )?;
    Ok(Arc::new(client))
}

pub struct HttpPersonalizer {
    http: reqwest::Client,
    base: String,
    api_key: String,
}

impl HttpPersonalizer {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn rank_url(&self) -> String {
        format!("{}/personalizer/v1.0/rank", self.base)
    }

    fn reward_url(&self, event_id: EventId) -> String {
        format!("{}/personalizer/v1.0/events/{event_id}/reward", self.base)
    }
}

#[async_trait]
impl Personalizer for HttpPersonalizer {
    async fn rank(&self, request: &RankRequest) -> Result<RankResponse, RankError> {
        let resp = self
            .http
            .post(self.rank_url())
            .header(KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RankError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            let body = resp.text().await.unwrap_or_default();
            return Err(RankError::MalformedRound(format!(
                "service rejected round: {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        if !status.is_success() {
            // 401/403 (credential), 429 (quota), 5xx: all recoverable by fallback.
            return Err(RankError::Unavailable(format!("HTTP {status}")));
        }

        resp.json::<RankResponse>()
            .await
            .map_err(|e| RankError::MalformedResponse(e.to_string()))
    }

    async fn reward(&self, event_id: EventId, value: f64) -> Result<(), RewardError> {
        let resp = self
            .http
            .post(self.reward_url(event_id))
            .header(KEY_HEADER, &self.api_key)
            .json(&RewardBody { value })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RewardError::Rejected(status.as_u16()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Used when no endpoint/credential is configured.
pub struct DisabledPersonalizer;

#[async_trait]
impl Personalizer for DisabledPersonalizer {
    async fn rank(&self, _request: &RankRequest) -> Result<RankResponse, RankError> {
        Err(RankError::Unavailable("personalizer disabled".to_string()))
    }

    async fn reward(&self, _event_id: EventId, _value: f64) -> Result<(), RewardError> {
        Err(RewardError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::context::TimeOfDay;

    fn action(id: &str) -> RankingAction {
        RankingAction {
            id: id.to_string(),
            features: Vec::new(),
        }
    }

    fn ctx() -> ContextFeatures {
        ContextFeatures {
            time_of_day: TimeOfDay::Evening,
        }
    }

    #[test]
    fn request_rejects_empty_and_duplicate_rounds() {
        let err = RankRequest::new(EventId::new(), vec![], &ctx()).unwrap_err();
        assert!(matches!(err, RankError::MalformedRound(_)));

        let err = RankRequest::new(EventId::new(), vec![action("a"), action("a")], &ctx())
            .unwrap_err();
        assert!(matches!(err, RankError::MalformedRound(m) if m.contains("duplicate")));
    }

    #[test]
    fn request_wire_shape() {
        let id = EventId::new();
        let req = RankRequest::new(id, vec![action("a")], &ctx()).unwrap();
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["eventId"], serde_json::json!(id.to_string()));
        assert_eq!(v["contextFeatures"], serde_json::json!([{"timeOfDay": "evening"}]));
        assert_eq!(v["excludedActions"], serde_json::json!([]));
        assert_eq!(v["actions"][0]["id"], "a");
        assert_eq!(v["deferActivation"], false);
    }

    #[test]
    fn urls_tolerate_trailing_slash() {
        let c = HttpPersonalizer::new("https://svc.example/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(c.rank_url(), "https://svc.example/personalizer/v1.0/rank");
        let id = EventId::new();
        assert_eq!(
            c.reward_url(id),
            format!("https://svc.example/personalizer/v1.0/events/{id}/reward")
        );
    }

    #[tokio::test]
    async fn disabled_client_always_fails_rank() {
        let req = RankRequest::new(EventId::new(), vec![action("a")], &ctx()).unwrap();
        let err = DisabledPersonalizer.rank(&req).await.unwrap_err();
        assert!(matches!(err, RankError::Unavailable(_)));
    }
}
