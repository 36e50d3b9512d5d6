//! Action builder: one rankable action per candidate.

use serde::Serialize;

use crate::ingest::types::FeedItem;

/// A single named feature group. Serializes as `{"title": ...}` etc.;
/// absent values stay `null` instead of becoming empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionFeature {
    Title(Option<String>),
    Author(Option<String>),
    Description(Option<String>),
    Source(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingAction {
    pub id: String,
    pub features: Vec<ActionFeature>,
}

impl RankingAction {
    pub fn from_item(item: &FeedItem) -> Self {
        Self {
            id: item.id.clone(),
            features: vec![
                ActionFeature::Title(item.title.clone()),
                ActionFeature::Author(item.author.clone()),
                ActionFeature::Description(item.description.clone()),
                ActionFeature::Source(item.source_link.clone()),
            ],
        }
    }
}

/// One action per candidate, same order, same ids.
pub fn build_actions(candidates: &[FeedItem]) -> Vec<RankingAction> {
    candidates.iter().map(RankingAction::from_item).collect()
}
