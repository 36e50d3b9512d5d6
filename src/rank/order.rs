//! Apply the service's ranking to the candidate list.

use std::collections::HashMap;

use crate::error::RankError;
use crate::ingest::types::FeedItem;
use crate::rank::client::RankedAction;

/// Returns candidate indices in display order.
///
/// Descending probability; equal probabilities keep aggregator order.
/// Candidates the service left out follow in aggregator order. An id that is
/// not in the round, a repeated id, or a non-finite probability makes the
/// whole response malformed, and so does an empty ranking for a non-empty
/// round.
pub fn order_by_ranking(
    candidates: &[FeedItem],
    ranking: &[RankedAction],
) -> Result<Vec<usize>, RankError> {
    if ranking.is_empty() && !candidates.is_empty() {
        return Err(RankError::MalformedResponse("empty ranking".to_string()));
    }

    let index_of: HashMap<&str, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let mut placed = vec![false; candidates.len()];
    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(ranking.len());
    for r in ranking {
        let idx = *index_of.get(r.id.as_str()).ok_or_else(|| {
            RankError::MalformedResponse(format!("unknown action id {}", r.id))
        })?;
        if !r.probability.is_finite() {
            return Err(RankError::MalformedResponse(format!(
                "non-finite probability for {}",
                r.id
            )));
        }
        if placed[idx] {
            return Err(RankError::MalformedResponse(format!(
                "action id {} ranked twice",
                r.id
            )));
        }
        placed[idx] = true;
        scored.push((idx, r.probability));
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut order: Vec<usize> = scored.into_iter().map(|(i, _)| i).collect();
    order.extend((0..candidates.len()).filter(|&i| !placed[i]));
    Ok(order)
}
