// tests/round_e2e.rs
//
// Full rounds through the engine and session with fake feeds and a scripted
// personalizer: fallback order, personalized order, reward attribution.

mod common;

use std::sync::Arc;

use common::{ids, scenario_sources, Script, ScriptedPersonalizer};
use sportnews_personalizer::{NewsSession, RewardReporter, RoundEngine, RoundOrdering};

fn session_with(script: Script) -> (NewsSession, Arc<ScriptedPersonalizer>) {
    let p = ScriptedPersonalizer::new(script);
    let dynp = ScriptedPersonalizer::dyn_of(&p);
    let engine = RoundEngine::new(scenario_sources(), dynp.clone());
    (NewsSession::new(engine, RewardReporter::new(dynp)), p)
}

#[tokio::test]
async fn ranking_failure_shows_aggregator_order_and_rewards_by_position() {
    let (session, p) = session_with(Script::Fail);

    let round = session.refresh().await.expect("feeds available");
    assert_eq!(ids(&round), vec!["1", "3", "2"]);
    assert!(matches!(round.ordering, RoundOrdering::Fallback { .. }));

    // the rank call was still attempted with this round's event id
    let calls = p.rank_calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].event_id, round.event_id);

    // tap position 1 (item "3"): index 1 is in the [0,3) bucket
    let sel = session.select(round.event_id, 1).expect("tap accepted");
    assert_eq!(round.items[1].source_item.id, "3");
    sel.report.await.unwrap();
    assert_eq!(p.rewards(), vec![(round.event_id, 1.0)]);
}

#[tokio::test]
async fn successful_ranking_orders_by_probability() {
    let (session, p) = session_with(Script::Probabilities(vec![
        ("1", 0.2),
        ("3", 0.2),
        ("2", 0.6),
    ]));

    let round = session.refresh().await.unwrap();
    assert!(round.is_personalized());
    // 2 first, then the 0.2 tie in aggregator order (1 before 3)
    assert_eq!(ids(&round), vec!["2", "1", "3"]);

    let sent = p.rank_calls.lock().unwrap()[0].clone();
    let action_ids: Vec<&str> = sent.actions.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(action_ids, vec!["1", "3", "2"]);
    assert!(sent.excluded_actions.is_empty());
}

#[tokio::test]
async fn ranked_items_carry_source_and_thumbnail() {
    let (session, _p) = session_with(Script::Fail);
    let round = session.refresh().await.unwrap();

    let third = &round.items[1];
    assert_eq!(third.source_link, "https://b.example");
    assert_eq!(third.image_url.as_deref(), Some("https://img.example.se/3.jpg"));
}

#[tokio::test]
async fn malformed_response_falls_back() {
    let (session, _p) = session_with(Script::Probabilities(vec![("not-in-round", 0.9)]));
    let round = session.refresh().await.unwrap();
    assert_eq!(ids(&round), vec!["1", "3", "2"]);
    match &round.ordering {
        RoundOrdering::Fallback { reason } => assert!(reason.contains("unknown action id")),
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn round_shows_at_most_the_candidate_limit() {
    let many = (0..120)
        .map(|i| common::item(&format!("n{i}"), Some(i), "big"))
        .collect();
    let p = ScriptedPersonalizer::new(Script::Fail);
    let dynp = ScriptedPersonalizer::dyn_of(&p);
    let engine = RoundEngine::new(vec![common::StaticSource::new("big", many)], dynp);

    let round = engine.run_round().await.unwrap();
    assert_eq!(round.items.len(), sportnews_personalizer::ingest::CANDIDATE_LIMIT);
    assert_eq!(round.items[0].source_item.id, "n119");
}
