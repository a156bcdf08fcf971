//! Conversation window behavior across full engine cycles.

mod common;

use common::{demo_engine, mock_engine};
use conflux::adapter::mock::{MockGraphDriver, MockVectorDriver};
use conflux::retriever::CancellationToken;
use conflux::{RetrievalConfig, TargetMode};
use std::sync::Arc;

async fn run_and_commit(engine: &conflux::ConfluxEngine, session: &conflux::SessionId, text: &str) {
    let result = engine
        .run(session, text, TargetMode::UserInsight, &CancellationToken::new())
        .await
        .unwrap();
    engine.commit(session, &result, &result.outcome.fallback_answer());
}

#[tokio::test]
async fn window_keeps_only_the_newest_turns() {
    let engine = mock_engine(
        Arc::new(MockGraphDriver::empty()),
        Arc::new(MockVectorDriver::empty()),
        RetrievalConfig::default(),
    );
    let session = engine.open_session();

    // Turn 1 mentions a vehicle; three entity-less turns follow. With a
    // window of 3 the vehicle turn is evicted.
    run_and_commit(&engine, &session, "Model Y怎么样").await;
    run_and_commit(&engine, &session, "充电桩安装要注意什么").await;
    run_and_commit(&engine, &session, "冬天电池衰减正常吗").await;
    run_and_commit(&engine, &session, "保养周期一般是多久").await;

    let followup = engine
        .run(
            &session,
            "它的续航怎么样",
            TargetMode::UserInsight,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(
        followup.decision.entities.is_empty(),
        "evicted turn must not feed inheritance"
    );
}

#[tokio::test]
async fn fresh_session_has_nothing_to_inherit() {
    let engine = demo_engine();
    let session = engine.open_session();

    let result = engine
        .run(
            &session,
            "它的续航怎么样",
            TargetMode::UserInsight,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(result.decision.entities.is_empty());
}

#[tokio::test]
async fn sessions_do_not_leak_context_into_each_other() {
    let engine = demo_engine();
    let a = engine.open_session();
    let b = engine.open_session();

    run_and_commit(&engine, &a, "Model Y怎么样").await;

    let in_b = engine
        .run(
            &b,
            "它的续航怎么样",
            TargetMode::UserInsight,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(in_b.decision.entities.is_empty());

    let in_a = engine
        .run(
            &a,
            "它的续航怎么样",
            TargetMode::UserInsight,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(in_a.decision.entity_names(), vec!["Model Y"]);
}

#[tokio::test]
async fn closed_session_discards_history() {
    let engine = demo_engine();
    let session = engine.open_session();
    run_and_commit(&engine, &session, "Model Y怎么样").await;

    assert!(engine.close_session(&session));
    assert!(!engine.close_session(&session));
    assert_eq!(engine.session_count(), 0);
}

#[tokio::test]
async fn most_recent_turn_wins_inheritance() {
    let engine = demo_engine();
    let session = engine.open_session();

    run_and_commit(&engine, &session, "Model Y怎么样").await;
    run_and_commit(&engine, &session, "海豹怎么样").await;

    let followup = engine
        .run(
            &session,
            "它的操控怎么样",
            TargetMode::UserInsight,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(followup.decision.entity_names(), vec!["海豹"]);
}
