//! Integration tests for Store action broadcasting
//!
//! Tests the action observation features used to await the settled phase of
//! an async action without polling state.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use pocketbook_core::{
    effect::Effect, reducer::Reducer, smallvec, AsyncPhase, Rejection, SmallVec,
};
use pocketbook_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Load a page of numbers
    Load(AsyncPhase<LoadRequest, Vec<u32>>),
    /// Action no effect ever produces
    Never,
}

#[derive(Debug, Clone, PartialEq)]
struct LoadRequest {
    page: u32,
    fail: bool,
    latency: Duration,
}

#[derive(Debug, Clone, Default)]
struct TestState {
    items: Vec<u32>,
    loading: bool,
    error: Option<String>,
}

#[derive(Clone)]
struct TestEnvironment;

#[derive(Clone)]
struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Load(AsyncPhase::Pending(request)) => {
                state.loading = true;
                state.error = None;
                smallvec![Effect::future(async move {
                    tokio::time::sleep(request.latency).await;
                    let result = if request.fail {
                        Err(format!("page {} unavailable", request.page))
                    } else {
                        Ok(vec![request.page * 10, request.page * 10 + 1])
                    };
                    Some(TestAction::Load(AsyncPhase::settle(result, Rejection::new)))
                })]
            },
            TestAction::Load(AsyncPhase::Fulfilled(items)) => {
                state.loading = false;
                state.items = items;
                smallvec![Effect::None]
            },
            TestAction::Load(AsyncPhase::Rejected(rejection)) => {
                state.loading = false;
                state.error = Some(rejection.message);
                smallvec![Effect::None]
            },
            TestAction::Never => smallvec![Effect::None],
        }
    }
}

fn store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::new(TestState::default(), TestReducer, TestEnvironment)
}

fn load_after(page: u32, fail: bool, latency: Duration) -> TestAction {
    TestAction::Load(AsyncPhase::Pending(LoadRequest {
        page,
        fail,
        latency,
    }))
}

fn load(page: u32, fail: bool) -> TestAction {
    load_after(page, fail, Duration::from_millis(5))
}

fn is_settled(action: &TestAction) -> bool {
    matches!(
        action,
        TestAction::Load(AsyncPhase::Fulfilled(_) | AsyncPhase::Rejected(_))
    )
}

// ============================================================================
// Tests
// ============================================================================

/// `send_and_wait_for` returns the fulfilled phase once the effect settles
#[tokio::test]
async fn test_send_and_wait_for_fulfilled() {
    let store = store();

    let result = store
        .send_and_wait_for(load(3, false), is_settled, Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(result, TestAction::Load(AsyncPhase::Fulfilled(vec![30, 31])));
    assert_eq!(store.state(|s| s.items.clone()).await, vec![30, 31]);
}

/// `send_and_wait_for` returns the rejected phase with its message
#[tokio::test]
async fn test_send_and_wait_for_rejected() {
    let store = store();

    let result = store
        .send_and_wait_for(load(7, true), is_settled, Duration::from_secs(1))
        .await
        .unwrap();

    match result {
        TestAction::Load(AsyncPhase::Rejected(rejection)) => {
            assert_eq!(rejection.message, "page 7 unavailable");
            assert_eq!(rejection.status, None);
        },
        other => panic!("unexpected action {other:?}"),
    }

    let (error, loading) = store.state(|s| (s.error.clone(), s.loading)).await;
    assert_eq!(error.as_deref(), Some("page 7 unavailable"));
    assert!(!loading);
}

/// Waiting for an action that never arrives times out
#[tokio::test]
async fn test_send_and_wait_for_timeout() {
    let store = store();

    let result = store
        .send_and_wait_for(
            load(1, false),
            |action| matches!(action, TestAction::Never),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

/// Every effect-produced action reaches subscribers
#[tokio::test]
async fn test_subscribe_actions_streaming() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = Arc::clone(&received);

    let collector = tokio::spawn(async move {
        for _ in 0..2 {
            if let Ok(action) = rx.recv().await {
                received_clone.lock().await.push(action);
            }
        }
    });

    let mut first = store.send(load(1, false)).await.unwrap();
    first.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    let mut second = store.send(load(2, true)).await.unwrap();
    second.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), collector)
        .await
        .expect("collector finished")
        .unwrap();

    let actions = received.lock().await;
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0], TestAction::Load(AsyncPhase::Fulfilled(vec![10, 11])));
    assert!(matches!(&actions[1], TestAction::Load(AsyncPhase::Rejected(_))));
}

/// Two overlapping loads: whichever settles last determines the state
#[tokio::test]
async fn test_last_settled_response_wins() {
    let store = store();

    let mut slow = store
        .send(load_after(1, false, Duration::from_millis(80)))
        .await
        .unwrap();
    let mut fast = store
        .send(load_after(2, false, Duration::from_millis(5)))
        .await
        .unwrap();
    fast.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    assert_eq!(store.state(|s| s.items.clone()).await, vec![20, 21]);

    slow.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    let (items, loading) = store.state(|s| (s.items.clone(), s.loading)).await;
    assert_eq!(items, vec![10, 11]);
    assert!(!loading);
}

/// The matched action is already reduced when `send_and_wait_for` returns
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_matched_action_is_visible_in_state() {
    let store = store();

    for page in 0..200 {
        let settled = store
            .send_and_wait_for(
                load_after(page, page % 3 == 0, Duration::ZERO),
                is_settled,
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        let (items, error, loading) = store
            .state(|s| (s.items.clone(), s.error.clone(), s.loading))
            .await;
        assert!(!loading, "page {page} still loading");
        match settled {
            TestAction::Load(AsyncPhase::Fulfilled(expected)) => assert_eq!(items, expected),
            TestAction::Load(AsyncPhase::Rejected(rejection)) => {
                assert_eq!(error, Some(rejection.message));
            },
            other => panic!("unexpected action {other:?}"),
        }
    }
}
