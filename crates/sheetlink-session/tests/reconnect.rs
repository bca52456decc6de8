//! Integration tests for the reconnection controller.
//!
//! A scripted transport replays a fixed sequence of subscription outcomes
//! and events, so every failure path can be driven without a network.
//! Tests that measure downtime run on Tokio's paused clock: sleeps resolve
//! instantly but still advance time by exactly the requested amount.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use sheetlink_protocol::{MatchId, ShotCommand, StateSnapshot, TeamConfig, TeamSide};
use sheetlink_session::{
    AUTHORITATIVE_EVENT, ConnectionState, DisconnectPolicy, INFORMATIONAL_EVENT,
    ReconnectController, SessionConfig, Sleeper, StateStore,
};
use sheetlink_transport::{RawEvent, Subscription, Transport, TransportError};

// =========================================================================
// Scripted transport
// =========================================================================

/// One scripted answer to `subscribe`.
enum Step {
    /// Opening the subscription fails.
    Refuse(TransportError),
    /// Opening succeeds; the subscription replays these items, then ends
    /// cleanly.
    Open(Vec<Result<RawEvent, TransportError>>),
}

#[derive(Default)]
struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    subscribes: AtomicUsize,
    /// Subscriptions currently alive (not yet dropped).
    open: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    fn open_subscriptions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

struct ScriptedSubscription {
    items: VecDeque<Result<RawEvent, TransportError>>,
    /// Past the end of the script: never yield anything.
    hang: bool,
    open: Arc<AtomicUsize>,
}

impl Drop for ScriptedSubscription {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Subscription for ScriptedSubscription {
    async fn next_event(&mut self) -> Result<Option<RawEvent>, TransportError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        match self.items.pop_front() {
            Some(item) => item.map(Some),
            None => Ok(None),
        }
    }
}

impl Transport for ScriptedTransport {
    type Subscription = ScriptedSubscription;

    async fn register_team(
        &self,
        _match_id: MatchId,
        expected_side: TeamSide,
        _team: &TeamConfig,
    ) -> Result<TeamSide, TransportError> {
        Ok(expected_side)
    }

    async fn submit_shot(&self, _match_id: MatchId, _shot: &ShotCommand) -> Result<(), TransportError> {
        Ok(())
    }

    async fn subscribe(&self, _match_id: MatchId) -> Result<ScriptedSubscription, TransportError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().pop_front();
        let (items, hang) = match step {
            Some(Step::Refuse(e)) => return Err(e),
            Some(Step::Open(items)) => (items.into(), false),
            None => (VecDeque::new(), true),
        };
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSubscription {
            items,
            hang,
            open: Arc::clone(&self.open),
        })
    }
}

/// Records requested delays and returns at once.
#[derive(Clone, Default)]
struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn match_id() -> MatchId {
    "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap()
}

fn state_json(total: u32, winner: Option<&str>) -> String {
    serde_json::json!({
        "end_number": total / 16,
        "shot_number": total % 16,
        "total_shot_number": total,
        "next_shot_team": if total % 2 == 0 { "team0" } else { "team1" },
        "winner_team": winner,
    })
    .to_string()
}

fn latest(total: u32) -> Result<RawEvent, TransportError> {
    Ok(RawEvent::new(AUTHORITATIVE_EVENT, state_json(total, None)))
}

fn info(total: u32) -> Result<RawEvent, TransportError> {
    Ok(RawEvent::new(INFORMATIONAL_EVENT, state_json(total, None)))
}

fn decoded(total: u32) -> StateSnapshot {
    serde_json::from_str(&state_json(total, None)).unwrap()
}

fn timeout() -> TransportError {
    TransportError::Timeout("no event".into())
}

fn closed() -> TransportError {
    TransportError::ConnectionClosed("peer went away".into())
}

fn server_error() -> TransportError {
    TransportError::UnexpectedStatus {
        endpoint: "/matches/x/stream".into(),
        status: 500,
    }
}

fn controller(
    transport: &Arc<ScriptedTransport>,
    store: &StateStore,
    config: SessionConfig,
    sleeper: &RecordingSleeper,
) -> ReconnectController<ScriptedTransport, RecordingSleeper> {
    ReconnectController::new(Arc::clone(transport), match_id(), store.clone(), config)
        .with_sleeper(sleeper.clone())
}

// =========================================================================
// Classification through the loop
// =========================================================================

#[tokio::test]
async fn test_only_authoritative_events_reach_store_and_caller() {
    let transport = ScriptedTransport::new(vec![Step::Open(vec![
        info(1),
        Ok(RawEvent::new("heartbeat", "{}")),
        latest(2),
        info(3),
    ])]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let ctl = controller(&transport, &store, SessionConfig::default(), &sleeper);
    let monitor = ctl.monitor();
    let mut stream = pin!(ctl.into_stream());

    let first = stream.next().await.unwrap();
    assert_eq!(first, decoded(2));
    assert_eq!(store.current().as_deref(), Some(&decoded(2)));
    assert_eq!(monitor.status().snapshots, 1);
}

#[tokio::test(start_paused = true)]
async fn test_non_authoritative_events_never_touch_store() {
    let transport = ScriptedTransport::new(vec![Step::Open(vec![
        info(1),
        Ok(RawEvent::new("ping", "")),
        info(2),
    ])]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let mut stream = pin!(controller(&transport, &store, SessionConfig::default(), &sleeper).into_stream());

    // After the script the stream reconnects and then hangs; nothing is
    // ever yielded.
    let next = tokio::time::timeout(Duration::from_secs(60), stream.next()).await;
    assert!(next.is_err(), "no snapshot should be yielded");
    assert!(!store.has_state());
}

#[tokio::test]
async fn test_malformed_payload_is_dropped_and_stream_continues() {
    let transport = ScriptedTransport::new(vec![Step::Open(vec![
        Ok(RawEvent::new(AUTHORITATIVE_EVENT, "{not json")),
        Ok(RawEvent::new(AUTHORITATIVE_EVENT, r#"{"end_number": 1}"#)),
        latest(4),
    ])]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let mut stream = pin!(controller(&transport, &store, SessionConfig::default(), &sleeper).into_stream());

    assert_eq!(stream.next().await.unwrap(), decoded(4));
    assert_eq!(transport.subscribes(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_snapshots_yielded_in_arrival_order() {
    let transport =
        ScriptedTransport::new(vec![Step::Open(vec![latest(1), info(9), latest(2), latest(3)])]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let stream = controller(&transport, &store, SessionConfig::default(), &sleeper).into_stream();

    let got: Vec<u32> = stream.take(3).map(|s| s.total_shot_number).collect().await;
    assert_eq!(got, vec![1, 2, 3]);
    assert_eq!(store.total_shot_number().unwrap(), 3);
}

#[tokio::test]
async fn test_replayed_event_leaves_same_state() {
    let transport = ScriptedTransport::new(vec![Step::Open(vec![latest(5), latest(5)])]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let stream = controller(&transport, &store, SessionConfig::default(), &sleeper).into_stream();

    let got: Vec<StateSnapshot> = stream.take(2).collect().await;
    assert_eq!(got[0], got[1]);
    assert_eq!(store.current().as_deref(), Some(&decoded(5)));
}

// =========================================================================
// Retry policy
// =========================================================================

#[tokio::test]
async fn test_timeout_retries_after_one_short_delay() {
    let transport = ScriptedTransport::new(vec![
        Step::Open(vec![Err(timeout())]),
        Step::Open(vec![latest(1)]),
    ]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let mut stream = pin!(controller(&transport, &store, SessionConfig::default(), &sleeper).into_stream());

    assert_eq!(stream.next().await.unwrap(), decoded(1));
    assert_eq!(store.current().as_deref(), Some(&decoded(1)));
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
    assert_eq!(transport.subscribes(), 2);
}

#[tokio::test]
async fn test_other_error_retries_after_one_long_delay() {
    let transport = ScriptedTransport::new(vec![
        Step::Open(vec![Err(TransportError::Stream("garbled frame".into()))]),
        Step::Open(vec![latest(1)]),
    ]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let mut stream = pin!(controller(&transport, &store, SessionConfig::default(), &sleeper).into_stream());

    assert_eq!(stream.next().await.unwrap(), decoded(1));
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(5)]);
    assert_eq!(transport.subscribes(), 2);
}

#[tokio::test]
async fn test_failure_to_open_retries_after_long_delay() {
    let transport = ScriptedTransport::new(vec![
        Step::Refuse(server_error()),
        Step::Refuse(server_error()),
        Step::Open(vec![latest(1)]),
    ]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let ctl = controller(&transport, &store, SessionConfig::default(), &sleeper);
    let monitor = ctl.monitor();
    let mut stream = pin!(ctl.into_stream());

    assert_eq!(stream.next().await.unwrap(), decoded(1));
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(5), Duration::from_secs(5)]);
    assert_eq!(monitor.status().other_failures, 2);
    assert_eq!(monitor.status().reconnects, 1);
}

#[tokio::test]
async fn test_hard_disconnect_ends_stream_without_retry() {
    let transport = ScriptedTransport::new(vec![
        Step::Open(vec![latest(1), Err(closed())]),
        Step::Open(vec![latest(2)]),
    ]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let ctl = controller(&transport, &store, SessionConfig::default(), &sleeper);
    let monitor = ctl.monitor();
    let mut stream = pin!(ctl.into_stream());

    assert_eq!(stream.next().await.unwrap(), decoded(1));
    assert!(stream.next().await.is_none());

    assert_eq!(transport.subscribes(), 1);
    assert!(sleeper.delays().is_empty());
    let status = monitor.status();
    assert_eq!(status.state, ConnectionState::Aborted);
    assert_eq!(status.disconnects, 1);
    assert!(status.lost_at.is_some(), "loss mark stays set after abort");
    // The last good state is still readable.
    assert_eq!(store.total_shot_number().unwrap(), 1);
}

#[tokio::test]
async fn test_hard_disconnect_retried_when_policy_allows() {
    let transport = ScriptedTransport::new(vec![
        Step::Open(vec![Err(closed())]),
        Step::Open(vec![latest(2)]),
    ]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let config = SessionConfig::default().disconnect_policy(DisconnectPolicy::Retry {
        delay: Duration::from_secs(3),
    });
    let mut stream = pin!(controller(&transport, &store, config, &sleeper).into_stream());

    assert_eq!(stream.next().await.unwrap(), decoded(2));
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(3)]);
}

#[tokio::test]
async fn test_clean_end_reconnects_without_marking_loss() {
    let transport = ScriptedTransport::new(vec![Step::Open(vec![]), Step::Open(vec![latest(1)])]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let ctl = controller(&transport, &store, SessionConfig::default(), &sleeper);
    let monitor = ctl.monitor();
    let mut stream = pin!(ctl.into_stream());

    assert_eq!(stream.next().await.unwrap(), decoded(1));
    assert_eq!(transport.subscribes(), 2);
    let status = monitor.status();
    assert_eq!(status.reconnects, 0);
    assert!(status.last_downtime.is_none());
}

// =========================================================================
// Downtime measurement (paused clock)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_downtime_after_timeout_equals_delay() {
    let transport = ScriptedTransport::new(vec![
        Step::Open(vec![Err(timeout())]),
        Step::Open(vec![latest(1)]),
    ]);
    let store = StateStore::new();
    let ctl = ReconnectController::new(
        Arc::clone(&transport),
        match_id(),
        store.clone(),
        SessionConfig::default(),
    );
    let monitor = ctl.monitor();
    let mut stream = pin!(ctl.into_stream());

    stream.next().await.unwrap();
    let status = monitor.status();
    assert_eq!(status.last_downtime, Some(Duration::from_secs(1)));
    assert!(status.lost_at.is_none(), "mark cleared after logging");
    assert_eq!(status.state, ConnectionState::Streaming);
}

#[tokio::test(start_paused = true)]
async fn test_downtime_spans_consecutive_failures() {
    let transport = ScriptedTransport::new(vec![
        Step::Open(vec![Err(timeout())]),
        Step::Refuse(server_error()),
        Step::Open(vec![latest(1)]),
    ]);
    let store = StateStore::new();
    let ctl = ReconnectController::new(
        Arc::clone(&transport),
        match_id(),
        store.clone(),
        SessionConfig::default(),
    );
    let monitor = ctl.monitor();
    let mut stream = pin!(ctl.into_stream());

    stream.next().await.unwrap();
    // 1s after the timeout, then 5s after the failed reopen.
    assert_eq!(monitor.status().last_downtime, Some(Duration::from_secs(6)));
    assert_eq!(monitor.status().reconnects, 1);
}

// =========================================================================
// Match end and cancellation
// =========================================================================

#[tokio::test]
async fn test_winner_does_not_end_stream() {
    let transport = ScriptedTransport::new(vec![Step::Open(vec![
        Ok(RawEvent::new(AUTHORITATIVE_EVENT, state_json(80, Some("team0")))),
        latest(81),
    ])]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let mut stream = pin!(controller(&transport, &store, SessionConfig::default(), &sleeper).into_stream());

    let last = stream.next().await.unwrap();
    assert!(last.is_finished());
    assert_eq!(store.winner().unwrap(), Some(TeamSide::Team0));

    // The controller keeps going; it is the caller's job to stop.
    assert!(stream.next().await.is_some());
}

#[tokio::test]
async fn test_dropping_stream_releases_subscription() {
    let transport = ScriptedTransport::new(vec![Step::Open(vec![latest(1), latest(2)])]);
    let store = StateStore::new();
    let sleeper = RecordingSleeper::default();
    let mut stream = Box::pin(controller(&transport, &store, SessionConfig::default(), &sleeper).into_stream());

    stream.next().await.unwrap();
    assert_eq!(transport.open_subscriptions(), 1);

    drop(stream);
    assert_eq!(transport.open_subscriptions(), 0);
}

#[tokio::test]
async fn test_subscription_released_before_retry_delay() {
    let transport = ScriptedTransport::new(vec![
        Step::Open(vec![Err(timeout())]),
        Step::Open(vec![latest(1)]),
    ]);
    let store = StateStore::new();
    let open = Arc::clone(&transport.open);

    // Checks, at the moment of the delay, that nothing is left open.
    #[derive(Clone)]
    struct AssertingSleeper(Arc<AtomicUsize>);
    impl Sleeper for AssertingSleeper {
        async fn sleep(&self, _duration: Duration) {
            assert_eq!(self.0.load(Ordering::SeqCst), 0);
        }
    }

    let ctl = ReconnectController::new(
        Arc::clone(&transport),
        match_id(),
        store.clone(),
        SessionConfig::default(),
    )
    .with_sleeper(AssertingSleeper(open));
    let mut stream = pin!(ctl.into_stream());
    assert_eq!(stream.next().await.unwrap(), decoded(1));
}
