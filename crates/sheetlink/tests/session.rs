//! End-to-end tests for `MatchSession` against a mock match server.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use sheetlink::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MATCH: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";
// base64("user:secret")
const AUTH: &str = "Basic dXNlcjpzZWNyZXQ=";

fn config(base_url: &str) -> ClientConfig {
    let transport = TransportConfig {
        request_timeout: Duration::from_millis(500),
        reconnection_time: Duration::from_millis(10),
        ..TransportConfig::with_base_url(base_url)
    };
    ClientConfig::new(MATCH.parse().unwrap(), Credentials::new("user", "secret"))
        .transport(transport)
        .requested_side(TeamSide::Team0)
}

fn team(name: &str) -> TeamConfig {
    let player = |name: &str| PlayerConfig {
        max_velocity: 3.0,
        shot_std_dev: 0.01,
        angle_std_dev: 0.001,
        player_name: name.into(),
    };
    TeamConfig {
        use_default_config: true,
        team_name: name.into(),
        match_team_name: TeamSide::Team1,
        player1: player("lead"),
        player2: player("second"),
        player3: Some(player("third")),
        player4: Some(player("skip")),
    }
}

fn state(total: u32, next: &str, winner: Option<&str>) -> String {
    json!({
        "end_number": 0,
        "shot_number": total,
        "total_shot_number": total,
        "next_shot_team": next,
        "winner_team": winner,
        "score": {"first_team_score": [0], "second_team_score": [0]},
        "stone_coordinate": {"data": {"team0": [], "team1": []}}
    })
    .to_string()
}

fn sse(events: &[(&str, String)]) -> ResponseTemplate {
    let body: String = events
        .iter()
        .map(|(name, data)| format!("event: {name}\ndata: {data}\n\n"))
        .collect();
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream")
}

async fn mount_stream(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/matches/{MATCH}/stream")))
        .and(header("authorization", AUTH))
        .respond_with(response)
        .mount(server)
        .await;
}

// =========================================================================
// Registration
// =========================================================================

#[tokio::test]
async fn test_server_assigned_side_overrides_requested_side() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store-team-config"))
        .and(query_param("match_id", MATCH))
        .and(query_param("expected_match_team_name", "team0"))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("team1")))
        .expect(1)
        .mount(&server)
        .await;

    let session = MatchSession::connect(config(&server.uri())).unwrap();
    assert_eq!(session.assigned_side(), TeamSide::Team0);

    let side = session.register_team(&team("Granite")).await.unwrap();

    assert_eq!(side, TeamSide::Team1);
    assert_eq!(session.assigned_side(), TeamSide::Team1);
}

#[tokio::test]
async fn test_register_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store-team-config"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let session = MatchSession::connect(config(&server.uri())).unwrap();
    let err = session.register_team(&team("Granite")).await.unwrap_err();

    assert!(matches!(err, CallError::Unauthorized));
    // Nothing confirmed, so the requested side still stands.
    assert_eq!(session.assigned_side(), TeamSide::Team0);
}

#[tokio::test]
async fn test_register_server_error_is_a_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store-team-config"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = MatchSession::connect(config(&server.uri())).unwrap();
    let err = session.register_team(&team("Granite")).await.unwrap_err();

    assert!(matches!(
        err,
        CallError::Rejected {
            call: "registration",
            status: 500
        }
    ));
}

#[tokio::test]
async fn test_register_with_server_down() {
    let session = MatchSession::connect(config("http://127.0.0.1:9")).unwrap();
    let err = session.register_team(&team("Granite")).await.unwrap_err();
    assert!(matches!(err, CallError::ServerUnavailable(_)));
}

#[tokio::test]
async fn test_invalid_team_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store-team-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("team0")))
        .expect(0)
        .mount(&server)
        .await;

    let session = MatchSession::connect(config(&server.uri())).unwrap();
    let err = session.register_team(&team("  ")).await.unwrap_err();
    assert!(matches!(err, CallError::InvalidRequest(_)));
}

// =========================================================================
// Shots
// =========================================================================

#[tokio::test]
async fn test_submit_shot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shots"))
        .and(query_param("match_id", MATCH))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = MatchSession::connect(config(&server.uri())).unwrap();
    let shot = ShotCommand::from_components(0.0, 2.4, Rotation::CounterClockwise).unwrap();
    session.submit_shot(&shot).await.unwrap();
}

#[tokio::test]
async fn test_submit_shot_unauthorized_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shots"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = MatchSession::connect(config(&server.uri())).unwrap();
    let shot = ShotCommand::new(2.3, std::f64::consts::FRAC_PI_2, 1.5).unwrap();
    let err = session.submit_shot(&shot).await.unwrap_err();
    assert!(matches!(err, CallError::Unauthorized));
}

// =========================================================================
// State stream
// =========================================================================

#[tokio::test]
async fn test_accessors_fail_before_first_snapshot() {
    let session = MatchSession::connect(config("http://127.0.0.1:9")).unwrap();
    assert!(session.current().is_none());
    assert!(session.winner().is_err());
    assert!(session.is_my_turn().is_err());
    assert_eq!(session.connection_status().state, ConnectionState::Idle);
}

#[tokio::test]
async fn test_caller_stops_on_winner() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse(&[
            ("latest_state_update", state(15, "team1", None)),
            ("state_update", state(16, "team1", None)),
            ("latest_state_update", state(16, "team1", Some("team0"))),
        ]),
    )
    .await;

    let session = MatchSession::connect(config(&server.uri())).unwrap();
    let mut states = std::pin::pin!(session.stream_state().unwrap());

    let mut seen = Vec::new();
    while let Some(state) = states.next().await {
        seen.push(state.total_shot_number);
        if state.is_finished() {
            break;
        }
    }

    assert_eq!(seen, vec![15, 16]);
    assert_eq!(session.winner().unwrap(), Some(TeamSide::Team0));
    assert_eq!(session.total_shot_number().unwrap(), 16);

    let status = session.connection_status();
    assert_eq!(status.state, ConnectionState::Streaming);
    assert_eq!(status.snapshots, 2);
}

#[tokio::test]
async fn test_is_my_turn_follows_assigned_side() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store-team-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("team1")))
        .mount(&server)
        .await;
    mount_stream(&server, sse(&[("latest_state_update", state(3, "team1", None))])).await;

    let session = MatchSession::connect(config(&server.uri())).unwrap();
    let mut states = std::pin::pin!(session.stream_state().unwrap());
    states.next().await.unwrap();

    // Requested team0; not our turn yet.
    assert!(!session.is_my_turn().unwrap());

    session.register_team(&team("Granite")).await.unwrap();
    assert!(session.is_my_turn().unwrap());
}

#[tokio::test]
async fn test_stream_can_be_taken_once() {
    let session = MatchSession::connect(config("http://127.0.0.1:9")).unwrap();
    let _states = session.stream_state().unwrap();
    assert!(matches!(session.stream_state(), Err(SheetlinkError::StreamTaken)));
}

#[tokio::test]
async fn test_server_dying_mid_stream_stops_the_stream() {
    // wiremock always finishes its responses, so a plain socket plays the
    // server: one chunked event, then the connection drops.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let event = format!("event: latest_state_update\ndata: {}\n\n", state(4, "team0", None));
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\n\
             transfer-encoding: chunked\r\n\r\n{:x}\r\n{event}\r\n",
            event.len()
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
    });

    let session = MatchSession::connect(config(&base)).unwrap();
    let mut states = std::pin::pin!(session.stream_state().unwrap());

    assert_eq!(states.next().await.unwrap().total_shot_number, 4);
    // Default policy: a hard disconnect ends the stream without retrying.
    assert!(states.next().await.is_none());

    let status = session.connection_status();
    assert_eq!(status.state, ConnectionState::Aborted);
    assert_eq!(status.disconnects, 1);
    assert_eq!(status.reconnects, 0);
    assert!(status.lost_at.is_some());
    assert_eq!(session.total_shot_number().unwrap(), 4);
}
