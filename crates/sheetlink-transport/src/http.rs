//! HTTP transport: JSON calls plus a server-sent-event state stream.

use std::pin::Pin;
use std::time::Duration;

use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use sheetlink_protocol::{Codec, JsonCodec, MatchId, ShotCommand, TeamConfig, TeamSide};

use crate::{Credentials, RawEvent, Subscription, Transport, TransportConfig, TransportError};

const TEAM_CONFIG_PATH: &str = "store-team-config";
const SHOTS_PATH: &str = "shots";

type EventStream =
    Pin<Box<dyn Stream<Item = Result<Event, EventStreamError<reqwest::Error>>> + Send>>;

/// A [`Transport`] that talks to the match server over HTTP.
///
/// One `reqwest::Client` (and its connection pool) is shared by the state
/// stream and the one-shot calls, so a shot can be submitted while the
/// stream is open.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
    credentials: Credentials,
}

impl HttpTransport {
    /// Builds the HTTP client.
    ///
    /// # Errors
    /// Returns [`TransportError::Request`] if the TLS backend can't be
    /// initialised.
    pub fn new(config: TransportConfig, credentials: Credentials) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|source| TransportError::Request {
                endpoint: config.base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    /// The configuration this transport was built with.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    /// Sends a one-shot request and turns non-success statuses into errors.
    async fn send_checked(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<Response, TransportError> {
        let response = self
            .authed(request)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(endpoint, e))?;
        check_status(endpoint, response)
    }

    /// One attempt at opening the state stream.
    async fn open_stream(&self, endpoint: &str) -> Result<HttpSubscription, TransportError> {
        let request = self
            .authed(self.client.get(endpoint))
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"));

        // Only the headers are bounded here. A per-request timeout would
        // also cut the body, which is the stream itself.
        let response = tokio::time::timeout(self.config.request_timeout, request.send())
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("{endpoint}: no response headers"))
            })?
            .map_err(|e| TransportError::from_reqwest(endpoint, e))?;
        let response = check_status(endpoint, response)?;

        tracing::debug!(endpoint, "state stream opened");
        Ok(HttpSubscription {
            events: Box::pin(response.bytes_stream().eventsource()),
            read_timeout: self.config.read_timeout,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Transport for HttpTransport {
    type Subscription = HttpSubscription;

    async fn register_team(
        &self,
        match_id: MatchId,
        expected_side: TeamSide,
        team: &TeamConfig,
    ) -> Result<TeamSide, TransportError> {
        let endpoint = self.config.endpoint(TEAM_CONFIG_PATH);
        let request = self
            .client
            .post(&endpoint)
            .query(&[
                ("match_id", match_id.to_string().as_str()),
                ("expected_match_team_name", expected_side.as_str()),
            ])
            .json(team);

        let response = self.send_checked(&endpoint, request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&endpoint, e))?;
        let side: TeamSide = JsonCodec.decode(&body)?;
        tracing::debug!(endpoint, %side, "team registered");
        Ok(side)
    }

    async fn submit_shot(&self, match_id: MatchId, shot: &ShotCommand) -> Result<(), TransportError> {
        let endpoint = self.config.endpoint(SHOTS_PATH);
        let request = self
            .client
            .post(&endpoint)
            .query(&[("match_id", match_id.to_string())])
            .json(shot);

        self.send_checked(&endpoint, request).await?;
        tracing::debug!(endpoint, "shot accepted");
        Ok(())
    }

    async fn subscribe(&self, match_id: MatchId) -> Result<HttpSubscription, TransportError> {
        let endpoint = self.config.endpoint(&format!("matches/{match_id}/stream"));
        let mut retries = 0u32;

        loop {
            match self.open_stream(&endpoint).await {
                Ok(subscription) => return Ok(subscription),
                Err(e) if is_connect_failure(&e) && retries < self.config.max_connect_retries => {
                    retries += 1;
                    tracing::warn!(
                        endpoint,
                        attempt = retries,
                        max = self.config.max_connect_retries,
                        error = %e,
                        "could not open state stream, retrying"
                    );
                    tokio::time::sleep(self.config.reconnection_time).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Failures worth another attempt at the transport level: the server
/// wasn't reachable or answered with a 5xx. Credentials problems and
/// timeouts go straight to the caller.
fn is_connect_failure(err: &TransportError) -> bool {
    match err {
        TransportError::Request { source, .. } => source.is_connect(),
        TransportError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

fn check_status(endpoint: &str, response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(TransportError::Unauthorized {
            endpoint: endpoint.to_string(),
        });
    }
    if !status.is_success() {
        return Err(TransportError::UnexpectedStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// HttpSubscription
// ---------------------------------------------------------------------------

/// An open SSE response.
///
/// Owns the response body; dropping it closes the connection.
pub struct HttpSubscription {
    events: EventStream,
    read_timeout: Option<Duration>,
    endpoint: String,
}

impl std::fmt::Debug for HttpSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSubscription")
            .field("read_timeout", &self.read_timeout)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpSubscription {
    fn map_stream_error(&self, err: EventStreamError<reqwest::Error>) -> TransportError {
        match err {
            EventStreamError::Transport(e) => TransportError::from_reqwest(&self.endpoint, e),
            other => TransportError::Stream(format!("{}: {other}", self.endpoint)),
        }
    }
}

impl Subscription for HttpSubscription {
    async fn next_event(&mut self) -> Result<Option<RawEvent>, TransportError> {
        let next = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, self.events.next())
                .await
                .map_err(|_| {
                    TransportError::Timeout(format!(
                        "{}: no event for {}s",
                        self.endpoint,
                        limit.as_secs_f64()
                    ))
                })?,
            None => self.events.next().await,
        };

        match next {
            None => Ok(None),
            Some(Ok(event)) => Ok(Some(RawEvent {
                event_type: event.event,
                data: event.data,
                id: event.id,
            })),
            Some(Err(e)) => Err(self.map_stream_error(e)),
        }
    }
}
