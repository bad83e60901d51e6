//! API Server Module
//!
//! HTTP ingress for the event bus. External collaborators deliver events by
//! POSTing the JSON payload to `/events/<channel>`; the body is checked
//! against the channel's schema and published on the in-process bus, where
//! the router picks it up.
//!
//! Only inbound channels are accepted. Outbound and internal channels are
//! produced by this service and can't be injected from outside.

use crate::{
    bus::{Channel, Direction, Event, EventBus},
    config::TransportConfig,
    error::BatchWriterError,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shared application state that is accessible across all request handlers
#[derive(Clone)]
pub struct AppState {
    bus: Arc<dyn EventBus>,
}

/// The ingress server
pub struct Server {
    config: TransportConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: TransportConfig, bus: Arc<dyn EventBus>) -> Self {
        Self {
            config,
            state: AppState { bus },
        }
    }

    /// Routes served by the ingress, without a listener attached.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/events/:channel", post(handle_event))
            .with_state(self.state.clone())
    }

    /// Binds to the configured host and port and serves until the listener fails.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Body returned for every event delivery.
#[derive(Debug, Serialize)]
struct EventResponse {
    channel: String,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl EventResponse {
    fn accepted(channel: &str) -> (StatusCode, Json<Self>) {
        (
            StatusCode::ACCEPTED,
            Json(Self {
                channel: channel.to_string(),
                accepted: true,
                error: None,
            }),
        )
    }

    fn rejected(status: StatusCode, channel: &str, error: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                channel: channel.to_string(),
                accepted: false,
                error: Some(error.into()),
            }),
        )
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handle_event(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<EventResponse>) {
    let Some(channel) = Channel::from_name(&name) else {
        warn!(channel = %name, "event for unknown channel");
        return EventResponse::rejected(StatusCode::NOT_FOUND, &name, "unknown channel");
    };

    if channel.direction() != Direction::Inbound {
        warn!(channel = %channel, "refused event for non-inbound channel");
        return EventResponse::rejected(
            StatusCode::FORBIDDEN,
            &name,
            "channel does not accept external events",
        );
    }

    let event = match Event::decode(channel, &body) {
        Ok(event) => event,
        Err(e) => {
            warn!(channel = %channel, error = %e, "malformed event");
            return EventResponse::rejected(StatusCode::BAD_REQUEST, &name, e.to_string());
        }
    };

    match state.bus.publish_event(&event).await {
        Ok(()) => {
            debug!(channel = %channel, "event accepted");
            EventResponse::accepted(&name)
        }
        Err(e) => {
            error!(channel = %channel, error = %e, "failed to publish event");
            let status = match e {
                BatchWriterError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            EventResponse::rejected(status, &name, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryBus;
    use crate::testing::FaultyBus;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn config() -> TransportConfig {
        TransportConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            forward_url: None,
        }
    }

    async fn post_event(server: &Server, channel: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = server
            .router()
            .oneshot(
                Request::post(format!("/events/{channel}"))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_claim_is_published_on_the_bus() {
        let bus = Arc::new(InMemoryBus::new());
        let mut claims = bus.subscribe(Channel::ClaimIdentifier).await.unwrap();
        let server = Server::new(config(), bus.clone());

        let (status, body) = post_event(&server, "claim-identifier", r#"{"identifier":"Qm111"}"#).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["accepted"], true);
        assert!(body.get("error").is_none());
        let delivery = claims.try_next().unwrap();
        assert_eq!(
            delivery.decode().unwrap(),
            Event::ClaimIdentifier(crate::types::ClaimIdentifier {
                identifier: "Qm111".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_empty_build_request_is_accepted() {
        let bus = Arc::new(InMemoryBus::new());
        let mut requests = bus.subscribe(Channel::CreateNextBatchRequest).await.unwrap();
        let server = Server::new(config(), bus.clone());

        let (status, _) = post_event(&server, "create-next-batch.request", "").await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(requests.try_next().is_some());
    }

    #[tokio::test]
    async fn test_unknown_channel_is_not_found() {
        let server = Server::new(config(), Arc::new(InMemoryBus::new()));

        let (status, body) = post_event(&server, "no-such-channel", "{}").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["accepted"], false);
    }

    #[tokio::test]
    async fn test_outbound_and_internal_channels_are_refused() {
        let bus = Arc::new(InMemoryBus::new());
        let mut successes = bus.subscribe(Channel::CompleteHashesSuccess).await.unwrap();
        let server = Server::new(config(), bus.clone());
        let batch = r#"{"identifiers":["Qm1"],"directoryReference":"QmDir"}"#;

        let (status, _) = post_event(&server, "complete-hashes.success", batch).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = post_event(&server, "complete-hashes.request", batch).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        assert!(successes.try_next().is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_bad_request() {
        let bus = Arc::new(InMemoryBus::new());
        let mut confirmations = bus.subscribe(Channel::AnchoringConfirmation).await.unwrap();
        let server = Server::new(config(), bus.clone());

        let (status, body) = post_event(&server, "anchoring.confirmation", r#"{"identifiers":["Qm1"]}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("anchoring.confirmation"));
        assert!(confirmations.try_next().is_none());
    }

    #[tokio::test]
    async fn test_bus_failure_is_a_server_error() {
        let bus = Arc::new(FaultyBus::new());
        bus.refuse(Channel::ClaimIdentifier);
        let server = Server::new(config(), bus.clone());

        let (status, _) = post_event(&server, "claim-identifier", r#"{"identifier":"Qm1"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health() {
        let server = Server::new(config(), Arc::new(InMemoryBus::new()));
        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
