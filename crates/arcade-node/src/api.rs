//! # Core HTTP API
//!
//! The node's public surface: the binary frame channel, the structured
//! event channel, the relay endpoints, health checks, and metrics.
//!
//! ## Endpoint Overview
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Overall health status |
//! | GET | `/health/live` | Liveness probe |
//! | GET | `/health/ready` | Readiness probe |
//! | GET | `/health/startup` | Startup probe |
//! | GET | `/metrics` | Prometheus metrics |
//! | GET | `/stream` | Binary frame channel (spectator WebSocket) |
//! | GET | `/ws` | Structured event channel (spectator WebSocket) |
//! | * | `/relay/*` | Relay endpoints, see [`arcade_relay::relay_routes`] |
//!
//! ## Application State
//!
//! All handlers share a [`NodeState`] containing:
//!
//! - `hub`: the fan-out hub serving spectators (frames + events)
//! - `relay`: optional relay state (present only when the relay is enabled)
//!
//! ## Error Handling
//!
//! Relay errors are handled by [`arcade_relay::RelayError`]'s own
//! `IntoResponse` impl. Everything else on this router is infallible by
//! construction (WebSocket upgrades, health, metrics).

use arcade_realtime::{FanoutHub, FrameMessage};
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::health::{health_routes, HealthState};
use crate::observability::middleware::{
    metrics_handler, metrics_middleware, request_id_middleware,
};

/// Budget for a single spectator write (§5: writes slower than this get the
/// connection closed rather than letting the channel pile up unbounded).
const SPECTATOR_SEND_TIMEOUT: Duration = Duration::from_millis(250);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct NodeState {
    /// Fan-out hub serving spectator frame and event channels.
    pub hub: Arc<FanoutHub>,
}

impl NodeState {
    /// Create a new node state around a fan-out hub.
    pub fn new(hub: Arc<FanoutHub>) -> Self {
        Self { hub }
    }
}

/// Creates the node's HTTP/WebSocket router. `relay_router`, built from
/// [`arcade_relay::relay_routes`] with its own state already bound via
/// `.with_state`, is merged in only when the relay is enabled.
pub fn create_router(
    state: NodeState,
    health_state: HealthState,
    relay_router: Option<Router>,
) -> Router {
    let mut router = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/stream", get(frame_channel))
        .route("/ws", get(event_channel))
        .with_state(state)
        .merge(health_routes(health_state));

    if let Some(relay_router) = relay_router {
        router = router.merge(relay_router);
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Upgrade to the binary frame channel (§4.5, `/stream`).
async fn frame_channel(
    State(state): State<NodeState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_frame_socket(socket, state.hub))
}

async fn handle_frame_socket(mut socket: WebSocket, hub: Arc<FanoutHub>) {
    let (client, mut receiver) = match hub.connect_frame_spectator() {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "frame spectator rejected");
            return;
        }
    };

    loop {
        tokio::select! {
            outgoing = receiver.recv() => {
                let Some(message) = outgoing else { break };
                let axum_message = match message {
                    FrameMessage::Header(json) | FrameMessage::ViewerCount(json) => Message::Text(json.into()),
                    FrameMessage::Frame(bytes) => Message::Binary(bytes),
                };
                match tokio::time::timeout(SPECTATOR_SEND_TIMEOUT, socket.send(axum_message)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => break,
                    Err(_) => {
                        tracing::warn!(client = %client.id, "frame spectator send timed out, closing");
                        break;
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Spectators don't send anything meaningful on this channel.
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    hub.disconnect_frame_spectator(&client.id);
}

/// Upgrade to the structured event channel (§4.5, `/ws`).
async fn event_channel(
    State(state): State<NodeState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_event_socket(socket, state.hub))
}

async fn handle_event_socket(mut socket: WebSocket, hub: Arc<FanoutHub>) {
    let (client, mut receiver) = match hub.connect_event_spectator() {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "event spectator rejected");
            return;
        }
    };

    loop {
        tokio::select! {
            outgoing = receiver.recv() => {
                let Some(json) = outgoing else { break };
                match tokio::time::timeout(SPECTATOR_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => break,
                    Err(_) => {
                        tracing::warn!(client = %client.id, "event spectator send timed out, closing");
                        break;
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    hub.disconnect_event_spectator(&client.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        let hub = Arc::new(FanoutHub::new(arcade_realtime::ScreenInfo::default()));
        create_router(NodeState::new(hub), HealthState::new(), None)
    }

    #[tokio::test]
    async fn health_live_returns_ok() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_ok() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn relay_routes_are_absent_when_not_mounted() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/relay/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
