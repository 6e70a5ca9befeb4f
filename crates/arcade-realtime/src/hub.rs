//! Fan-out hub: binds the frame channel, the event channel, and the
//! circular-buffer history that hydrates newly-connected spectators (§4.5).

use crate::client::{
    create_event_client, create_frame_client, ClientId, EventClient, EventReceiver, FrameClient,
    FrameMessage, FrameReceiver,
};
use crate::error::{RealtimeError, Result};
use crate::event::{FrameChannelMessage, Hello, HubEvent, RecentHistory, ScreenInfo};
use arcade_types::{
    CachedAction, CachedVote, CircularBuffer, GameState, Vote, WindowResult, MAX_CACHED_ACTIONS,
    MAX_CACHED_VOTES,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Hard cap on concurrent spectator connections, across both channels.
const MAX_CONNECTIONS: usize = 10_000;

/// Hub statistics.
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    /// Currently connected frame-channel spectators.
    pub frame_clients: usize,
    /// Currently connected event-channel spectators.
    pub event_clients: usize,
    /// Total spectator connections accepted since start, across both channels.
    pub total_connections: u64,
    /// Total events broadcast on the event channel since start.
    pub total_events: u64,
}

/// Owns every spectator connection, plus the bounded history the event
/// channel replays to new connections.
pub struct FanoutHub {
    screen_info: ScreenInfo,
    frame_clients: RwLock<HashMap<ClientId, Arc<FrameClient>>>,
    event_clients: RwLock<HashMap<ClientId, Arc<EventClient>>>,
    recent_votes: RwLock<CircularBuffer<CachedVote>>,
    recent_actions: RwLock<CircularBuffer<CachedAction>>,
    latest_game_state: RwLock<Option<GameState>>,
    stats: RwLock<HubStats>,
}

impl FanoutHub {
    /// Create an empty hub for a given framebuffer size.
    pub fn new(screen_info: ScreenInfo) -> Self {
        Self {
            screen_info,
            frame_clients: RwLock::new(HashMap::new()),
            event_clients: RwLock::new(HashMap::new()),
            recent_votes: RwLock::new(CircularBuffer::new(MAX_CACHED_VOTES)),
            recent_actions: RwLock::new(CircularBuffer::new(MAX_CACHED_ACTIONS)),
            latest_game_state: RwLock::new(None),
            stats: RwLock::new(HubStats::default()),
        }
    }

    fn total_connections(&self) -> usize {
        self.frame_clients.read().len() + self.event_clients.read().len()
    }

    /// Accept a new frame-channel spectator: send it the header, register
    /// it, then broadcast the updated viewer count to everyone on the
    /// frame channel.
    pub fn connect_frame_spectator(&self) -> Result<(Arc<FrameClient>, FrameReceiver)> {
        if self.total_connections() >= MAX_CONNECTIONS {
            return Err(RealtimeError::ConnectionLimitReached);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let (client, receiver) = create_frame_client(id.clone());
        self.frame_clients.write().insert(id.clone(), client.clone());

        let header = FrameChannelMessage::ScreenInfo {
            width: self.screen_info.width,
            height: self.screen_info.height,
        };
        client.send(FrameMessage::Header(serde_json::to_string(&header)?))?;

        self.stats.write().total_connections += 1;
        info!(client_id = %id, "frame spectator connected");
        self.broadcast_viewer_count();

        Ok((client, receiver))
    }

    /// Remove a frame-channel spectator and broadcast the updated viewer count.
    pub fn disconnect_frame_spectator(&self, client_id: &str) {
        if self.frame_clients.write().remove(client_id).is_some() {
            info!(client_id = %client_id, "frame spectator disconnected");
            self.broadcast_viewer_count();
        }
    }

    fn broadcast_viewer_count(&self) {
        let count = self.frame_clients.read().len();
        let payload = match serde_json::to_string(&FrameChannelMessage::ViewerCount { count }) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode viewer count");
                return;
            }
        };
        for client in self.frame_clients.read().values() {
            let _ = client.send(FrameMessage::ViewerCount(payload.clone()));
        }
    }

    /// Push a compressed frame to every connected frame spectator.
    pub fn push_frame(&self, jpeg: bytes::Bytes) {
        for client in self.frame_clients.read().values() {
            let _ = client.send(FrameMessage::Frame(jpeg.clone()));
        }
    }

    /// Accept a new event-channel spectator: hydrate it with screen info,
    /// recent history, and the current game state, then register it for
    /// future broadcasts.
    pub fn connect_event_spectator(&self) -> Result<(Arc<EventClient>, EventReceiver)> {
        if self.total_connections() >= MAX_CONNECTIONS {
            return Err(RealtimeError::ConnectionLimitReached);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let (client, receiver) = create_event_client(id.clone());

        let hello = HubEvent::Hello(Hello {
            screen_info: self.screen_info,
            recent_history: RecentHistory {
                votes: self.recent_votes.read().iter().cloned().collect(),
                actions: self.recent_actions.read().iter().cloned().collect(),
            },
            game_state: self.latest_game_state.read().clone(),
        });
        client.send(serde_json::to_string(&hello)?)?;

        self.event_clients.write().insert(id.clone(), client.clone());
        self.stats.write().total_connections += 1;
        info!(client_id = %id, "event spectator connected");

        Ok((client, receiver))
    }

    /// Remove an event-channel spectator.
    pub fn disconnect_event_spectator(&self, client_id: &str) {
        if self.event_clients.write().remove(client_id).is_some() {
            info!(client_id = %client_id, "event spectator disconnected");
        }
    }

    /// Record a vote in the recent-votes buffer and broadcast it.
    pub fn push_vote(&self, vote: &Vote) {
        let cached = CachedVote::from(vote);
        self.recent_votes.write().push(cached);
        self.broadcast_event(HubEvent::Vote { vote: cached });
    }

    /// Record a finalized window result in the recent-actions buffer and broadcast it.
    pub fn push_window_result(&self, result: &WindowResult) {
        let cached = CachedAction::from(result);
        self.recent_actions.write().push(cached.clone());
        self.broadcast_event(HubEvent::WindowResult { result: cached });
    }

    /// Update the cached game state and broadcast it.
    pub fn push_game_state(&self, state: GameState) {
        *self.latest_game_state.write() = Some(state.clone());
        self.broadcast_event(HubEvent::GameState { state });
    }

    fn broadcast_event(&self, event: HubEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode hub event");
                return;
            }
        };
        let mut delivered = 0;
        for client in self.event_clients.read().values() {
            if client.send(payload.clone()).is_ok() {
                delivered += 1;
            }
        }
        self.stats.write().total_events += 1;
        debug!(delivered, "hub event broadcast");
    }

    /// Current hub statistics.
    pub fn stats(&self) -> HubStats {
        let mut stats = self.stats.read().clone();
        stats.frame_clients = self.frame_clients.read().len();
        stats.event_clients = self.event_clients.read().len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::{Action, Address, TxHash};

    fn sample_vote() -> Vote {
        Vote {
            player: Address([1; 20]),
            action: Action::A,
            block: 10,
            tx_hash: TxHash([2; 32]),
            log_index: 0,
            observed_at_ms: 0,
        }
    }

    #[test]
    fn frame_spectator_receives_header_then_viewer_count_update() {
        let hub = FanoutHub::new(ScreenInfo::default());
        let (_client, mut rx) = hub.connect_frame_spectator().unwrap();

        match rx.try_recv().unwrap() {
            FrameMessage::Header(json) => assert!(json.contains("\"type\":\"screenInfo\"")),
            other => panic!("expected header, got {other:?}"),
        }

        // Second spectator connecting should push a viewer-count update to
        // the first one too.
        let (_client2, _rx2) = hub.connect_frame_spectator().unwrap();
        match rx.try_recv().unwrap() {
            FrameMessage::ViewerCount(json) => {
                assert!(json.contains("\"type\":\"viewerCount\""));
                assert!(json.contains("\"count\":2"));
            }
            other => panic!("expected viewer count, got {other:?}"),
        }
    }

    #[test]
    fn frame_disconnect_broadcasts_updated_viewer_count() {
        let hub = FanoutHub::new(ScreenInfo::default());
        let (client1, mut rx1) = hub.connect_frame_spectator().unwrap();
        let (_client2, _rx2) = hub.connect_frame_spectator().unwrap();
        let _ = rx1.try_recv(); // header
        let _ = rx1.try_recv(); // viewer count from client2 connecting

        hub.disconnect_frame_spectator(&client1.id);
        assert_eq!(hub.stats().frame_clients, 1);
    }

    #[test]
    fn event_spectator_is_hydrated_with_recent_history() {
        let hub = FanoutHub::new(ScreenInfo::default());
        hub.push_vote(&sample_vote());

        let (_client, mut rx) = hub.connect_event_spectator().unwrap();
        let hello_json = rx.try_recv().unwrap();
        assert!(hello_json.contains("\"type\":\"hello\""));
        assert!(hello_json.contains("recentHistory"));
    }

    #[test]
    fn push_vote_broadcasts_to_event_spectators() {
        let hub = FanoutHub::new(ScreenInfo::default());
        let (_client, mut rx) = hub.connect_event_spectator().unwrap();
        let _ = rx.try_recv(); // hello

        hub.push_vote(&sample_vote());
        let payload = rx.try_recv().unwrap();
        assert!(payload.contains("\"type\":\"vote\""));
        assert_eq!(hub.stats().total_events, 1);
    }

    #[test]
    fn recent_votes_buffer_caps_at_max_cached_votes() {
        let hub = FanoutHub::new(ScreenInfo::default());
        for i in 0..(MAX_CACHED_VOTES + 10) {
            let mut vote = sample_vote();
            vote.block = i as u64;
            hub.push_vote(&vote);
        }
        assert_eq!(hub.recent_votes.read().len(), MAX_CACHED_VOTES);
    }

    #[test]
    fn push_frame_delivers_binary_to_frame_spectators_only() {
        let hub = FanoutHub::new(ScreenInfo::default());
        let (_fclient, mut frames) = hub.connect_frame_spectator().unwrap();
        let _ = frames.try_recv(); // header

        hub.push_frame(bytes::Bytes::from_static(b"jpegbytes"));
        match frames.try_recv().unwrap() {
            FrameMessage::Frame(bytes) => assert_eq!(&bytes[..], b"jpegbytes"),
            other => panic!("expected frame, got {other:?}"),
        }
    }
}
