//! # Arcade Realtime
//!
//! The fan-out hub that serves spectators of the collaborative game: a
//! binary frame channel streaming compressed frames, and a structured
//! event channel broadcasting votes, window results, and game state.
//!
//! ## Channels
//!
//! - **Frame channel**: on connect, sends a JSON header (`screenInfo`,
//!   `viewerCount`), then binary JPEG frames as they're compressed. Viewer
//!   count updates are sent to everyone on every connect/disconnect.
//! - **Event channel**: on connect, sends a `hello` hydration payload
//!   (`screenInfo`, `recentHistory`, `gameState`), then broadcasts `vote`,
//!   `windowResult`, and `gameState` events as they occur.
//!
//! Per connection, messages are delivered in emission order. Across
//! connections, delivery is best-effort with no global serialization.

pub mod client;
pub mod error;
pub mod event;
pub mod hub;

pub use client::{
    ClientId, EventClient, EventReceiver, FrameClient, FrameMessage, FrameReceiver,
};
pub use error::{RealtimeError, Result};
pub use event::{FrameChannelMessage, Hello, HubEvent, RecentHistory, ScreenInfo};
pub use hub::{FanoutHub, HubStats};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_is_accessible() {
        let hub = FanoutHub::new(ScreenInfo::default());
        assert_eq!(hub.stats().frame_clients, 0);
        assert_eq!(hub.stats().event_clients, 0);
    }

    #[tokio::test]
    async fn full_frame_and_event_flow() {
        let hub = FanoutHub::new(ScreenInfo::default());

        let (_frame_client, mut frames) = hub.connect_frame_spectator().unwrap();
        let (_event_client, mut events) = hub.connect_event_spectator().unwrap();

        assert!(matches!(frames.try_recv().unwrap(), FrameMessage::Header(_)));
        assert!(events.try_recv().unwrap().contains("\"type\":\"hello\""));

        hub.push_frame(bytes::Bytes::from_static(b"frame-bytes"));
        assert!(matches!(frames.try_recv().unwrap(), FrameMessage::Frame(_)));

        let stats = hub.stats();
        assert_eq!(stats.frame_clients, 1);
        assert_eq!(stats.event_clients, 1);
    }
}
