//! Spectator connection handles for the hub's two wire surfaces: the
//! binary frame channel and the structured event channel.

use crate::error::{RealtimeError, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Unique identifier for a connected spectator.
pub type ClientId = String;

/// A message sent down the frame channel. The JSON variants are sent as
/// text frames, `Frame` as a binary frame, in emission order (§4.5
/// ordering guarantee).
#[derive(Debug, Clone)]
pub enum FrameMessage {
    /// One-time header sent right after connecting.
    Header(String),
    /// Updated viewer count, sent on every connect/disconnect.
    ViewerCount(String),
    /// A compressed frame.
    Frame(bytes::Bytes),
}

/// Receiving half of a frame spectator's channel.
pub type FrameReceiver = mpsc::UnboundedReceiver<FrameMessage>;

/// Receiving half of an event spectator's channel.
pub type EventReceiver = mpsc::UnboundedReceiver<String>;

/// A connected frame-channel spectator.
#[derive(Debug)]
pub struct FrameClient {
    pub id: ClientId,
    sender: mpsc::UnboundedSender<FrameMessage>,
}

impl FrameClient {
    /// Enqueue a message for this spectator.
    pub fn send(&self, message: FrameMessage) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| RealtimeError::ChannelClosed)
    }
}

/// A connected event-channel spectator.
#[derive(Debug)]
pub struct EventClient {
    pub id: ClientId,
    sender: mpsc::UnboundedSender<String>,
}

impl EventClient {
    /// Enqueue a JSON message for this spectator.
    pub fn send(&self, message: String) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| RealtimeError::ChannelClosed)
    }
}

/// Create a frame-channel spectator with its message receiver.
pub fn create_frame_client(id: ClientId) -> (Arc<FrameClient>, FrameReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Arc::new(FrameClient { id, sender }), receiver)
}

/// Create an event-channel spectator with its message receiver.
pub fn create_event_client(id: ClientId) -> (Arc<EventClient>, EventReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Arc::new(EventClient { id, sender }), receiver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_client_delivers_messages_in_emission_order() {
        let (client, mut rx) = create_frame_client("f1".to_string());
        client.send(FrameMessage::Header("{}".to_string())).unwrap();
        client
            .send(FrameMessage::Frame(bytes::Bytes::from_static(b"jpeg")))
            .unwrap();

        assert!(matches!(rx.try_recv().unwrap(), FrameMessage::Header(_)));
        assert!(matches!(rx.try_recv().unwrap(), FrameMessage::Frame(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn event_client_send() {
        let (client, mut rx) = create_event_client("e1".to_string());
        client.send("hello".to_string()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "hello");
    }

    #[test]
    fn send_after_receiver_drop_reports_channel_closed() {
        let (client, rx) = create_event_client("e1".to_string());
        drop(rx);
        assert!(matches!(
            client.send("hello".to_string()),
            Err(RealtimeError::ChannelClosed)
        ));
    }
}
