//! Payloads carried on the hub's two channels.

use arcade_types::{CachedAction, CachedVote, GameState};
use serde::{Deserialize, Serialize};

/// Dimensions of the emulator's framebuffer, sent once on connect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenInfo {
    fn default() -> Self {
        Self {
            width: arcade_types::SCREEN_WIDTH,
            height: arcade_types::SCREEN_HEIGHT,
        }
    }
}

/// Text messages interleaved with binary frames on the frame channel (§6:
/// "one JSON text message {type:\"screenInfo\", width, height}; thereafter
/// {type:\"viewerCount\", count} interleaved with binary frames").
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FrameChannelMessage {
    ScreenInfo { width: u32, height: u32 },
    ViewerCount { count: usize },
}

/// The circular buffers' contents, replayed to a new event spectator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentHistory {
    pub votes: Vec<CachedVote>,
    pub actions: Vec<CachedAction>,
}

/// Hydration payload sent once to a new event-channel spectator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub screen_info: ScreenInfo,
    pub recent_history: RecentHistory,
    pub game_state: Option<GameState>,
}

/// Events broadcast on the event channel, tagged by `type` so clients can
/// dispatch on a single field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HubEvent {
    Hello(Hello),
    Vote { vote: CachedVote },
    WindowResult { result: CachedAction },
    GameState { state: GameState },
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::{Action, Address, TxHash};

    #[test]
    fn hub_event_tags_are_camel_case() {
        let event = HubEvent::Vote {
            vote: CachedVote {
                player: Address([1; 20]),
                action: Action::A,
                block: 1,
                tx_hash: TxHash([2; 32]),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"vote\""));
    }

    #[test]
    fn screen_info_defaults_match_framebuffer_size() {
        let info = ScreenInfo::default();
        assert_eq!(info.width, arcade_types::SCREEN_WIDTH);
        assert_eq!(info.height, arcade_types::SCREEN_HEIGHT);
    }

    #[test]
    fn frame_channel_messages_match_the_wire_shape() {
        let json = serde_json::to_string(&FrameChannelMessage::ScreenInfo {
            width: 160,
            height: 144,
        })
        .unwrap();
        assert!(json.contains("\"type\":\"screenInfo\""));
        assert!(json.contains("\"width\":160"));

        let json = serde_json::to_string(&FrameChannelMessage::ViewerCount { count: 3 }).unwrap();
        assert!(json.contains("\"type\":\"viewerCount\""));
        assert!(json.contains("\"count\":3"));
    }
}
