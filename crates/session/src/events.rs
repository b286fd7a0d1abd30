//! In-process session event bus backed by a `tokio::sync::broadcast`
//! channel, so an outer surface can observe lifecycle progress without
//! polling the book.

use serde::Serialize;
use tokio::sync::broadcast;

use callsheet_core::shot::{ShotStatus, VideoStatus};
use callsheet_core::types::ShotId;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// A lifecycle event emitted by the production session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A shot moved to a new lifecycle status.
    ShotStatusChanged { shot_id: ShotId, status: ShotStatus },
    /// A shot's video sub-status changed.
    VideoStatusChanged {
        shot_id: ShotId,
        status: VideoStatus,
    },
    /// A new shot (extension unit) entered the book.
    ShotAdded { shot_id: ShotId },
    /// A batch run halted early because a stop was requested.
    BatchHalted { completed: usize },
    /// Project state was pushed to the vault.
    SyncCompleted { slug: String, state_url: String },
}

/// Fan-out hub for [`SessionEvent`]s.
///
/// Subscribers each receive every event published after they subscribe;
/// with no subscribers, publishing is a no-op.
pub struct SessionEventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: SessionEvent) {
        // A send error only means there are zero receivers.
        let _ = self.sender.send(event);
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = SessionEventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(SessionEvent::ShotStatusChanged {
            shot_id: "s1_01".to_string(),
            status: ShotStatus::NeedsReview,
        });

        match rx.recv().await.unwrap() {
            SessionEvent::ShotStatusChanged { shot_id, status } => {
                assert_eq!(shot_id, "s1_01");
                assert_eq!(status, ShotStatus::NeedsReview);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_a_noop() {
        let bus = SessionEventBus::default();
        bus.publish(SessionEvent::BatchHalted { completed: 2 });
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = SessionEvent::SyncCompleted {
            slug: "pilot".to_string(),
            state_url: "https://vault.example/state.json".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "sync_completed");
        assert_eq!(json["slug"], "pilot");
    }
}
