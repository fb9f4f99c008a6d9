use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Live notification about recorded trace data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    TraceRecorded {
        prompt_id: i64,
        response_ids: Vec<i64>,
        scoring_job_id: Option<i64>,
        recorded_at: DateTime<Utc>,
    },
    CheckRecorded {
        response_id: i64,
        check_id: i64,
        groundedness_score: f64,
        checked_at: DateTime<Utc>,
    },
}

impl TraceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TraceRecorded { .. } => "trace_recorded",
            Self::CheckRecorded { .. } => "check_recorded",
        }
    }
}

/// Best-effort fan-out of trace events to live observers.
///
/// Publishing never blocks and never fails the caller. Subscribers that fall
/// more than the channel capacity behind lose the oldest events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TraceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: TraceEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(event = name, receivers, "Published trace event"),
            Err(_) => tracing::trace!(event = name, "No subscribers for trace event"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TraceEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_event(check_id: i64) -> TraceEvent {
        TraceEvent::CheckRecorded {
            response_id: 1,
            check_id,
            groundedness_score: 0.5,
            checked_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new(4);
        bus.publish(check_event(1));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(check_event(1));
        bus.publish(check_event(2));

        assert!(matches!(rx.recv().await.unwrap(), TraceEvent::CheckRecorded { check_id: 1, .. }));
        assert!(matches!(rx.recv().await.unwrap(), TraceEvent::CheckRecorded { check_id: 2, .. }));
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for id in 0..5 {
            bus.publish(check_event(id));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(check_event(3)).unwrap();
        assert_eq!(value["event"], "check_recorded");
        assert_eq!(value["check_id"], 3);
    }
}
