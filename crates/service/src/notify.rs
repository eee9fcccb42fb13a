//! Fan-out of committed lifecycle changes.

use tokio::sync::broadcast;
use tracing::trace;

use crate::lifecycle::LifecycleEvent;

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Never fails: having no subscribers is normal.
    pub fn publish(&self, event: LifecycleEvent) {
        match self.tx.send(event) {
            Ok(n) => trace!(receivers = n, "lifecycle event published"),
            Err(_) => trace!("lifecycle event dropped, no subscribers"),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self { Self::new(256) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use models::service_request::RequestStatus;
    use uuid::Uuid;

    fn event() -> LifecycleEvent {
        LifecycleEvent {
            request_id: Uuid::new_v4(),
            from: Some(RequestStatus::Requested),
            to: RequestStatus::Assigned,
            customer_id: Uuid::new_v4(),
            professionals: vec![Uuid::new_v4()],
            at: Utc::now(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        Notifier::default().publish(event());
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let n = Notifier::new(4);
        let mut rx = n.subscribe();
        let ev = event();
        n.publish(ev.clone());
        assert_eq!(rx.recv().await.unwrap(), ev);
    }
}
