//! Best-effort task status fan-out.
//!
//! A lifetime-scoped subscription registry mapping tasks to subscriber
//! identities, with one delivery channel per connected subscriber.
//! Delivery is at-most-once and fire-and-forget; this is not the system
//! of record, clients can always poll status instead.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::models::TaskStatusResponse;

/// Identity of a connected subscriber (one per client connection).
pub type SubscriberId = String;

#[derive(Default)]
struct FanoutState {
    /// task id -> subscriber identities interested in it.
    subscriptions: HashMap<Uuid, HashSet<SubscriberId>>,
    /// subscriber identity -> live delivery channel.
    connections: HashMap<SubscriberId, mpsc::UnboundedSender<TaskStatusResponse>>,
}

/// Subscription registry with concurrency-safe mutation.
#[derive(Default)]
pub struct StatusFanout {
    state: RwLock<FanoutState>,
}

impl StatusFanout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber connection and hand back its delivery channel.
    pub async fn connect(&self, subscriber: &str) -> mpsc::UnboundedReceiver<TaskStatusResponse> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.write().await;
        state.connections.insert(subscriber.to_string(), tx);
        tracing::debug!(subscriber, "Client connected");
        rx
    }

    /// Drop a subscriber: remove it from every task's subscriber set and
    /// prune now-empty sets.
    pub async fn disconnect(&self, subscriber: &str) {
        let mut state = self.state.write().await;
        state.connections.remove(subscriber);
        state.subscriptions.retain(|task_id, subscribers| {
            subscribers.remove(subscriber);
            if subscribers.is_empty() {
                tracing::debug!(task_id = %task_id, "Removed empty subscription");
                false
            } else {
                true
            }
        });
        tracing::debug!(subscriber, "Client disconnected");
    }

    /// Subscribe an identity to a task's status updates. Idempotent.
    pub async fn subscribe(&self, task_id: Uuid, subscriber: &str) {
        let mut state = self.state.write().await;
        state
            .subscriptions
            .entry(task_id)
            .or_default()
            .insert(subscriber.to_string());
        tracing::debug!(subscriber, task_id = %task_id, "Subscribed to task");
    }

    /// Remove a subscription. Idempotent; removing the last subscriber
    /// drops the task's mapping entirely.
    pub async fn unsubscribe(&self, task_id: Uuid, subscriber: &str) {
        let mut state = self.state.write().await;
        if let Some(subscribers) = state.subscriptions.get_mut(&task_id) {
            subscribers.remove(subscriber);
            if subscribers.is_empty() {
                state.subscriptions.remove(&task_id);
                tracing::debug!(task_id = %task_id, "Removed empty subscription");
            }
        }
        tracing::debug!(subscriber, task_id = %task_id, "Unsubscribed from task");
    }

    /// Deliver a status snapshot to every subscriber of the task.
    ///
    /// A no-op without subscribers. Send failures (disconnected receivers)
    /// are logged and ignored.
    pub async fn notify(&self, update: TaskStatusResponse) {
        let state = self.state.read().await;
        let Some(subscribers) = state.subscriptions.get(&update.id) else {
            return;
        };
        if subscribers.is_empty() {
            return;
        }
        tracing::debug!(
            task_id = %update.id,
            subscribers = subscribers.len(),
            status = %update.status,
            "Notifying subscribers of task status update"
        );
        for subscriber in subscribers {
            if let Some(tx) = state.connections.get(subscriber) {
                if tx.send(update.clone()).is_err() {
                    tracing::debug!(subscriber, "Dropped update for closed connection");
                }
            }
        }
    }

    /// Number of identities subscribed to a task.
    pub async fn subscriber_count(&self, task_id: Uuid) -> usize {
        self.state
            .read()
            .await
            .subscriptions
            .get(&task_id)
            .map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn update(task_id: Uuid, status: TaskStatus) -> TaskStatusResponse {
        TaskStatusResponse {
            id: task_id,
            status,
            error_report: vec![],
        }
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let fanout = StatusFanout::new();
        let task_id = Uuid::new_v4();
        fanout.subscribe(task_id, "client-1").await;
        fanout.subscribe(task_id, "client-1").await;
        assert_eq!(fanout.subscriber_count(task_id).await, 1);
    }

    #[tokio::test]
    async fn test_last_unsubscribe_prunes_mapping() {
        let fanout = StatusFanout::new();
        let task_id = Uuid::new_v4();
        fanout.subscribe(task_id, "client-1").await;
        fanout.subscribe(task_id, "client-2").await;

        fanout.unsubscribe(task_id, "client-1").await;
        assert_eq!(fanout.subscriber_count(task_id).await, 1);
        fanout.unsubscribe(task_id, "client-2").await;
        assert_eq!(fanout.subscriber_count(task_id).await, 0);

        // Unsubscribing again is a harmless no-op.
        fanout.unsubscribe(task_id, "client-2").await;
    }

    #[tokio::test]
    async fn test_disconnect_prunes_all_subscriptions() {
        let fanout = StatusFanout::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let _rx = fanout.connect("client-1").await;
        fanout.subscribe(a, "client-1").await;
        fanout.subscribe(b, "client-1").await;
        fanout.subscribe(b, "client-2").await;

        fanout.disconnect("client-1").await;
        assert_eq!(fanout.subscriber_count(a).await, 0);
        assert_eq!(fanout.subscriber_count(b).await, 1);
    }

    #[tokio::test]
    async fn test_notify_delivers_to_subscribers() {
        let fanout = StatusFanout::new();
        let task_id = Uuid::new_v4();
        let mut rx = fanout.connect("client-1").await;
        fanout.subscribe(task_id, "client-1").await;

        fanout.notify(update(task_id, TaskStatus::InProgress)).await;
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, task_id);
        assert_eq!(received.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_is_noop() {
        let fanout = StatusFanout::new();
        let mut rx = fanout.connect("client-1").await;

        // client-1 is connected but not subscribed to this task.
        fanout
            .notify(update(Uuid::new_v4(), TaskStatus::Completed))
            .await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notify_survives_closed_receiver() {
        let fanout = StatusFanout::new();
        let task_id = Uuid::new_v4();
        let rx = fanout.connect("client-1").await;
        fanout.subscribe(task_id, "client-1").await;
        drop(rx);

        // Must not panic or error.
        fanout.notify(update(task_id, TaskStatus::Failed)).await;
    }
}
