//! Subscriber Registry
//!
//! Keeps the set of live dashboard connections and fans payloads out to them.
//!
//! All membership changes go through one `RwLock`. Fan-out copies the member
//! list under the lock, releases it, performs the sends, and then removes the
//! subscribers whose send failed under a second short lock. A slow network
//! write therefore never blocks new connections from registering.

use futures_util::future::join_all;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::subscriber::{SubscriberError, SubscriberHandle};

/// Registry key: address of the subscriber allocation
type MemberKey = usize;

fn member_key(subscriber: &SubscriberHandle) -> MemberKey {
    Arc::as_ptr(subscriber) as *const () as usize
}

/// Thread-safe set of active subscribers
pub struct SubscriberRegistry {
    members: RwLock<HashMap<MemberKey, SubscriberHandle>>,
}

/// Outcome of one [`SubscriberRegistry::for_each`] pass
pub struct FanOut {
    /// Subscribers the callback ran for
    pub visited: usize,
    /// Subscribers whose callback failed, now removed from the registry
    pub removed: Vec<SubscriberHandle>,
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

impl SubscriberRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Register a subscriber
    ///
    /// Returns `false` if this exact handle was already registered.
    pub async fn add(&self, subscriber: SubscriberHandle) -> bool {
        let id = subscriber.id().to_string();

        let inserted = match self.members.write().await.entry(member_key(&subscriber)) {
            Entry::Vacant(slot) => {
                slot.insert(subscriber);
                true
            }
            Entry::Occupied(_) => false,
        };

        if inserted {
            tracing::debug!(connection_id = %id, "Subscriber registered");
        }
        inserted
    }

    /// Unregister a subscriber
    ///
    /// Returns `false` if it was not registered.
    pub async fn remove(&self, subscriber: &SubscriberHandle) -> bool {
        let removed = self
            .members
            .write()
            .await
            .remove(&member_key(subscriber))
            .is_some();

        if removed {
            tracing::debug!(connection_id = %subscriber.id(), "Subscriber unregistered");
        }
        removed
    }

    /// Check whether a handle is registered
    pub async fn contains(&self, subscriber: &SubscriberHandle) -> bool {
        self.members
            .read()
            .await
            .contains_key(&member_key(subscriber))
    }

    /// Get the current subscriber count
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Check if no subscriber is registered
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Run `f` once for every registered subscriber
    ///
    /// Callbacks run concurrently over a copy of the membership. Every
    /// subscriber whose callback returns `Err` is removed afterwards and
    /// handed back in [`FanOut::removed`]; closing it is up to the caller.
    pub async fn for_each<F, Fut>(&self, f: F) -> FanOut
    where
        F: Fn(SubscriberHandle) -> Fut,
        Fut: Future<Output = Result<(), SubscriberError>>,
    {
        let members: Vec<SubscriberHandle> = self.members.read().await.values().cloned().collect();
        let visited = members.len();

        let results = join_all(members.iter().map(|m| f(Arc::clone(m)))).await;

        let removed: Vec<SubscriberHandle> = members
            .into_iter()
            .zip(results)
            .filter_map(|(member, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    tracing::debug!(
                        connection_id = %member.id(),
                        error = %e,
                        "Send failed, dropping subscriber"
                    );
                    Some(member)
                }
            })
            .collect();

        if !removed.is_empty() {
            let mut members = self.members.write().await;
            for dead in &removed {
                members.remove(&member_key(dead));
            }
        }

        FanOut { visited, removed }
    }

    /// Send the same payload to every subscriber
    ///
    /// Each send is bounded by `send_timeout`; a timeout counts as a failure.
    /// Failed subscribers are removed and closed.
    pub async fn broadcast(&self, payload: Arc<str>, send_timeout: Duration) -> BroadcastReport {
        let fan_out = self
            .for_each(|subscriber| {
                let payload = Arc::clone(&payload);
                async move {
                    match tokio::time::timeout(send_timeout, subscriber.send(payload)).await {
                        Ok(result) => result,
                        Err(_) => Err(SubscriberError::Timeout(send_timeout)),
                    }
                }
            })
            .await;

        // A peer that stopped reading can stall its close handshake too
        join_all(fan_out.removed.iter().map(|dead| async move {
            if tokio::time::timeout(send_timeout, dead.close()).await.is_err() {
                tracing::debug!(connection_id = %dead.id(), "Close timed out, abandoning");
            }
        }))
        .await;

        let report = BroadcastReport {
            delivered: fan_out.visited - fan_out.removed.len(),
            dropped: fan_out.removed.len(),
        };

        if report.dropped > 0 {
            tracing::info!(
                delivered = report.delivered,
                dropped = report.dropped,
                "Dropped dead subscribers during broadcast"
            );
        }

        report
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::subscriber::testing::RecordingSubscriber;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_add_remove() {
        let registry = SubscriberRegistry::new();
        let sub = RecordingSubscriber::new("a").handle();

        assert!(registry.add(Arc::clone(&sub)).await);
        assert_eq!(registry.len().await, 1);
        assert!(registry.contains(&sub).await);

        assert!(registry.remove(&sub).await);
        assert!(registry.is_empty().await);
        assert!(!registry.remove(&sub).await);
    }

    #[tokio::test]
    async fn test_removed_subscriber_not_visited() {
        let registry = SubscriberRegistry::new();
        let sub = RecordingSubscriber::new("a");

        registry.add(sub.handle()).await;
        registry.remove(&sub.handle()).await;

        let fan_out = registry.for_each(|_| async { Ok(()) }).await;
        assert_eq!(fan_out.visited, 0);

        registry.broadcast(Arc::from("hello"), TIMEOUT).await;
        assert!(sub.received().is_empty());
    }

    #[tokio::test]
    async fn test_double_add_visits_once() {
        let registry = SubscriberRegistry::new();
        let sub = RecordingSubscriber::new("a");

        assert!(registry.add(sub.handle()).await);
        assert!(!registry.add(sub.handle()).await);
        assert_eq!(registry.len().await, 1);

        let report = registry.broadcast(Arc::from("tick"), TIMEOUT).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(sub.received(), vec!["tick".to_string()]);
    }

    #[tokio::test]
    async fn test_distinct_handles_with_same_id_are_distinct() {
        let registry = SubscriberRegistry::new();
        registry.add(RecordingSubscriber::new("same").handle()).await;
        registry.add(RecordingSubscriber::new("same").handle()).await;
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_failed_subscriber_isolated_and_removed() {
        let registry = SubscriberRegistry::new();
        let healthy: Vec<_> = (0..4)
            .map(|i| RecordingSubscriber::new(&format!("ok-{}", i)))
            .collect();
        let broken = RecordingSubscriber::failing("broken");

        for sub in &healthy {
            registry.add(sub.handle()).await;
        }
        registry.add(broken.handle()).await;

        let report = registry.broadcast(Arc::from("payload"), TIMEOUT).await;

        assert_eq!(report, BroadcastReport { delivered: 4, dropped: 1 });
        for sub in &healthy {
            assert_eq!(sub.received(), vec!["payload".to_string()]);
        }
        assert!(!registry.contains(&broken.handle()).await);
        assert!(broken.is_closed());
        assert_eq!(registry.len().await, 4);
    }

    #[tokio::test]
    async fn test_slow_subscriber_times_out_without_delaying_others() {
        let registry = SubscriberRegistry::new();
        let fast = RecordingSubscriber::new("fast");
        let slow = RecordingSubscriber::slow("slow", Duration::from_secs(30));

        registry.add(fast.handle()).await;
        registry.add(slow.handle()).await;

        let started = std::time::Instant::now();
        let report = registry
            .broadcast(Arc::from("payload"), Duration::from_millis(50))
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
        assert_eq!(fast.received().len(), 1);
        assert!(!registry.contains(&slow.handle()).await);
    }

    #[tokio::test]
    async fn test_for_each_reports_failures_without_closing() {
        let registry = SubscriberRegistry::new();
        let a = RecordingSubscriber::new("a");
        let b = RecordingSubscriber::new("b");
        registry.add(a.handle()).await;
        registry.add(b.handle()).await;

        let calls = AtomicUsize::new(0);
        let fan_out = registry
            .for_each(|sub| {
                calls.fetch_add(1, Ordering::SeqCst);
                let fail = sub.id() == "b";
                async move {
                    if fail {
                        Err(SubscriberError::Transport("reset".to_string()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fan_out.visited, 2);
        assert_eq!(fan_out.removed.len(), 1);
        assert_eq!(fan_out.removed[0].id(), "b");
        assert!(!b.is_closed());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_registration_during_slow_broadcast() {
        let registry = Arc::new(SubscriberRegistry::new());
        let slow = RecordingSubscriber::slow("slow", Duration::from_millis(200));
        registry.add(slow.handle()).await;

        let bg = Arc::clone(&registry);
        let broadcast = tokio::spawn(async move {
            bg.broadcast(Arc::from("payload"), Duration::from_secs(2)).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        let late = RecordingSubscriber::new("late");
        let added = tokio::time::timeout(Duration::from_millis(100), registry.add(late.handle()))
            .await
            .expect("add must not wait for the broadcast");
        assert!(added);

        let report = broadcast.await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_membership_changes() {
        let registry = Arc::new(SubscriberRegistry::new());
        let mut tasks = Vec::new();

        for i in 0..32 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let sub = RecordingSubscriber::new(&format!("sub-{}", i)).handle();
                registry.add(Arc::clone(&sub)).await;
                registry.broadcast(Arc::from("x"), TIMEOUT).await;
                if i % 2 == 0 {
                    registry.remove(&sub).await;
                }
                sub
            }));
        }

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert_eq!(registry.len().await, 16);
        for (i, sub) in handles.iter().enumerate() {
            assert_eq!(registry.contains(sub).await, i % 2 == 1, "sub-{}", i);
        }
    }

    #[tokio::test]
    async fn test_stalled_subscriber_does_not_hang_broadcast() {
        let registry = SubscriberRegistry::new();
        let healthy = RecordingSubscriber::new("healthy");
        let stalled = RecordingSubscriber::stalled("stalled");
        registry.add(healthy.handle()).await;
        registry.add(stalled.handle()).await;

        let report = tokio::time::timeout(
            Duration::from_secs(3),
            registry.broadcast(Arc::from("p"), Duration::from_millis(50)),
        )
        .await
        .expect("broadcast must not wait on a stalled close");

        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
        assert_eq!(healthy.received(), vec!["p".to_string()]);
        assert!(!registry.contains(&stalled.handle()).await);
    }
}
