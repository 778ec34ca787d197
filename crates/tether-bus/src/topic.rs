//! Topic-addressed message channels
//!
//! The bus keeps one broadcast channel per topic name. Payloads travel
//! type-erased; the typed [`Publisher`] and subscription wrappers downcast
//! at the edges. A payload whose type does not match a subscription's
//! message type is dropped without invoking the callback.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::BusConfig;
use crate::error::BusError;

/// Type-erased payload travelling on a topic channel
type Payload = Arc<dyn Any + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// QoS Profile
// ─────────────────────────────────────────────────────────────────────────────

/// Per-endpoint quality-of-service configuration
///
/// `depth` is the number of buffered messages retained per subscription; a
/// slow subscriber that falls further behind loses the oldest messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosProfile {
    pub depth: usize,
}

impl Default for QosProfile {
    fn default() -> Self {
        Self { depth: 10 }
    }
}

impl QosProfile {
    /// Create a profile with a specific depth
    pub fn with_depth(depth: usize) -> Self {
        Self { depth }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message Bus
// ─────────────────────────────────────────────────────────────────────────────

/// Topic-addressed channel provider
///
/// Cheap to share behind an `Arc`. Topics are created lazily on first use;
/// the first endpoint's QoS depth sizes the channel.
pub struct MessageBus {
    topics: DashMap<String, broadcast::Sender<Payload>>,
    default_depth: usize,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    /// Create a new bus with default QoS
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
            default_depth: QosProfile::default().depth,
        }
    }

    /// Create a bus honoring a [`BusConfig`]
    pub fn with_config(config: &BusConfig) -> Self {
        Self {
            topics: DashMap::new(),
            default_depth: config.default_qos_depth,
        }
    }

    /// The bus-wide default QoS profile
    pub fn default_qos(&self) -> QosProfile {
        QosProfile::with_depth(self.default_depth)
    }

    fn channel(&self, topic: &str, depth: usize) -> broadcast::Sender<Payload> {
        self.topics
            .entry(topic.to_owned())
            .or_insert_with(|| {
                tracing::debug!(topic, depth, "creating topic channel");
                broadcast::channel(depth.max(1)).0
            })
            .clone()
    }

    /// Create a publish endpoint for `topic`
    pub fn create_publisher<M>(&self, topic: &str, qos: QosProfile) -> Publisher<M>
    where
        M: Send + Sync + 'static,
    {
        let tx = self.channel(topic, qos.depth);
        tracing::info!(topic, "publisher created");
        Publisher {
            topic: topic.to_owned(),
            tx,
            _marker: PhantomData,
        }
    }

    /// Create a subscribe endpoint for `topic`
    ///
    /// `on_message` is invoked on a bus-owned task for every payload of
    /// type `M` arriving on the topic. Dropping the returned handle stops
    /// delivery and releases the task.
    pub fn create_subscription<M, F>(&self, topic: &str, qos: QosProfile, on_message: F) -> Subscription
    where
        M: Send + Sync + 'static,
        F: Fn(&M) + Send + Sync + 'static,
    {
        let mut rx = self.channel(topic, qos.depth).subscribe();
        let topic_name = topic.to_owned();
        let task_topic = topic_name.clone();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => match payload.downcast::<M>() {
                        Ok(msg) => on_message(&msg),
                        Err(_) => {
                            tracing::trace!(topic = %task_topic, "dropping payload of foreign type");
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(topic = %task_topic, skipped, "subscription lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        tracing::info!(topic, "subscription created");
        Subscription {
            topic: topic_name,
            task,
        }
    }

    /// Number of live topics
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Publisher
// ─────────────────────────────────────────────────────────────────────────────

/// Typed publish endpoint for one topic
pub struct Publisher<M> {
    topic: String,
    tx: broadcast::Sender<Payload>,
    _marker: PhantomData<fn(M)>,
}

impl<M> Publisher<M>
where
    M: Send + Sync + 'static,
{
    /// Publish one message
    ///
    /// Publishing with no live subscribers is not an error; the message is
    /// simply not delivered anywhere.
    pub fn send(&self, msg: M) -> Result<(), BusError> {
        match self.tx.send(Arc::new(msg)) {
            Ok(receivers) => {
                tracing::trace!(topic = %self.topic, receivers, "message published");
                Ok(())
            }
            Err(_) => {
                tracing::trace!(topic = %self.topic, "message published to empty topic");
                Ok(())
            }
        }
    }

    /// The topic this endpoint publishes to
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl<M> std::fmt::Debug for Publisher<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").field("topic", &self.topic).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscription
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a live subscription; dropping it stops delivery
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    task: JoinHandle<()>,
}

impl Subscription {
    /// The topic this subscription listens on
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio_test::assert_ok;

    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        value: f64,
    }

    #[tokio::test]
    async fn test_publish_subscribe_roundtrip() {
        let bus = MessageBus::new();
        let received: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        let _sub = bus.create_subscription::<Reading, _>("Sensor1", QosProfile::default(), move |msg| {
            sink.lock().push(msg.value);
        });

        let publisher = bus.create_publisher::<Reading>("Sensor1", QosProfile::default());
        tokio_test::assert_ok!(publisher.send(Reading { value: 1.5 }));
        tokio_test::assert_ok!(publisher.send(Reading { value: 2.5 }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*received.lock(), vec![1.5, 2.5]);
    }

    #[tokio::test]
    async fn test_foreign_payload_type_is_dropped() {
        let bus = MessageBus::new();
        let received: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        let _sub = bus.create_subscription::<Reading, _>("mixed", QosProfile::default(), move |msg| {
            sink.lock().push(msg.value);
        });

        // A publisher of a different message type on the same topic
        let stranger = bus.create_publisher::<String>("mixed", QosProfile::default());
        tokio_test::assert_ok!(stranger.send("not a reading".to_string()));

        let publisher = bus.create_publisher::<Reading>("mixed", QosProfile::default());
        tokio_test::assert_ok!(publisher.send(Reading { value: 3.0 }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*received.lock(), vec![3.0]);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = MessageBus::new();
        let publisher = bus.create_publisher::<Reading>("lonely", QosProfile::with_depth(1));
        tokio_test::assert_ok!(publisher.send(Reading { value: 0.0 }));
    }

    #[tokio::test]
    async fn test_dropping_subscription_stops_delivery() {
        let bus = MessageBus::new();
        let received: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        let sub = bus.create_subscription::<Reading, _>("ephemeral", QosProfile::default(), move |msg| {
            sink.lock().push(msg.value);
        });
        let publisher = bus.create_publisher::<Reading>("ephemeral", QosProfile::default());

        tokio_test::assert_ok!(publisher.send(Reading { value: 1.0 }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(sub);

        tokio_test::assert_ok!(publisher.send(Reading { value: 2.0 }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*received.lock(), vec![1.0]);
    }
}
