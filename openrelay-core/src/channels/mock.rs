//! In-memory transport for tests and single-process deployments.
//!
//! [`mock_publisher`] yields a publisher plus the receiving end of its
//! topic; [`mock_channel`] additionally wraps the receiving end in a
//! [`MockChannel`] that drives registered consumers from a single task, so
//! per-publisher delivery order is preserved.

use super::{Consumer, ConsumerChannel, Delivery, Publisher, PublishError};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Recording publisher backed by an unbounded tokio channel.
///
/// Keeps every accepted payload in an inspection log for assertions. A
/// bounded variant refuses publishes past its capacity, which is how tests
/// exercise the backpressure path.
pub struct MockPublisher {
    messages: Mutex<Vec<Vec<u8>>>,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    capacity: Option<usize>,
}

/// A publisher plus the receiving end of its topic.
pub fn mock_publisher() -> (Arc<MockPublisher>, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Arc::new(MockPublisher {
            messages: Mutex::new(Vec::new()),
            tx,
            capacity: None,
        }),
        rx,
    )
}

/// A publisher plus a consumer channel fed by it.
pub fn mock_channel() -> (Arc<MockPublisher>, MockChannel) {
    let (publisher, rx) = mock_publisher();
    let requeue_tx = publisher.tx.clone();
    (publisher, MockChannel::new(rx, requeue_tx))
}

impl MockPublisher {
    /// A publisher that accepts at most `capacity` messages.
    pub fn bounded(capacity: usize) -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
                tx,
                capacity: Some(capacity),
            }),
            rx,
        )
    }

    /// Snapshot of every accepted payload, in publish order.
    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Number of accepted payloads.
    pub fn message_count(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }
}

impl Publisher for MockPublisher {
    fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        let mut messages = self.messages.lock().map_err(|_| PublishError::Closed)?;
        if let Some(capacity) = self.capacity {
            if messages.len() >= capacity {
                return Err(PublishError::Full);
            }
        }
        self.tx
            .send(payload.to_vec())
            .map_err(|_| PublishError::Closed)?;
        messages.push(payload.to_vec());
        Ok(())
    }
}

/// A topic that hands each queued message to every registered consumer.
///
/// One task drains the queue, so deliveries reach consumers in publish
/// order. Requeued messages re-enter at the back of the queue.
pub struct MockChannel {
    requeue_tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
    consumers: Arc<Mutex<Vec<Arc<dyn Consumer>>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MockChannel {
    fn new(rx: mpsc::UnboundedReceiver<Vec<u8>>, requeue_tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self {
            requeue_tx,
            rx: Mutex::new(Some(rx)),
            consumers: Arc::new(Mutex::new(Vec::new())),
            task: Mutex::new(None),
        }
    }
}

impl ConsumerChannel for MockChannel {
    fn add_consumer(&self, consumer: Arc<dyn Consumer>) -> bool {
        match self.consumers.lock() {
            Ok(mut consumers) => {
                consumers.push(consumer);
                true
            }
            Err(_) => false,
        }
    }

    fn start_consuming(&self) -> bool {
        let Ok(mut slot) = self.rx.lock() else {
            return false;
        };
        let Some(mut rx) = slot.take() else {
            return false;
        };
        let consumers = Arc::clone(&self.consumers);
        let requeue_tx = self.requeue_tx.clone();
        let handle = tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                let snapshot = match consumers.lock() {
                    Ok(consumers) => consumers.clone(),
                    Err(_) => break,
                };
                for consumer in snapshot {
                    let delivery = Delivery::with_requeue(payload.clone(), requeue_tx.clone());
                    consumer.consume(delivery).await;
                }
            }
        });
        match self.task.lock() {
            Ok(mut task) => {
                *task = Some(handle);
                true
            }
            Err(_) => {
                handle.abort();
                false
            }
        }
    }

    fn stop_consuming(&self) -> bool {
        match self.task.lock() {
            Ok(mut task) => match task.take() {
                Some(handle) => {
                    handle.abort();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}
