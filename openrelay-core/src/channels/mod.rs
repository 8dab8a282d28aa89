//! Publisher/consumer contract for the relay pipeline.
//!
//! Every pipeline stage is a [`Consumer`] of one topic and a [`Publisher`]
//! to zero or more others; stages compose without knowing their transport.
//! The production transport is a message broker with durable at-least-once
//! delivery; [`mock`] provides an in-memory transport with the same
//! contract for tests and single-process deployments.
//!
//! Ordering: a transport must deliver one publisher's messages to a given
//! subscriber in publish order. Nothing is promised across publishers.

pub mod mock;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

pub use mock::{mock_channel, mock_publisher, MockChannel, MockPublisher};

/// Default bound on in-flight messages per topic.
///
/// Enough to absorb bursts while keeping memory bounded; beyond it,
/// publishers see [`PublishError::Full`] and the ingest layer surfaces
/// backpressure to clients.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Why a publish did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The topic's buffer is full; the caller should apply backpressure.
    #[error("channel buffer is full")]
    Full,
    /// The transport is gone; retrying cannot help.
    #[error("channel is closed")]
    Closed,
}

/// A handle that appends messages to one topic.
pub trait Publisher: Send + Sync {
    fn publish(&self, payload: &[u8]) -> Result<(), PublishError>;
}

/// A single message handed to a consumer.
///
/// The consumer must finish with exactly one of [`ack`](Delivery::ack),
/// [`reject`](Delivery::reject), or [`requeue`](Delivery::requeue).
#[derive(Debug)]
pub struct Delivery {
    payload: Vec<u8>,
    requeue_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl Delivery {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            requeue_tx: None,
        }
    }

    pub(crate) fn with_requeue(payload: Vec<u8>, tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self {
            payload,
            requeue_tx: Some(tx),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Mark the message processed.
    pub fn ack(self) {}

    /// Discard the message without processing it.
    pub fn reject(self) {}

    /// Put the message back at the end of its topic.
    ///
    /// Returns false when the transport no longer accepts it.
    pub fn requeue(self) -> bool {
        match self.requeue_tx {
            Some(tx) => tx.send(self.payload).is_ok(),
            None => false,
        }
    }
}

/// A pipeline stage fed by one topic.
#[async_trait]
pub trait Consumer: Send + Sync {
    async fn consume(&self, delivery: Delivery);
}

/// A topic that feeds registered consumers.
pub trait ConsumerChannel {
    /// Register a consumer. Every message is handed to every consumer.
    fn add_consumer(&self, consumer: Arc<dyn Consumer>) -> bool;
    /// Start delivering queued and future messages.
    fn start_consuming(&self) -> bool;
    /// Stop delivering. Messages published afterwards stay queued.
    fn stop_consuming(&self) -> bool;
}
