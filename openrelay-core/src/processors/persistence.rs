//! The persistence consumer.
//!
//! Subscribes to the `all` topic and writes every observation through the
//! order store. Idempotent by construction: the store upserts on
//! `(pool_id, order_hash)`, so at-least-once delivery from the transport
//! costs nothing.
//!
//! Transient store failures are retried with bounded backoff; payloads
//! that cannot be processed (undecodable, or conflicting with the stored
//! canonical fields) are diverted to the dead-letter topic instead of
//! poisoning the queue.

use crate::channels::{Consumer, Delivery, Publisher};
use crate::entities::order::StoreError;
use crate::entities::{DatabaseProcessor, OrderStatus};
use async_trait::async_trait;
use alloy_primitives::U256;
use openrelay_sdk::objects::Order;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Status implied by an order's fill state and expiration at `now`
/// (seconds since the epoch).
pub fn derive_status(order: &Order, now: i64) -> OrderStatus {
    if !order.taker_asset_amount_cancelled.is_zero() {
        return OrderStatus::Cancelled;
    }
    if !order.taker_asset_amount.is_zero()
        && order.taker_asset_amount_filled >= order.taker_asset_amount
    {
        return OrderStatus::Filled;
    }
    if order.expiration_timestamp_seconds <= U256::from(now.max(0) as u64) {
        return OrderStatus::Expired;
    }
    OrderStatus::Open
}

/// Writes `all`-topic observations into the order store.
pub struct PersistenceConsumer {
    processor: DatabaseProcessor,
    dead_letter: Option<Arc<dyn Publisher>>,
    post_save: Option<Arc<dyn Publisher>>,
    attempts: u32,
    base_delay: Duration,
}

impl PersistenceConsumer {
    pub fn new(processor: DatabaseProcessor) -> Self {
        Self {
            processor,
            dead_letter: None,
            post_save: None,
            attempts: 5,
            base_delay: Duration::from_millis(100),
        }
    }

    /// Divert poison payloads here instead of dropping them.
    pub fn with_dead_letter(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.dead_letter = Some(publisher);
        self
    }

    /// Announce every durable write here (e.g. for websocket outboxes).
    pub fn with_post_save(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.post_save = Some(publisher);
        self
    }

    pub fn with_retries(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.base_delay = base_delay;
        self
    }

    fn divert(&self, payload: &[u8], why: &str) {
        match &self.dead_letter {
            Some(dead_letter) => {
                if let Err(e) = dead_letter.publish(payload) {
                    error!(error = %e, why, "dead-letter publish failed, payload lost");
                } else {
                    warn!(why, "payload diverted to dead-letter topic");
                }
            }
            None => warn!(why, "payload dropped, no dead-letter topic configured"),
        }
    }
}

#[async_trait]
impl Consumer for PersistenceConsumer {
    async fn consume(&self, delivery: Delivery) {
        let order = match Order::from_bytes(delivery.payload()) {
            Ok(order) => order,
            Err(e) => {
                self.divert(delivery.payload(), "undecodable payload");
                debug!(error = %e, "persistence consumer rejected payload");
                delivery.ack();
                return;
            }
        };

        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let status = derive_status(&order, now);

        let mut delay = self.base_delay;
        for attempt in 1..=self.attempts {
            match self
                .processor
                .save_and_publish(&order, status, self.post_save.as_deref())
                .await
            {
                Ok(()) => {
                    delivery.ack();
                    return;
                }
                // Non-transient: retrying can never succeed.
                Err(e @ (StoreError::EmptyOrder | StoreError::HashMismatch)) => {
                    self.divert(delivery.payload(), "unsaveable order");
                    debug!(error = %e, order_hash = %order.hash(), "order refused by store");
                    delivery.ack();
                    return;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt,
                        order_hash = %order.hash(),
                        "order save failed"
                    );
                    if attempt < self.attempts {
                        tokio::time::sleep(delay).await;
                        delay = delay.saturating_mul(2);
                    }
                }
            }
        }

        self.divert(delivery.payload(), "save retries exhausted");
        delivery.ack();
    }
}
