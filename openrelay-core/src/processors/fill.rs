//! The fill reprocessor.
//!
//! Consumes canonical-binary orders from the ingest topic, looks up their
//! on-chain fill/cancel state, and republishes:
//!
//! - every order, updated or not, to the `all` topic (persistence
//!   subscribes here and stays idempotent);
//! - only orders whose encoded state changed to the `change` topic
//!   (push/notification fan-out subscribes here and stays non-duplicative).
//!
//! Lookup failures are retried with bounded exponential backoff; an order
//! that exhausts its budget is dropped with a structured log and never
//! fails the upstream publish.

use crate::channels::{Consumer, Delivery, Publisher};
use alloy_primitives::U256;
use async_trait::async_trait;
use openrelay_sdk::objects::Order;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// On-chain settlement state for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillState {
    /// Taker-asset amount already filled.
    pub filled: U256,
    /// Whether the maker cancelled the order.
    pub cancelled: bool,
}

/// Errors from a fill-state lookup.
#[derive(Debug, Clone, Error)]
#[error("fill lookup failed: {0}")]
pub struct LookupError(pub String);

/// Fill-state source. The production implementation queries the exchange
/// contract over RPC; tests use [`MockFilledLookup`].
#[async_trait]
pub trait FilledLookup: Send + Sync {
    async fn fill_state(&self, order: &Order) -> Result<FillState, LookupError>;
}

/// Canned [`FilledLookup`] for tests and single-process wiring.
#[derive(Debug, Clone)]
pub struct MockFilledLookup {
    cancelled: bool,
    filled: U256,
    fail: Option<String>,
}

impl MockFilledLookup {
    pub fn new(cancelled: bool, filled: U256, fail: Option<String>) -> Self {
        Self {
            cancelled,
            filled,
            fail,
        }
    }
}

#[async_trait]
impl FilledLookup for MockFilledLookup {
    async fn fill_state(&self, _order: &Order) -> Result<FillState, LookupError> {
        match &self.fail {
            Some(reason) => Err(LookupError(reason.clone())),
            None => Ok(FillState {
                filled: self.filled,
                cancelled: self.cancelled,
            }),
        }
    }
}

/// Tuning knobs for the reprocessor.
#[derive(Debug, Clone, Copy)]
pub struct FillConfig {
    /// Concurrent in-flight lookups.
    pub workers: usize,
    /// Lookup attempts before an order is dropped.
    pub attempts: u32,
    /// Delay before the second attempt; doubles per attempt after that.
    pub base_delay: Duration,
    /// Deadline for each individual lookup call.
    pub call_timeout: Duration,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            attempts: 5,
            base_delay: Duration::from_millis(100),
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// The reprocessing consumer. Register it on the ingest topic.
pub struct FillConsumer {
    all: Arc<dyn Publisher>,
    change: Arc<dyn Publisher>,
    lookup: Arc<dyn FilledLookup>,
    limiter: Semaphore,
    config: FillConfig,
}

impl FillConsumer {
    pub fn new(
        all: Arc<dyn Publisher>,
        change: Arc<dyn Publisher>,
        lookup: Arc<dyn FilledLookup>,
        workers: usize,
    ) -> Self {
        Self::with_config(
            all,
            change,
            lookup,
            FillConfig {
                workers,
                ..FillConfig::default()
            },
        )
    }

    pub fn with_config(
        all: Arc<dyn Publisher>,
        change: Arc<dyn Publisher>,
        lookup: Arc<dyn FilledLookup>,
        config: FillConfig,
    ) -> Self {
        Self {
            all,
            change,
            lookup,
            limiter: Semaphore::new(config.workers.max(1)),
            config,
        }
    }

    async fn lookup_with_retry(&self, order: &Order) -> Result<FillState, LookupError> {
        let mut delay = self.config.base_delay;
        let mut last = LookupError("no attempts configured".to_owned());
        for attempt in 1..=self.config.attempts.max(1) {
            match tokio::time::timeout(self.config.call_timeout, self.lookup.fill_state(order))
                .await
            {
                Ok(Ok(state)) => return Ok(state),
                Ok(Err(e)) => last = e,
                Err(_) => last = LookupError("lookup timed out".to_owned()),
            }
            if attempt < self.config.attempts {
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    order_hash = %order.hash(),
                    "fill lookup failed, backing off"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
        }
        Err(last)
    }
}

/// Fold a fill-state observation into an order's mutable tail.
///
/// A cancel consumes the whole unfilled remainder, so terminal states keep
/// the `filled + cancelled >= takerAssetAmount` invariant.
pub fn apply_fill_state(order: &mut Order, state: FillState) {
    order.taker_asset_amount_filled = state.filled;
    if state.cancelled {
        order.taker_asset_amount_cancelled =
            order.taker_asset_amount.saturating_sub(state.filled);
    }
}

#[async_trait]
impl Consumer for FillConsumer {
    async fn consume(&self, delivery: Delivery) {
        let Ok(_permit) = self.limiter.acquire().await else {
            // The semaphore is never closed while the consumer lives.
            delivery.requeue();
            return;
        };

        let mut order = match Order::from_bytes(delivery.payload()) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "discarding undecodable order payload");
                delivery.ack();
                return;
            }
        };

        let state = match self.lookup_with_retry(&order).await {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    error = %e,
                    order_hash = %order.hash(),
                    attempts = self.config.attempts,
                    "dropping order after exhausting fill lookup retries"
                );
                delivery.ack();
                return;
            }
        };

        apply_fill_state(&mut order, state);
        let updated = order.to_bytes();

        if updated.as_ref() != delivery.payload() {
            if let Err(e) = self.change.publish(&updated) {
                warn!(error = %e, order_hash = %order.hash(), "change-topic publish failed");
            }
        }
        if let Err(e) = self.all.publish(&updated) {
            warn!(error = %e, order_hash = %order.hash(), "all-topic publish failed");
        }
        delivery.ack();
    }
}
