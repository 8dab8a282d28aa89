//! Routing pools and their fee policy.
//!
//! A pool is a routing namespace: it carries per-network sender and
//! fee-token addresses and a base-fee policy, and partitions the order
//! store (orders are keyed by `(pool_id, order_hash)`). Requests that do
//! not name a pool land in the default pool.
//!
//! Pools live in a [`PoolRegistry`] that handlers read per request, so a
//! config reload swaps pools without touching handler state.

use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use openrelay_sdk::objects::DEFAULT_POOL_ID;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name under which the default pool is registered.
pub const DEFAULT_POOL_NAME: &str = "default";

/// Minimum-fee policy for a pool.
#[async_trait]
pub trait BaseFee: Send + Sync {
    /// The minimum fee the pool requires for orders paying fees in
    /// `fee_token` on `network`.
    async fn base_fee(&self, network: u64, fee_token: &Address) -> U256;
}

/// A flat base fee regardless of network and fee token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticBaseFee(pub U256);

#[async_trait]
impl BaseFee for StaticBaseFee {
    async fn base_fee(&self, _network: u64, _fee_token: &Address) -> U256 {
        self.0
    }
}

/// A routing pool.
#[derive(Clone)]
pub struct Pool {
    pub id: B256,
    pub search_terms: String,
    pub sender_addresses: HashMap<u64, Address>,
    pub fee_token_addresses: HashMap<u64, Address>,
    base_fee: Arc<dyn BaseFee>,
}

impl Pool {
    pub fn new(id: B256, search_terms: impl Into<String>) -> Self {
        Self {
            id,
            search_terms: search_terms.into(),
            sender_addresses: HashMap::new(),
            fee_token_addresses: HashMap::new(),
            base_fee: Arc::new(StaticBaseFee(U256::ZERO)),
        }
    }

    /// The default pool: empty-string keccak id, no fee floor.
    pub fn default_pool() -> Self {
        Self::new(DEFAULT_POOL_ID, "")
    }

    /// A pool whose id is derived from its registry name.
    pub fn named(name: &str) -> Self {
        Self::new(keccak256(name.as_bytes()), "")
    }

    pub fn set_base_fee(&mut self, base_fee: Arc<dyn BaseFee>) {
        self.base_fee = base_fee;
    }

    pub fn with_base_fee(mut self, base_fee: Arc<dyn BaseFee>) -> Self {
        self.base_fee = base_fee;
        self
    }

    pub fn with_sender(mut self, network: u64, address: Address) -> Self {
        self.sender_addresses.insert(network, address);
        self
    }

    pub fn with_fee_token(mut self, network: u64, address: Address) -> Self {
        self.fee_token_addresses.insert(network, address);
        self
    }

    /// The sender address this pool routes through on `network`.
    pub fn sender(&self, network: u64) -> Address {
        self.sender_addresses
            .get(&network)
            .copied()
            .unwrap_or(Address::ZERO)
    }

    /// The fee token this pool charges in on `network`.
    pub fn fee_token(&self, network: u64) -> Address {
        self.fee_token_addresses
            .get(&network)
            .copied()
            .unwrap_or(Address::ZERO)
    }

    /// The minimum fee this pool requires on `network`.
    pub async fn base_fee(&self, network: u64) -> U256 {
        let fee_token = self.fee_token(network);
        self.base_fee.base_fee(network, &fee_token).await
    }
}

/// Shared, reloadable name-to-pool mapping.
#[derive(Clone)]
pub struct PoolRegistry {
    pools: Arc<RwLock<HashMap<String, Pool>>>,
}

impl PoolRegistry {
    /// A registry holding only the default pool.
    pub fn new() -> Self {
        let mut pools = HashMap::new();
        pools.insert(DEFAULT_POOL_NAME.to_owned(), Pool::default_pool());
        Self {
            pools: Arc::new(RwLock::new(pools)),
        }
    }

    pub async fn insert(&self, name: impl Into<String>, pool: Pool) {
        self.pools.write().await.insert(name.into(), pool);
    }

    /// Resolve a pool by its route name. `None` means 404.
    pub async fn resolve(&self, name: &str) -> Option<Pool> {
        self.pools.read().await.get(name).cloned()
    }

    /// Swap the whole mapping, e.g. after a config reload. The default
    /// pool is re-added if the new mapping lacks one.
    pub async fn replace_all(&self, mut pools: HashMap<String, Pool>) {
        pools
            .entry(DEFAULT_POOL_NAME.to_owned())
            .or_insert_with(Pool::default_pool);
        *self.pools.write().await = pools;
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
