//! Directory capabilities the ingest handler depends on.
//!
//! Four narrow lookup surfaces, each behind a trait so the handler never
//! learns where the data lives:
//!
//! - [`AccountService`]: maker standing (blacklist flag, fee discount).
//! - [`AffiliateService`]: authorized fee recipients and their minimum fees.
//! - [`ExchangeLookup`]: which network, if any, recognizes an exchange
//!   contract. Implementations may batch; the call is async for that reason.
//! - [`TermsManager`]: terms-of-service acceptance on file for an address.
//!
//! [`memory`] provides in-memory implementations used by tests and by
//! config-driven wiring; the exchange registry also has a Postgres-backed
//! implementation in [`crate::entities::exchange`].

pub mod memory;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::{
    MemoryAccountService, MemoryAffiliateService, MemoryExchangeLookup, MemoryTermsManager,
};

/// Errors from directory lookups that can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The address is not an authorized fee recipient.
    #[error("address is not an authorized fee recipient")]
    UnknownAffiliate,
    /// The backing store misbehaved.
    #[error("directory backend error: {0}")]
    Backend(String),
}

/// An account's standing with the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    /// Blacklisted accounts are silently dropped at ingest.
    pub blacklisted: bool,
    /// Amount subtracted from the required fee for this account.
    pub discount: U256,
}

impl Default for Account {
    /// The standing of an address the relay has never seen: admitted, no
    /// discount.
    fn default() -> Self {
        Self {
            blacklisted: false,
            discount: U256::ZERO,
        }
    }
}

/// An authorized fee recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affiliate {
    /// Minimum base fee this recipient demands.
    pub fee: U256,
}

/// Account standing lookups. Never fails; unknown addresses get the
/// default standing.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn get(&self, address: &Address) -> Account;
}

/// Fee-recipient authorization lookups.
#[async_trait]
pub trait AffiliateService: Send + Sync {
    async fn get(&self, address: &Address) -> Result<Affiliate, DirectoryError>;
}

/// Exchange-registry lookups.
#[async_trait]
pub trait ExchangeLookup: Send + Sync {
    /// The network id on which the exchange contract is recognized, or 0
    /// when it is unknown everywhere.
    async fn exchange_is_known(&self, address: &Address) -> u64;
}

/// Terms-of-service acceptance lookups.
#[async_trait]
pub trait TermsManager: Send + Sync {
    /// True iff the address has acceptance of the terms on file.
    async fn check_address(&self, address: &Address) -> bool;
}
