//! In-memory directory implementations.
//!
//! Backed by plain maps and sets, these serve two roles: test doubles for
//! the ingest handler, and the production wiring for deployments whose
//! account/affiliate/terms data lives in the config file.

use super::{Account, AccountService, Affiliate, AffiliateService, DirectoryError, ExchangeLookup, TermsManager};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Map-backed [`AccountService`].
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountService {
    blacklist: HashSet<Address>,
    discounts: HashMap<Address, U256>,
    blacklist_all: bool,
}

impl MemoryAccountService {
    /// Every address admitted with the default standing.
    pub fn open() -> Self {
        Self::default()
    }

    /// Every address blacklisted. Test-side switch for the silent-drop path.
    pub fn blacklist_all() -> Self {
        Self {
            blacklist_all: true,
            ..Self::default()
        }
    }

    pub fn with_blacklisted(mut self, address: Address) -> Self {
        self.blacklist.insert(address);
        self
    }

    pub fn with_discount(mut self, address: Address, discount: U256) -> Self {
        self.discounts.insert(address, discount);
        self
    }
}

#[async_trait]
impl AccountService for MemoryAccountService {
    async fn get(&self, address: &Address) -> Account {
        Account {
            blacklisted: self.blacklist_all || self.blacklist.contains(address),
            discount: self.discounts.get(address).copied().unwrap_or(U256::ZERO),
        }
    }
}

/// Map-backed [`AffiliateService`].
#[derive(Debug, Clone, Default)]
pub struct MemoryAffiliateService {
    affiliates: HashMap<Address, Affiliate>,
    catch_all: Option<Affiliate>,
}

impl MemoryAffiliateService {
    /// Any fee recipient is authorized and demands `fee`.
    pub fn allowing_all(fee: U256) -> Self {
        Self {
            affiliates: HashMap::new(),
            catch_all: Some(Affiliate { fee }),
        }
    }

    /// No fee recipient is authorized.
    pub fn denying_all() -> Self {
        Self::default()
    }

    pub fn with_affiliate(mut self, address: Address, fee: U256) -> Self {
        self.affiliates.insert(address, Affiliate { fee });
        self
    }
}

#[async_trait]
impl AffiliateService for MemoryAffiliateService {
    async fn get(&self, address: &Address) -> Result<Affiliate, DirectoryError> {
        self.affiliates
            .get(address)
            .copied()
            .or(self.catch_all)
            .ok_or(DirectoryError::UnknownAffiliate)
    }
}

/// Map-backed [`ExchangeLookup`].
#[derive(Debug, Clone, Default)]
pub struct MemoryExchangeLookup {
    networks: HashMap<Address, u64>,
    fixed: Option<u64>,
}

impl MemoryExchangeLookup {
    /// Every exchange address resolves to `network`. Pass 0 to make every
    /// exchange unknown.
    pub fn fixed(network: u64) -> Self {
        Self {
            networks: HashMap::new(),
            fixed: Some(network),
        }
    }

    pub fn with_exchange(mut self, address: Address, network: u64) -> Self {
        self.networks.insert(address, network);
        self
    }
}

#[async_trait]
impl ExchangeLookup for MemoryExchangeLookup {
    async fn exchange_is_known(&self, address: &Address) -> u64 {
        self.networks
            .get(address)
            .copied()
            .or(self.fixed)
            .unwrap_or(0)
    }
}

/// Set-backed [`TermsManager`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTermsManager {
    accepted: HashSet<Address>,
    accept_all: bool,
}

impl MemoryTermsManager {
    /// Every address has acceptance on file.
    pub fn accepting_all() -> Self {
        Self {
            accepted: HashSet::new(),
            accept_all: true,
        }
    }

    /// No address has acceptance on file.
    pub fn rejecting_all() -> Self {
        Self::default()
    }

    pub fn with_accepted(mut self, address: Address) -> Self {
        self.accepted.insert(address);
        self
    }
}

#[async_trait]
impl TermsManager for MemoryTermsManager {
    async fn check_address(&self, address: &Address) -> bool {
        self.accept_all || self.accepted.contains(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const MAKER: Address = address!("627306090abab3a6e1400e9345bc60c78a8bef57");

    #[tokio::test]
    async fn unknown_accounts_get_the_default_standing() {
        let accounts = MemoryAccountService::open();
        let account = accounts.get(&MAKER).await;
        assert!(!account.blacklisted);
        assert_eq!(account.discount, U256::ZERO);
    }

    #[tokio::test]
    async fn blacklist_and_discount_are_per_address() {
        let accounts = MemoryAccountService::open()
            .with_blacklisted(MAKER)
            .with_discount(MAKER, U256::from(50u64));
        assert!(accounts.get(&MAKER).await.blacklisted);
        assert_eq!(accounts.get(&MAKER).await.discount, U256::from(50u64));
        assert!(!accounts.get(&Address::ZERO).await.blacklisted);
    }

    #[tokio::test]
    async fn unauthorized_fee_recipients_error() {
        let affiliates = MemoryAffiliateService::denying_all();
        assert_eq!(
            affiliates.get(&MAKER).await,
            Err(DirectoryError::UnknownAffiliate)
        );

        let affiliates = MemoryAffiliateService::allowing_all(U256::from(1000u64));
        assert_eq!(
            affiliates.get(&MAKER).await.unwrap().fee,
            U256::from(1000u64)
        );
    }

    #[tokio::test]
    async fn unknown_exchanges_resolve_to_network_zero() {
        let lookup = MemoryExchangeLookup::default().with_exchange(MAKER, 1);
        assert_eq!(lookup.exchange_is_known(&MAKER).await, 1);
        assert_eq!(lookup.exchange_is_known(&Address::ZERO).await, 0);
    }

    #[tokio::test]
    async fn terms_acceptance_is_per_address() {
        let terms = MemoryTermsManager::rejecting_all().with_accepted(MAKER);
        assert!(terms.check_address(&MAKER).await);
        assert!(!terms.check_address(&Address::ZERO).await);
    }
}
