//! Runtime wiring built from the file configuration.

use super::file::FileConfig;
use openrelay_core::directories::{
    AccountService, AffiliateService, MemoryAccountService, MemoryAffiliateService,
    MemoryTermsManager, TermsManager,
};
use openrelay_core::pool::{Pool, PoolRegistry, StaticBaseFee};
use openrelay_core::processors::FillConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Pipeline tuning derived from the `[relay]` section.
#[derive(Debug, Clone, Copy)]
pub struct RelayTuning {
    pub fill: FillConfig,
    pub lookup_timeout: Duration,
}

impl RelayTuning {
    pub fn from_config(config: &FileConfig) -> Self {
        Self {
            fill: FillConfig {
                workers: config.relay.fill_workers,
                attempts: config.relay.retry_attempts,
                base_delay: Duration::from_millis(config.relay.retry_base_delay_ms),
                ..FillConfig::default()
            },
            lookup_timeout: Duration::from_millis(config.relay.lookup_timeout_ms),
        }
    }
}

/// Build the name-to-pool mapping from the `[[pools]]` sections.
///
/// Shared by startup and SIGHUP reloads.
pub fn build_pool_map(config: &FileConfig) -> HashMap<String, Pool> {
    let mut pools = HashMap::new();
    for section in &config.pools {
        let mut pool = match section.id {
            Some(id) => Pool::new(id, section.search_terms.clone()),
            None => Pool::named(&section.name),
        };
        pool.search_terms = section.search_terms.clone();
        pool.set_base_fee(Arc::new(StaticBaseFee(section.base_fee)));
        pool.sender_addresses = parse_network_map(&section.senders, &section.name, "senders");
        pool.fee_token_addresses =
            parse_network_map(&section.fee_tokens, &section.name, "fee_tokens");
        pools.insert(section.name.clone(), pool);
    }
    pools
}

/// Build the pool registry from the `[[pools]]` sections.
///
/// The default pool always exists; configured pools are added next to it.
pub async fn build_pools(config: &FileConfig) -> PoolRegistry {
    let registry = PoolRegistry::new();
    registry.replace_all(build_pool_map(config)).await;
    registry
}

fn parse_network_map(
    raw: &HashMap<String, alloy_primitives::Address>,
    pool: &str,
    section: &str,
) -> HashMap<u64, alloy_primitives::Address> {
    raw.iter()
        .filter_map(|(network, address)| match network.parse::<u64>() {
            Ok(network) => Some((network, *address)),
            Err(_) => {
                tracing::warn!(pool, section, network, "ignoring non-numeric network key");
                None
            }
        })
        .collect()
}

/// Build the config-backed account, affiliate, and terms directories.
pub fn build_directories(
    config: &FileConfig,
) -> (
    Arc<dyn AccountService>,
    Arc<dyn AffiliateService>,
    Arc<dyn TermsManager>,
) {
    let mut accounts = MemoryAccountService::open();
    for address in &config.accounts.blacklist {
        accounts = accounts.with_blacklisted(*address);
    }
    for discount in &config.accounts.discounts {
        accounts = accounts.with_discount(discount.address, discount.discount);
    }

    let mut affiliates = MemoryAffiliateService::denying_all();
    for affiliate in &config.affiliates {
        affiliates = affiliates.with_affiliate(affiliate.address, affiliate.fee);
    }

    let mut terms = if config.terms.accept_all {
        MemoryTermsManager::accepting_all()
    } else {
        MemoryTermsManager::rejecting_all()
    };
    for address in &config.terms.accepted {
        terms = terms.with_accepted(*address);
    }

    (Arc::new(accounts), Arc::new(affiliates), Arc::new(terms))
}
