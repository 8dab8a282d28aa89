//! TOML file configuration structures.
//!
//! These structs directly map to the `openrelay-config.toml` file format.

use alloy_primitives::{Address, B256, U256};
use openrelay_sdk::objects::order::u256_decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub pools: Vec<PoolSection>,
    #[serde(default)]
    pub affiliates: Vec<AffiliateSection>,
    #[serde(default)]
    pub accounts: AccountsSection,
    #[serde(default)]
    pub terms: TermsSection,
    #[serde(default)]
    pub exchanges: Vec<ExchangeSection>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Pipeline tuning section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySection {
    /// Concurrent fill-reprocessor workers.
    #[serde(default = "default_fill_workers")]
    pub fill_workers: usize,
    /// Deadline for each directory/registry lookup during ingest, in
    /// milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// Fill-lookup attempts before a message is dropped.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Delay before the second fill-lookup attempt, in milliseconds;
    /// doubles per attempt.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            fill_workers: default_fill_workers(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_fill_workers() -> usize {
    1
}

fn default_lookup_timeout_ms() -> u64 {
    5_000
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

/// One routing pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSection {
    /// Route name (the `{pool}` path segment).
    pub name: String,
    /// Explicit 32-byte pool id; derived from the name when absent.
    #[serde(default)]
    pub id: Option<B256>,
    #[serde(default)]
    pub search_terms: String,
    /// Flat minimum fee, in fee-token base units.
    #[serde(default, with = "u256_decimal")]
    pub base_fee: U256,
    /// network id -> sender address.
    #[serde(default)]
    pub senders: HashMap<String, Address>,
    /// network id -> fee token address.
    #[serde(default)]
    pub fee_tokens: HashMap<String, Address>,
}

/// One authorized fee recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateSection {
    pub address: Address,
    /// Minimum fee this recipient demands.
    #[serde(default, with = "u256_decimal")]
    pub fee: U256,
}

/// Account standing overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsSection {
    #[serde(default)]
    pub blacklist: Vec<Address>,
    #[serde(default)]
    pub discounts: Vec<DiscountSection>,
}

/// A per-address fee discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountSection {
    pub address: Address,
    #[serde(default, with = "u256_decimal")]
    pub discount: U256,
}

/// Terms-of-service acceptance source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermsSection {
    /// When true, every maker is treated as having signed the terms.
    #[serde(default = "default_accept_all")]
    pub accept_all: bool,
    #[serde(default)]
    pub accepted: Vec<Address>,
}

impl Default for TermsSection {
    fn default() -> Self {
        Self {
            accept_all: default_accept_all(),
            accepted: Vec::new(),
        }
    }
}

fn default_accept_all() -> bool {
    true
}

/// One exchange-registry seed row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSection {
    pub network: i64,
    pub address: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.relay.fill_workers, 1);
        assert!(config.terms.accept_all);
        assert!(config.pools.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[relay]
fill_workers = 4
lookup_timeout_ms = 2500

[[pools]]
name = "premium"
base_fee = "1000"

[pools.senders]
1 = "0x0000000000000000000000000000000000000001"

[pools.fee_tokens]
1 = "0x6b175474e89094c44da98b954eedeac495271d0f"

[[affiliates]]
address = "0x1dad4783cf3fe3085c1426157ab175a6119a04ba"
fee = "500"

[accounts]
blacklist = ["0x627306090abab3a6e1400e9345bc60c78a8bef57"]

[terms]
accept_all = false
accepted = ["0x627306090abab3a6e1400e9345bc60c78a8bef57"]

[[exchanges]]
network = 1
address = "0x90fe2af704b34e0224bf2299c838e04d4dcf1364"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.relay.fill_workers, 4);
        assert_eq!(config.pools.len(), 1);
        assert_eq!(config.pools[0].base_fee, U256::from(1000u64));
        assert_eq!(config.pools[0].senders.len(), 1);
        assert_eq!(config.affiliates[0].fee, U256::from(500u64));
        assert_eq!(config.accounts.blacklist.len(), 1);
        assert!(!config.terms.accept_all);
        assert_eq!(config.exchanges[0].network, 1);
    }
}
