//! The exchange registry.
//!
//! An exchange contract is recognized on exactly the networks that have a
//! `(network, address)` row here. The registry backs both the pair queries
//! (orders join to it on the queried network) and the Postgres-backed
//! [`ExchangeLookup`] used by the ingest handler.

use super::DatabaseProcessor;
use crate::directories::ExchangeLookup;
use alloy_primitives::Address;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;

/// One registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Exchange {
    pub network: i64,
    pub address: Address,
}

/// Insert a registry row if it is not already present.
#[derive(Debug, Clone)]
pub struct EnsureExchange {
    pub network: i64,
    pub address: Address,
}

impl Processor<EnsureExchange, Result<(), sqlx::Error>> for DatabaseProcessor {
    #[tracing::instrument(skip_all, err, name = "SQL:EnsureExchange")]
    async fn process(&self, cmd: EnsureExchange) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO exchanges (network, address) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(cmd.network)
        .bind(cmd.address.as_slice().to_vec())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Look up the first network that recognizes an exchange address.
#[derive(Debug, Clone)]
pub struct GetExchangeNetwork {
    pub address: Address,
}

impl Processor<GetExchangeNetwork, Result<Option<i64>, sqlx::Error>> for DatabaseProcessor {
    #[tracing::instrument(skip_all, err, name = "SQL:GetExchangeNetwork")]
    async fn process(&self, query: GetExchangeNetwork) -> Result<Option<i64>, sqlx::Error> {
        let network: Option<(i64,)> = sqlx::query_as(
            "SELECT network FROM exchanges WHERE address = $1 ORDER BY network LIMIT 1",
        )
        .bind(query.address.as_slice().to_vec())
        .fetch_optional(&self.pool)
        .await?;
        Ok(network.map(|(n,)| n))
    }
}

/// [`ExchangeLookup`] backed by the `exchanges` table.
#[derive(Clone)]
pub struct DbExchangeLookup {
    processor: DatabaseProcessor,
}

impl DbExchangeLookup {
    pub fn new(pool: PgPool) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl ExchangeLookup for DbExchangeLookup {
    async fn exchange_is_known(&self, address: &Address) -> u64 {
        match self.processor.process(GetExchangeNetwork { address: *address }).await {
            Ok(Some(network)) if network > 0 => network as u64,
            Ok(_) => 0,
            Err(e) => {
                // Fail closed: a registry outage must not admit orders for
                // unvetted exchanges.
                tracing::error!(error = %e, exchange = %address, "exchange registry lookup failed");
                0
            }
        }
    }
}
