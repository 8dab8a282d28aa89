//! Persistence layer: the order store and the exchange registry.

pub mod exchange;
pub mod order;
pub mod pair;

use alloy_primitives::U256;
use sqlx::PgPool;

/// Executes store commands and queries against the connection pool.
///
/// Every operation is a command struct with a
/// [`kanau::processor::Processor`] implementation on this type;
/// transaction-scoped variants live as `_tx` associated functions on the
/// entity types.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

/// Order lifecycle status for database operations.
///
/// This is the `sqlx::Type` version. For API/DTO use, see
/// [`openrelay_sdk::objects::OrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "order_status")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
    Expired,
    Unfunded,
}

impl From<OrderStatus> for openrelay_sdk::objects::OrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Open => Self::Open,
            OrderStatus::Filled => Self::Filled,
            OrderStatus::Cancelled => Self::Cancelled,
            OrderStatus::Expired => Self::Expired,
            OrderStatus::Unfunded => Self::Unfunded,
        }
    }
}

impl From<openrelay_sdk::objects::OrderStatus> for OrderStatus {
    fn from(value: openrelay_sdk::objects::OrderStatus) -> Self {
        use openrelay_sdk::objects::OrderStatus as Sdk;
        match value {
            Sdk::Open => Self::Open,
            Sdk::Filled => Self::Filled,
            Sdk::Cancelled => Self::Cancelled,
            Sdk::Expired => Self::Expired,
            Sdk::Unfunded => Self::Unfunded,
        }
    }
}

/// 32-byte big-endian column form of a 256-bit quantity.
pub(crate) fn word_bytes(value: U256) -> Vec<u8> {
    value.to_be_bytes::<32>().to_vec()
}

/// Parse a 32-byte big-endian column back into a quantity.
pub(crate) fn word_value(raw: &[u8]) -> U256 {
    U256::try_from_be_slice(raw).unwrap_or(U256::ZERO)
}
