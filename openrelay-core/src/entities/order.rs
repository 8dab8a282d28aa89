//! The order store.
//!
//! Orders are keyed by `(pool_id, order_hash)` and carry, next to the
//! canonical fields, the derived state the query API sorts and filters on:
//! status, price, fee rate, and the remaining amounts computed from
//! on-chain fill progress. The canonical fields never change under a key;
//! the derived state is last-writer-wins.

use super::{word_bytes, word_value, DatabaseProcessor, OrderStatus};
use crate::channels::Publisher;
use alloy_primitives::{Address, Bytes, B256, U256, U512};
use kanau::processor::Processor;
use openrelay_sdk::objects::Order;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors produced by the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Refusing to persist the all-zero order.
    #[error("refusing to save an empty order")]
    EmptyOrder,

    /// The stored canonical fields under this key differ from the ones
    /// being written.
    #[error("canonical fields diverge from the stored order with this hash")]
    HashMismatch,

    /// A persisted row no longer parses into an order.
    #[error("corrupt order row: {0}")]
    CorruptRow(&'static str),
}

/// Remaining amounts derived from fill progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Remaining {
    pub maker_asset: U256,
    pub taker_asset: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
}

/// A persisted order with its derived state.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order: Order,
    pub status: OrderStatus,
    pub price: f64,
    pub fee_rate: f64,
    pub remaining: Remaining,
}

impl OrderRecord {
    /// Build a record from an order, recomputing every derived field.
    pub fn compute(order: Order, status: OrderStatus) -> Self {
        let price = price(&order);
        let fee_rate = fee_rate(&order);
        let remaining = remaining_amounts(&order);
        Self {
            order,
            status,
            price,
            fee_rate,
            remaining,
        }
    }

    /// Upsert within a caller-managed transaction.
    pub async fn save_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order: &Order,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        save_on(&mut **tx, order, status).await
    }
}

/// Lossy conversion for price/fee-rate sorting keys.
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .enumerate()
        .map(|(i, limb)| (*limb as f64) * 2f64.powi(64 * i as i32))
        .sum()
}

/// taker/maker exchange rate, 0 when the maker amount is 0.
pub fn price(order: &Order) -> f64 {
    let maker = u256_to_f64(order.maker_asset_amount);
    if maker == 0.0 {
        return 0.0;
    }
    u256_to_f64(order.taker_asset_amount) / maker
}

/// Combined fee relative to combined volume, 0 when the volume is 0.
pub fn fee_rate(order: &Order) -> f64 {
    let volume =
        u256_to_f64(order.maker_asset_amount) + u256_to_f64(order.taker_asset_amount);
    if volume == 0.0 {
        return 0.0;
    }
    (u256_to_f64(order.maker_fee) + u256_to_f64(order.taker_fee)) / volume
}

/// `value * numerator / denominator` through a 512-bit intermediate.
fn mul_div(value: U256, numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::ZERO;
    }
    let product: U512 = value.widening_mul(numerator);
    (product / U512::from(denominator)).saturating_to::<U256>()
}

/// Remaining amounts given the order's fill progress.
///
/// The taker remainder is what is neither filled nor cancelled; maker-side
/// amounts and both fees scale down proportionally. Terminal fill states
/// (`filled + cancelled >= takerAssetAmount`) leave everything at zero.
pub fn remaining_amounts(order: &Order) -> Remaining {
    let total = order.taker_asset_amount;
    if total.is_zero() {
        return Remaining::default();
    }
    let consumed = order
        .taker_asset_amount_filled
        .saturating_add(order.taker_asset_amount_cancelled);
    if consumed >= total {
        return Remaining::default();
    }
    let taker_remaining = total - consumed;
    Remaining {
        maker_asset: mul_div(order.maker_asset_amount, taker_remaining, total),
        taker_asset: taker_remaining,
        maker_fee: mul_div(order.maker_fee, taker_remaining, total),
        taker_fee: mul_div(order.taker_fee, taker_remaining, total),
    }
}

static EMPTY_ORDER_HASH: OnceLock<B256> = OnceLock::new();

/// Hash of the all-zero canonical order, which the store refuses to keep.
pub fn empty_order_hash() -> B256 {
    *EMPTY_ORDER_HASH.get_or_init(|| Order::default().hash())
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    pool_id: Vec<u8>,
    maker_address: Vec<u8>,
    taker_address: Vec<u8>,
    fee_recipient_address: Vec<u8>,
    sender_address: Vec<u8>,
    exchange_address: Vec<u8>,
    maker_asset_data: Vec<u8>,
    taker_asset_data: Vec<u8>,
    maker_asset_amount: Vec<u8>,
    taker_asset_amount: Vec<u8>,
    maker_fee: Vec<u8>,
    taker_fee: Vec<u8>,
    expiration_timestamp_seconds: Vec<u8>,
    salt: Vec<u8>,
    signature: Vec<u8>,
    taker_asset_amount_filled: Vec<u8>,
    taker_asset_amount_cancelled: Vec<u8>,
    maker_asset_remaining: Vec<u8>,
    taker_asset_remaining: Vec<u8>,
    maker_fee_remaining: Vec<u8>,
    taker_fee_remaining: Vec<u8>,
    price: f64,
    fee_rate: f64,
    status: OrderStatus,
}

fn column_address(raw: &[u8]) -> Result<Address, StoreError> {
    Address::try_from(raw).map_err(|_| StoreError::CorruptRow("address column width"))
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, StoreError> {
        let order = Order {
            maker_address: column_address(&row.maker_address)?,
            taker_address: column_address(&row.taker_address)?,
            fee_recipient_address: column_address(&row.fee_recipient_address)?,
            sender_address: column_address(&row.sender_address)?,
            maker_asset_data: Bytes::from(row.maker_asset_data),
            taker_asset_data: Bytes::from(row.taker_asset_data),
            exchange_address: column_address(&row.exchange_address)?,
            maker_asset_amount: word_value(&row.maker_asset_amount),
            taker_asset_amount: word_value(&row.taker_asset_amount),
            maker_fee: word_value(&row.maker_fee),
            taker_fee: word_value(&row.taker_fee),
            expiration_timestamp_seconds: word_value(&row.expiration_timestamp_seconds),
            salt: word_value(&row.salt),
            signature: Bytes::from(row.signature),
            pool_id: B256::try_from(row.pool_id.as_slice())
                .map_err(|_| StoreError::CorruptRow("pool_id column width"))?,
            taker_asset_amount_filled: word_value(&row.taker_asset_amount_filled),
            taker_asset_amount_cancelled: word_value(&row.taker_asset_amount_cancelled),
        };
        Ok(Self {
            order,
            status: row.status,
            price: row.price,
            fee_rate: row.fee_rate,
            remaining: Remaining {
                maker_asset: word_value(&row.maker_asset_remaining),
                taker_asset: word_value(&row.taker_asset_remaining),
                maker_fee: word_value(&row.maker_fee_remaining),
                taker_fee: word_value(&row.taker_fee_remaining),
            },
        })
    }
}

const ORDER_COLUMNS: &str = "pool_id, order_hash, maker_address, taker_address, \
     fee_recipient_address, sender_address, exchange_address, maker_asset_data, \
     taker_asset_data, maker_asset_amount, taker_asset_amount, maker_fee, taker_fee, \
     expiration_timestamp_seconds, salt, signature, taker_asset_amount_filled, \
     taker_asset_amount_cancelled, maker_asset_remaining, taker_asset_remaining, \
     maker_fee_remaining, taker_fee_remaining, price, fee_rate, status";

async fn save_on<'e, E>(executor: E, order: &Order, status: OrderStatus) -> Result<(), StoreError>
where
    E: sqlx::PgExecutor<'e>,
{
    let order_hash = order.hash();
    if order_hash == empty_order_hash() {
        return Err(StoreError::EmptyOrder);
    }
    let record = OrderRecord::compute(order.clone(), status);

    let result = sqlx::query(
        "INSERT INTO orders (pool_id, order_hash, maker_address, taker_address, \
         fee_recipient_address, sender_address, exchange_address, maker_asset_data, \
         taker_asset_data, maker_asset_amount, taker_asset_amount, maker_fee, taker_fee, \
         expiration_timestamp_seconds, salt, signature, taker_asset_amount_filled, \
         taker_asset_amount_cancelled, maker_asset_remaining, taker_asset_remaining, \
         maker_fee_remaining, taker_fee_remaining, price, fee_rate, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
         $17, $18, $19, $20, $21, $22, $23, $24, $25) \
         ON CONFLICT (pool_id, order_hash) DO UPDATE SET \
         signature = EXCLUDED.signature, \
         taker_asset_amount_filled = EXCLUDED.taker_asset_amount_filled, \
         taker_asset_amount_cancelled = EXCLUDED.taker_asset_amount_cancelled, \
         maker_asset_remaining = EXCLUDED.maker_asset_remaining, \
         taker_asset_remaining = EXCLUDED.taker_asset_remaining, \
         maker_fee_remaining = EXCLUDED.maker_fee_remaining, \
         taker_fee_remaining = EXCLUDED.taker_fee_remaining, \
         price = EXCLUDED.price, \
         fee_rate = EXCLUDED.fee_rate, \
         status = EXCLUDED.status \
         WHERE orders.salt = EXCLUDED.salt \
         AND orders.maker_address = EXCLUDED.maker_address \
         AND orders.maker_asset_data = EXCLUDED.maker_asset_data \
         AND orders.taker_asset_data = EXCLUDED.taker_asset_data",
    )
    .bind(order.pool_id.as_slice().to_vec())
    .bind(order_hash.as_slice().to_vec())
    .bind(order.maker_address.as_slice().to_vec())
    .bind(order.taker_address.as_slice().to_vec())
    .bind(order.fee_recipient_address.as_slice().to_vec())
    .bind(order.sender_address.as_slice().to_vec())
    .bind(order.exchange_address.as_slice().to_vec())
    .bind(order.maker_asset_data.to_vec())
    .bind(order.taker_asset_data.to_vec())
    .bind(word_bytes(order.maker_asset_amount))
    .bind(word_bytes(order.taker_asset_amount))
    .bind(word_bytes(order.maker_fee))
    .bind(word_bytes(order.taker_fee))
    .bind(word_bytes(order.expiration_timestamp_seconds))
    .bind(word_bytes(order.salt))
    .bind(order.signature.to_vec())
    .bind(word_bytes(order.taker_asset_amount_filled))
    .bind(word_bytes(order.taker_asset_amount_cancelled))
    .bind(word_bytes(record.remaining.maker_asset))
    .bind(word_bytes(record.remaining.taker_asset))
    .bind(word_bytes(record.remaining.maker_fee))
    .bind(word_bytes(record.remaining.taker_fee))
    .bind(record.price)
    .bind(record.fee_rate)
    .bind(status)
    .execute(executor)
    .await?;

    // The conflict-update guard refuses rows whose canonical fields
    // diverge from what the key already holds.
    if result.rows_affected() == 0 {
        return Err(StoreError::HashMismatch);
    }
    Ok(())
}

/// Upsert an order under `(pool_id, order_hash)` with recomputed derived
/// fields.
#[derive(Debug, Clone)]
pub struct SaveOrder {
    pub order: Order,
    pub status: OrderStatus,
}

impl Processor<SaveOrder, Result<(), StoreError>> for DatabaseProcessor {
    #[tracing::instrument(skip_all, err, name = "SQL:SaveOrder")]
    async fn process(&self, cmd: SaveOrder) -> Result<(), StoreError> {
        save_on(&self.pool, &cmd.order, cmd.status).await
    }
}

impl DatabaseProcessor {
    /// Save and, once the write is durable, announce the canonical bytes.
    ///
    /// A publish failure is surfaced as a warning, never as a rollback:
    /// the row is already committed and downstream consumers re-derive
    /// state idempotently.
    pub async fn save_and_publish(
        &self,
        order: &Order,
        status: OrderStatus,
        publisher: Option<&dyn Publisher>,
    ) -> Result<(), StoreError> {
        self.process(SaveOrder {
            order: order.clone(),
            status,
        })
        .await?;
        if let Some(publisher) = publisher {
            if let Err(e) = publisher.publish(&order.to_bytes()) {
                tracing::warn!(
                    error = %e,
                    order_hash = %order.hash(),
                    "order saved but post-save publish failed"
                );
            }
        }
        Ok(())
    }
}

/// Fetch one order by its pool and content hash.
#[derive(Debug, Clone)]
pub struct GetOrderByHash {
    pub pool_id: B256,
    pub order_hash: B256,
}

impl Processor<GetOrderByHash, Result<Option<OrderRecord>, StoreError>> for DatabaseProcessor {
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderByHash")]
    async fn process(&self, query: GetOrderByHash) -> Result<Option<OrderRecord>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE pool_id = $1 AND order_hash = $2"
        ))
        .bind(query.pool_id.as_slice().to_vec())
        .bind(query.order_hash.as_slice().to_vec())
        .fetch_optional(&self.pool)
        .await?;
        row.map(OrderRecord::try_from).transpose()
    }
}
