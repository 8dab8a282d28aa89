//! The canonical order type and its public JSON form.
//!
//! An [`Order`] is a signed offer to exchange a maker-side asset for a
//! taker-side asset at fixed ratios and fees, valid until an expiration
//! timestamp. The JSON representation uses hex strings for addresses and
//! byte fields and decimal strings for 256-bit quantities, so the same
//! struct doubles as the API DTO.
//!
//! The binary (canonical) representation and the content hash live in
//! [`crate::codec`].

use alloy_primitives::{Address, Bytes, B256, KECCAK256_EMPTY, U256};
use serde::{Deserialize, Serialize};

/// Pool tag applied to orders that do not name one: the keccak-256 hash of
/// the empty string.
pub const DEFAULT_POOL_ID: B256 = KECCAK256_EMPTY;

/// A signed trading order as relayed between services.
///
/// The first fifteen fields (through `pool_id`) are the canonical order;
/// `taker_asset_amount_filled` and `taker_asset_amount_cancelled` are the
/// mutable tail refreshed from on-chain state by the fill reprocessor. The
/// content hash covers the canonical fields only, excluding the signature
/// and the pool tag, so one order keeps its identity across pools and
/// reprocessing passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub maker_address: Address,
    pub taker_address: Address,
    pub fee_recipient_address: Address,
    pub sender_address: Address,
    pub maker_asset_data: Bytes,
    pub taker_asset_data: Bytes,
    pub exchange_address: Address,
    #[serde(with = "u256_decimal")]
    pub maker_asset_amount: U256,
    #[serde(with = "u256_decimal")]
    pub taker_asset_amount: U256,
    #[serde(with = "u256_decimal")]
    pub maker_fee: U256,
    #[serde(with = "u256_decimal")]
    pub taker_fee: U256,
    #[serde(with = "u256_decimal")]
    pub expiration_timestamp_seconds: U256,
    #[serde(with = "u256_decimal")]
    pub salt: U256,
    pub signature: Bytes,
    /// Routing tag, stamped by the relay when zero. The default pool's
    /// tag is [`DEFAULT_POOL_ID`].
    #[serde(default)]
    pub pool_id: B256,
    #[serde(default, with = "u256_decimal")]
    pub taker_asset_amount_filled: U256,
    #[serde(default, with = "u256_decimal")]
    pub taker_asset_amount_cancelled: U256,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            maker_address: Address::ZERO,
            taker_address: Address::ZERO,
            fee_recipient_address: Address::ZERO,
            sender_address: Address::ZERO,
            maker_asset_data: Bytes::new(),
            taker_asset_data: Bytes::new(),
            exchange_address: Address::ZERO,
            maker_asset_amount: U256::ZERO,
            taker_asset_amount: U256::ZERO,
            maker_fee: U256::ZERO,
            taker_fee: U256::ZERO,
            expiration_timestamp_seconds: U256::ZERO,
            salt: U256::ZERO,
            signature: Bytes::new(),
            pool_id: B256::ZERO,
            taker_asset_amount_filled: U256::ZERO,
            taker_asset_amount_cancelled: U256::ZERO,
        }
    }
}

/// Order lifecycle status as exposed by the query API.
///
/// This is the API/DTO version. The persistence layer has its own
/// `sqlx::Type` enum; conversions exist in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
    Expired,
    Unfunded,
}

/// Derived state returned alongside an order by the query API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadata {
    pub order_hash: B256,
    pub status: OrderStatus,
    #[serde(with = "u256_decimal")]
    pub remaining_taker_asset_amount: U256,
}

/// An order with its derived metadata, as returned by `GET /v2/order/{hash}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithMetadata {
    pub order: Order,
    pub meta_data: OrderMetadata,
}

/// Serde adapter for 256-bit quantities as decimal strings.
///
/// The public JSON form carries amounts the way the on-chain world writes
/// them: base-10, no prefix, arbitrary width up to 2^256 - 1.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_str_radix(&raw, 10)
            .map_err(|_| de::Error::custom(format!("invalid decimal quantity: {raw:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes, keccak256};

    fn sample_order() -> Order {
        Order {
            maker_address: address!("627306090abab3a6e1400e9345bc60c78a8bef57"),
            fee_recipient_address: address!("1dad4783cf3fe3085c1426157ab175a6119a04ba"),
            sender_address: address!("05d090b51c40b020eab3bfcb6a2dff130df22e9c"),
            maker_asset_data: bytes!(
                "f47261b00000000000000000000000001dad4783cf3fe3085c1426157ab175a6119a04ba"
            ),
            taker_asset_data: bytes!(
                "f47261b000000000000000000000000005d090b51c40b020eab3bfcb6a2dff130df22e9c"
            ),
            exchange_address: address!("90fe2af704b34e0224bf2299c838e04d4dcf1364"),
            maker_asset_amount: U256::from(50_000_000_000_000_000_000u128),
            taker_asset_amount: U256::from(1_000_000_000_000_000_000u128),
            expiration_timestamp_seconds: U256::from(5_797_808_836u64),
            salt: U256::from(1234567890u64),
            signature: bytes!("1b00"),
            ..Order::default()
        }
    }

    #[test]
    fn default_pool_id_is_keccak_of_empty_string() {
        assert_eq!(DEFAULT_POOL_ID, keccak256([]));
    }

    #[test]
    fn json_round_trip() {
        let order = sample_order();
        let encoded = serde_json::to_vec(&order).unwrap();
        let decoded: Order = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, order);
    }

    #[test]
    fn json_uses_decimal_amounts_and_hex_addresses() {
        let json = serde_json::to_string(&sample_order()).unwrap();
        assert!(json.contains("\"makerAssetAmount\":\"50000000000000000000\""));
        assert!(json.contains("\"takerAssetAmount\":\"1000000000000000000\""));
        assert!(json.contains("\"makerAddress\":\"0x627306090abab3a6e1400e9345bc60c78a8bef57\""));
    }

    #[test]
    fn json_defaults_pool_and_mutable_tail() {
        let json = r#"{
            "makerAddress":"0x627306090abab3a6e1400e9345bc60c78a8bef57",
            "takerAddress":"0x0000000000000000000000000000000000000000",
            "feeRecipientAddress":"0x1dad4783cf3fe3085c1426157ab175a6119a04ba",
            "senderAddress":"0x05d090b51c40b020eab3bfcb6a2dff130df22e9c",
            "makerAssetData":"0xf47261b00000000000000000000000001dad4783cf3fe3085c1426157ab175a6119a04ba",
            "takerAssetData":"0xf47261b000000000000000000000000005d090b51c40b020eab3bfcb6a2dff130df22e9c",
            "exchangeAddress":"0x90fe2af704b34e0224bf2299c838e04d4dcf1364",
            "makerAssetAmount":"50000000000000000000",
            "takerAssetAmount":"1000000000000000000",
            "makerFee":"0",
            "takerFee":"0",
            "expirationTimestampSeconds":"5797808836",
            "salt":"1234567890",
            "signature":"0x1b00"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.pool_id, B256::ZERO);
        assert_eq!(order.taker_asset_amount_filled, U256::ZERO);
        assert_eq!(order.taker_asset_amount_cancelled, U256::ZERO);
    }

    #[test]
    fn rejects_hex_in_decimal_fields() {
        let mut json = serde_json::to_value(sample_order()).unwrap();
        json["makerAssetAmount"] = "0x2b5e3af16b1880000".into();
        assert!(serde_json::from_value::<Order>(json).is_err());
    }
}
