//! Token-pair listing objects.
//!
//! A pair is the unordered combination of two asset-data byte strings that
//! co-occur on at least one open order. Each side carries trading-policy
//! bounds; the defaults are the protocol-wide ones and may be overridden
//! per pool.

use super::order::u256_decimal;
use alloy_primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

/// Default number of decimal digits of price precision for a listed asset.
pub const DEFAULT_PRECISION: u32 = 5;

/// One side of a tradable asset pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDataEntry {
    pub asset_data: Bytes,
    #[serde(with = "u256_decimal")]
    pub min_amount: U256,
    #[serde(with = "u256_decimal")]
    pub max_amount: U256,
    pub precision: u32,
}

impl AssetDataEntry {
    /// An entry with the canonical policy defaults: min 1, max 2^256 - 1,
    /// precision 5.
    pub fn with_defaults(asset_data: Bytes) -> Self {
        Self {
            asset_data,
            min_amount: U256::from(1u64),
            max_amount: U256::MAX,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// A tradable asset pair as returned by `GET /v2/asset_pairs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    #[serde(rename = "assetDataA")]
    pub asset_data_a: AssetDataEntry,
    #[serde(rename = "assetDataB")]
    pub asset_data_b: AssetDataEntry,
}

impl AssetPair {
    pub fn with_defaults(token_a: Bytes, token_b: Bytes) -> Self {
        Self {
            asset_data_a: AssetDataEntry::with_defaults(token_a),
            asset_data_b: AssetDataEntry::with_defaults(token_b),
        }
    }
}

/// A page of asset pairs plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedAssetPairs {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub records: Vec<AssetPair>,
}
