//! Token-pair queries.
//!
//! A pair is the unordered combination of two asset-data byte strings that
//! co-occur on at least one open order whose exchange is registered on the
//! queried network. Pairs are normalized so `token_a <= token_b` bytewise
//! and listed in `(token_a, token_b)` ascending order; filtered queries
//! re-orient results so the filter token comes first.

use super::{DatabaseProcessor, OrderStatus};
use alloy_primitives::Bytes;
use kanau::processor::Processor;
use openrelay_sdk::objects::AssetPair;

/// An unordered asset-data pair occurring on open orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub token_a: Bytes,
    pub token_b: Bytes,
}

impl Pair {
    /// The API listing form with the canonical policy defaults.
    pub fn to_asset_pair(&self) -> AssetPair {
        AssetPair::with_defaults(self.token_a.clone(), self.token_b.clone())
    }
}

#[derive(sqlx::FromRow)]
struct PairRow {
    token_a: Vec<u8>,
    token_b: Vec<u8>,
}

impl From<PairRow> for Pair {
    fn from(row: PairRow) -> Self {
        Self {
            token_a: Bytes::from(row.token_a),
            token_b: Bytes::from(row.token_b),
        }
    }
}

const PAIR_FROM: &str = "FROM orders o JOIN exchanges e ON e.address = o.exchange_address \
     WHERE o.status = $1 AND e.network = $2";

/// Every distinct pair on the network, `(token_a, token_b)` ascending.
#[derive(Debug, Clone)]
pub struct GetAllTokenPairs {
    pub network: i64,
    pub offset: i64,
    pub limit: i64,
}

impl Processor<GetAllTokenPairs, Result<(Vec<Pair>, i64), sqlx::Error>> for DatabaseProcessor {
    #[tracing::instrument(skip_all, err, name = "SQL:GetAllTokenPairs")]
    async fn process(&self, query: GetAllTokenPairs) -> Result<(Vec<Pair>, i64), sqlx::Error> {
        let rows = sqlx::query_as::<_, PairRow>(&format!(
            "SELECT DISTINCT LEAST(o.maker_asset_data, o.taker_asset_data) AS token_a, \
             GREATEST(o.maker_asset_data, o.taker_asset_data) AS token_b \
             {PAIR_FROM} ORDER BY token_a, token_b LIMIT $3 OFFSET $4"
        ))
        .bind(OrderStatus::Open)
        .bind(query.network)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(DISTINCT (LEAST(o.maker_asset_data, o.taker_asset_data), \
             GREATEST(o.maker_asset_data, o.taker_asset_data))) {PAIR_FROM}"
        ))
        .bind(OrderStatus::Open)
        .bind(query.network)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Pair::from).collect(), total))
    }
}

/// Pairs with one side equal to `token_a`, oriented so that side comes
/// first.
///
/// An empty filter returns nothing: this is a distinct API from the
/// unfiltered listing, and an empty token must not degenerate into a full
/// scan.
#[derive(Debug, Clone)]
pub struct GetTokenAPairs {
    pub network: i64,
    pub token_a: Bytes,
    pub offset: i64,
    pub limit: i64,
}

impl Processor<GetTokenAPairs, Result<(Vec<Pair>, i64), sqlx::Error>> for DatabaseProcessor {
    #[tracing::instrument(skip_all, err, name = "SQL:GetTokenAPairs")]
    async fn process(&self, query: GetTokenAPairs) -> Result<(Vec<Pair>, i64), sqlx::Error> {
        if query.token_a.is_empty() {
            return Ok((Vec::new(), 0));
        }
        let token = query.token_a.to_vec();

        let rows = sqlx::query_as::<_, PairRow>(&format!(
            "SELECT DISTINCT LEAST(o.maker_asset_data, o.taker_asset_data) AS token_a, \
             GREATEST(o.maker_asset_data, o.taker_asset_data) AS token_b \
             {PAIR_FROM} AND (o.maker_asset_data = $3 OR o.taker_asset_data = $3) \
             ORDER BY token_a, token_b LIMIT $4 OFFSET $5"
        ))
        .bind(OrderStatus::Open)
        .bind(query.network)
        .bind(token.clone())
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(DISTINCT (LEAST(o.maker_asset_data, o.taker_asset_data), \
             GREATEST(o.maker_asset_data, o.taker_asset_data))) \
             {PAIR_FROM} AND (o.maker_asset_data = $3 OR o.taker_asset_data = $3)"
        ))
        .bind(OrderStatus::Open)
        .bind(query.network)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        let pairs = rows
            .into_iter()
            .map(Pair::from)
            .map(|pair| orient(pair, &query.token_a))
            .collect();
        Ok((pairs, total))
    }
}

/// The single pair combining `token_a` and `token_b`, if any open order
/// trades it, oriented as requested.
#[derive(Debug, Clone)]
pub struct GetTokenABPairs {
    pub network: i64,
    pub token_a: Bytes,
    pub token_b: Bytes,
}

impl Processor<GetTokenABPairs, Result<(Vec<Pair>, i64), sqlx::Error>> for DatabaseProcessor {
    #[tracing::instrument(skip_all, err, name = "SQL:GetTokenABPairs")]
    async fn process(&self, query: GetTokenABPairs) -> Result<(Vec<Pair>, i64), sqlx::Error> {
        if query.token_a.is_empty() || query.token_b.is_empty() {
            return Ok((Vec::new(), 0));
        }
        let row = sqlx::query_as::<_, PairRow>(&format!(
            "SELECT DISTINCT LEAST(o.maker_asset_data, o.taker_asset_data) AS token_a, \
             GREATEST(o.maker_asset_data, o.taker_asset_data) AS token_b \
             {PAIR_FROM} AND ((o.maker_asset_data = $3 AND o.taker_asset_data = $4) \
             OR (o.maker_asset_data = $4 AND o.taker_asset_data = $3)) LIMIT 1"
        ))
        .bind(OrderStatus::Open)
        .bind(query.network)
        .bind(query.token_a.to_vec())
        .bind(query.token_b.to_vec())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let pair = orient(Pair::from(row), &query.token_a);
                Ok((vec![pair], 1))
            }
            None => Ok((Vec::new(), 0)),
        }
    }
}

fn orient(pair: Pair, token_a: &Bytes) -> Pair {
    if &pair.token_a == token_a {
        pair
    } else {
        Pair {
            token_a: pair.token_b,
            token_b: pair.token_a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::bytes;

    #[test]
    fn orient_puts_the_filter_token_first() {
        let pair = Pair {
            token_a: bytes!("01"),
            token_b: bytes!("02"),
        };
        let reoriented = orient(pair.clone(), &bytes!("02"));
        assert_eq!(reoriented.token_a, bytes!("02"));
        assert_eq!(reoriented.token_b, bytes!("01"));
        assert_eq!(orient(pair.clone(), &bytes!("01")), pair);
    }

    #[test]
    fn listing_form_carries_the_policy_defaults() {
        let pair = Pair {
            token_a: bytes!("01"),
            token_b: bytes!("02"),
        };
        let listed = pair.to_asset_pair();
        assert_eq!(listed.asset_data_a.asset_data, bytes!("01"));
        assert_eq!(listed.asset_data_a.precision, 5);
    }
}
