//! Order-store integration tests.
//!
//! These need a live Postgres and are ignored by default. Point
//! `POSTGRES_HOST`, `POSTGRES_USER`, and `POSTGRES_PASSWORD` at a
//! disposable database and run with `cargo test -- --ignored`.

use alloy_primitives::{address, bytes, B256, U256};
use kanau::processor::Processor;
use openrelay_core::channels::{mock_publisher, Publisher};
use openrelay_core::entities::exchange::EnsureExchange;
use openrelay_core::entities::order::{GetOrderByHash, SaveOrder, StoreError};
use openrelay_core::entities::pair::{GetAllTokenPairs, GetTokenAPairs, GetTokenABPairs};
use openrelay_core::entities::{DatabaseProcessor, OrderStatus};
use openrelay_sdk::objects::Order;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn test_processor() -> DatabaseProcessor {
    let host = std::env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_owned());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_owned());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    let url = format!("postgres://{user}:{password}@{host}");

    let pool: PgPool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("test database must be reachable");
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("migrations must apply");
    sqlx::query("TRUNCATE orders, exchanges")
        .execute(&pool)
        .await
        .expect("tables must truncate");
    DatabaseProcessor { pool }
}

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
        salt: U256::from(1_759_938_172_362u64),
        signature: bytes!(
            "1bebab93c67e7cdf45e50c83b3a47681918c3f47f220935eb92b7338788024c82a329105e2259b128ec811b69eb9eee253027089d544c37a1cc33b433ab9b8e03a02"
        ),
        ..Order::default()
    }
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn save_publishes_and_round_trips() {
    let processor = test_processor().await;
    let order = sample_order();

    let (publisher, _rx) = mock_publisher();
    processor
        .save_and_publish(&order, OrderStatus::Open, Some(publisher.as_ref() as &dyn Publisher))
        .await
        .unwrap();
    assert_eq!(publisher.messages(), vec![order.to_bytes().to_vec()]);

    let record = processor
        .process(GetOrderByHash {
            pool_id: order.pool_id,
            order_hash: order.hash(),
        })
        .await
        .unwrap()
        .expect("saved order must be queryable");

    assert_eq!(record.order.to_bytes(), order.to_bytes());
    assert_eq!(record.status, OrderStatus::Open);
    assert_eq!(record.price, 0.02);
    assert_eq!(record.fee_rate, 0.0);
    assert_eq!(record.remaining.maker_asset, order.maker_asset_amount);
    assert_eq!(record.remaining.maker_fee, order.maker_fee);
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn saving_twice_keeps_one_row() {
    let processor = test_processor().await;
    let order = sample_order();

    for _ in 0..2 {
        processor
            .process(SaveOrder {
                order: order.clone(),
                status: OrderStatus::Open,
            })
            .await
            .unwrap();
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE order_hash = $1")
        .bind(order.hash().as_slice().to_vec())
        .fetch_one(&processor.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn empty_orders_are_refused() {
    let processor = test_processor().await;
    let result = processor
        .process(SaveOrder {
            order: Order::default(),
            status: OrderStatus::Open,
        })
        .await;
    assert!(matches!(result, Err(StoreError::EmptyOrder)));
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn diverging_canonical_fields_are_refused() {
    let processor = test_processor().await;
    let order = sample_order();
    processor
        .process(SaveOrder {
            order: order.clone(),
            status: OrderStatus::Open,
        })
        .await
        .unwrap();

    // Same key, different canonical content: forge the stored row's salt.
    sqlx::query("UPDATE orders SET salt = $1 WHERE order_hash = $2")
        .bind(vec![0xffu8; 32])
        .bind(order.hash().as_slice().to_vec())
        .execute(&processor.pool)
        .await
        .unwrap();

    let result = processor
        .process(SaveOrder {
            order,
            status: OrderStatus::Open,
        })
        .await;
    assert!(matches!(result, Err(StoreError::HashMismatch)));
}

async fn seed_pair_fixture(processor: &DatabaseProcessor) -> Order {
    let order = sample_order();
    processor
        .process(EnsureExchange {
            network: 1,
            address: order.exchange_address,
        })
        .await
        .unwrap();
    processor
        .process(SaveOrder {
            order: order.clone(),
            status: OrderStatus::Open,
        })
        .await
        .unwrap();
    order
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn open_orders_list_their_pair() {
    let processor = test_processor().await;
    let order = seed_pair_fixture(&processor).await;

    let (pairs, total) = processor
        .process(GetAllTokenPairs {
            network: 1,
            offset: 0,
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(pairs.len(), 1);
    // Normalized ascending: the taker asset data sorts below the maker's.
    assert_eq!(pairs[0].token_a, order.taker_asset_data);
    assert_eq!(pairs[0].token_b, order.maker_asset_data);
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn unregistered_networks_list_nothing() {
    let processor = test_processor().await;
    seed_pair_fixture(&processor).await;

    let (pairs, total) = processor
        .process(GetAllTokenPairs {
            network: 42,
            offset: 0,
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!((pairs.len(), total), (0, 0));
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn token_filter_orients_results() {
    let processor = test_processor().await;
    let order = seed_pair_fixture(&processor).await;

    let (pairs, total) = processor
        .process(GetTokenAPairs {
            network: 1,
            token_a: order.taker_asset_data.clone(),
            offset: 0,
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(pairs[0].token_a, order.taker_asset_data);
    assert_eq!(pairs[0].token_b, order.maker_asset_data);

    // The same pair from the other side comes back re-oriented.
    let (pairs, _) = processor
        .process(GetTokenAPairs {
            network: 1,
            token_a: order.maker_asset_data.clone(),
            offset: 0,
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!(pairs[0].token_a, order.maker_asset_data);
    assert_eq!(pairs[0].token_b, order.taker_asset_data);
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn empty_token_filter_is_not_a_wildcard() {
    let processor = test_processor().await;
    seed_pair_fixture(&processor).await;

    let (pairs, total) = processor
        .process(GetTokenAPairs {
            network: 1,
            token_a: alloy_primitives::Bytes::new(),
            offset: 0,
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!((pairs.len(), total), (0, 0));
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn pair_lookup_is_orientation_insensitive() {
    let processor = test_processor().await;
    let order = seed_pair_fixture(&processor).await;

    let (forward, _) = processor
        .process(GetTokenABPairs {
            network: 1,
            token_a: order.taker_asset_data.clone(),
            token_b: order.maker_asset_data.clone(),
        })
        .await
        .unwrap();
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].token_a, order.taker_asset_data);

    let (backward, _) = processor
        .process(GetTokenABPairs {
            network: 1,
            token_a: order.maker_asset_data.clone(),
            token_b: order.taker_asset_data.clone(),
        })
        .await
        .unwrap();
    assert_eq!(backward.len(), 1);
    assert_eq!(backward[0].token_a, order.maker_asset_data);
    assert_eq!(backward[0].token_b, forward[0].token_a);
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn non_open_orders_do_not_list_pairs() {
    let processor = test_processor().await;
    let order = seed_pair_fixture(&processor).await;
    processor
        .process(SaveOrder {
            order,
            status: OrderStatus::Cancelled,
        })
        .await
        .unwrap();

    let (pairs, total) = processor
        .process(GetAllTokenPairs {
            network: 1,
            offset: 0,
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!((pairs.len(), total), (0, 0));
}

#[tokio::test]
#[ignore = "requires a live Postgres"]
async fn pool_scoping_keys_the_store() {
    let processor = test_processor().await;
    let order = sample_order();
    processor
        .process(SaveOrder {
            order: order.clone(),
            status: OrderStatus::Open,
        })
        .await
        .unwrap();

    let missing = processor
        .process(GetOrderByHash {
            pool_id: B256::repeat_byte(0x77),
            order_hash: order.hash(),
        })
        .await
        .unwrap();
    assert!(missing.is_none());
}
