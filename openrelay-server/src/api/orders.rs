//! Per-hash order lookup.

use crate::api::extractors::ResolvedPool;
use crate::state::AppState;
use alloy_primitives::B256;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kanau::processor::Processor;
use openrelay_core::entities::order::GetOrderByHash;
use openrelay_core::entities::DatabaseProcessor;
use openrelay_sdk::objects::{
    codes, ErrorEnvelope, OrderMetadata, OrderWithMetadata, ValidationError,
};
use std::collections::HashMap;
use tracing::error;

/// `GET /v2/order/{orderHash}` — one order with its derived metadata.
pub async fn get_order(
    State(state): State<AppState>,
    ResolvedPool(pool): ResolvedPool,
    Path(params): Path<HashMap<String, String>>,
) -> Response {
    let raw_hash = params.get("orderHash").map(String::as_str).unwrap_or("");
    let Ok(order_hash) = raw_hash.parse::<B256>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorEnvelope::validation(vec![ValidationError::new(
                "orderHash",
                codes::INCORRECT_FORMAT,
                "Invalid order hash",
            )])),
        )
            .into_response();
    };

    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    match processor
        .process(GetOrderByHash {
            pool_id: pool.id,
            order_hash,
        })
        .await
    {
        Ok(Some(record)) => Json(OrderWithMetadata {
            meta_data: OrderMetadata {
                order_hash,
                status: record.status.into(),
                remaining_taker_asset_amount: record.remaining.taker_asset,
            },
            order: record.order,
        })
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorEnvelope::new(codes::GENERIC, "Order not found")),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, order_hash = %order_hash, "order lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorEnvelope::new(codes::GENERIC, "Error processing request")),
            )
                .into_response()
        }
    }
}
