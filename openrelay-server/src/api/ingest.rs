//! The ingest endpoint.
//!
//! `POST /v2/order` (optionally pool-scoped as `POST /{pool}/v2/order`)
//! accepts a signed order as canonical binary (`application/octet-stream`)
//! or public JSON (`application/json`), runs the admission pipeline, and
//! publishes accepted orders to the ingest topic:
//!
//! 1. read body, 2. decode, 3. exchange registry, 4. signature,
//! 5. terms of service, 6. fee recipient, 7. fee floor, 8. blacklist,
//! 9. publish.
//!
//! A single request publishes at most one message; a 202 means the order
//! was published or silently dropped. Every error response is an
//! `application/json` envelope.

use crate::api::extractors::ResolvedPool;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use alloy_primitives::B256;
use openrelay_core::channels::PublishError;
use openrelay_sdk::objects::{codes, ErrorEnvelope, Order, ValidationError};
use openrelay_sdk::signature::recover_signer;
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Largest accepted request body. Canonical orders are a few hundred
/// bytes; anything near this bound is garbage.
const MAX_BODY_BYTES: usize = 1024 * 1024;

enum BodyFormat {
    Binary,
    Json,
}

fn reject(status: StatusCode, envelope: ErrorEnvelope) -> Response {
    (status, Json(envelope)).into_response()
}

fn reject_fields(status: StatusCode, errors: Vec<ValidationError>) -> Response {
    reject(status, ErrorEnvelope::validation(errors))
}

fn lookup_failed(what: &str) -> Response {
    warn!(lookup = what, "directory lookup timed out");
    reject(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorEnvelope::new(codes::GENERIC, "Error processing order"),
    )
}

/// `POST /v2/order` — validate and admit one order.
pub async fn submit_order(
    State(state): State<AppState>,
    ResolvedPool(pool): ResolvedPool,
    request: Request,
) -> Response {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let format = match content_type.as_str() {
        "application/octet-stream" => BodyFormat::Binary,
        "application/json" => BodyFormat::Json,
        _ => {
            return reject(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorEnvelope::new(codes::GENERIC, "Unsupported content-type"),
            )
        }
    };

    let body = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "failed to read order body");
            return reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorEnvelope::new(codes::GENERIC, "Error reading content"),
            );
        }
    };

    let mut order = match format {
        BodyFormat::Binary => match Order::from_bytes(&body) {
            Ok(order) => order,
            Err(e) => {
                debug!(error = %e, "undecodable binary order");
                return reject_fields(
                    StatusCode::BAD_REQUEST,
                    vec![ValidationError::new(
                        "order",
                        codes::INCORRECT_FORMAT,
                        "Order is not properly formatted",
                    )],
                );
            }
        },
        BodyFormat::Json => match Order::from_json(&body) {
            Ok(order) => order,
            Err(e) => {
                debug!(error = %e, "undecodable JSON order");
                return reject(
                    StatusCode::BAD_REQUEST,
                    ErrorEnvelope::new(codes::MALFORMED_JSON, "Malformed JSON"),
                );
            }
        },
    };

    // Exchange registry. Network 0 means no network recognizes the
    // exchange contract.
    let network = match timeout(
        state.lookup_timeout,
        state.exchanges.exchange_is_known(&order.exchange_address),
    )
    .await
    {
        Ok(network) => network,
        Err(_) => return lookup_failed("exchange registry"),
    };
    if network == 0 {
        return reject_fields(
            StatusCode::BAD_REQUEST,
            vec![ValidationError::new(
                "exchangeContractAddress",
                codes::INVALID_REFERENCE,
                "Unknown exchangeContractAddress",
            )],
        );
    }

    // Signature: the recovered signer must be the maker.
    let signer_is_maker = recover_signer(&order)
        .map(|signer| signer == order.maker_address)
        .unwrap_or(false);
    if !signer_is_maker {
        return reject_fields(
            StatusCode::BAD_REQUEST,
            vec![ValidationError::new(
                "signature",
                codes::SIGNATURE,
                "Signature validation failed",
            )],
        );
    }

    // Terms of service.
    match timeout(
        state.lookup_timeout,
        state.terms.check_address(&order.maker_address),
    )
    .await
    {
        Ok(true) => {}
        Ok(false) => {
            return reject_fields(
                StatusCode::UNAUTHORIZED,
                vec![ValidationError::new(
                    "makerAddress",
                    codes::INVALID_REFERENCE,
                    "makerAddress must sign terms of service",
                )],
            )
        }
        Err(_) => return lookup_failed("terms manager"),
    }

    // Fee recipient must be an authorized affiliate.
    let affiliate = match timeout(
        state.lookup_timeout,
        state.affiliates.get(&order.fee_recipient_address),
    )
    .await
    {
        Ok(Ok(affiliate)) => affiliate,
        Ok(Err(_)) => {
            return reject_fields(
                StatusCode::PAYMENT_REQUIRED,
                vec![ValidationError::new(
                    "feeRecipient",
                    codes::INVALID_REFERENCE,
                    "Invalid fee recipient",
                )],
            )
        }
        Err(_) => return lookup_failed("affiliate directory"),
    };

    let account = state.accounts.get(&order.maker_address).await;

    // Fee floor: the stricter of the affiliate's demand and the pool's
    // base fee, less the maker's discount. Both sides are checked and
    // violations are collected, not short-circuited.
    let required = affiliate
        .fee
        .max(pool.base_fee(network).await)
        .saturating_sub(account.discount);
    let mut fee_errors = Vec::new();
    if order.maker_fee < required {
        fee_errors.push(ValidationError::new(
            "makerFee",
            codes::OUT_OF_RANGE,
            format!("Total fee must be at least: {required}"),
        ));
    }
    if order.taker_fee < required {
        fee_errors.push(ValidationError::new(
            "takerFee",
            codes::OUT_OF_RANGE,
            format!("Total fee must be at least: {required}"),
        ));
    }
    if !fee_errors.is_empty() {
        return reject_fields(StatusCode::PAYMENT_REQUIRED, fee_errors);
    }

    // Blacklisted makers get the same observable success as honest ones:
    // acknowledge and drop, so the response leaks nothing.
    if account.blacklisted {
        debug!(maker = %order.maker_address, "silently dropping blacklisted maker's order");
        return StatusCode::ACCEPTED.into_response();
    }

    if order.pool_id == B256::ZERO {
        order.pool_id = pool.id;
    }

    match state.ingest.publish(&order.to_bytes()) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(PublishError::Full) => reject(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorEnvelope::new(codes::GENERIC, "Backpressure"),
        ),
        Err(e) => {
            error!(error = %e, order_hash = %order.hash(), "ingest publish failed");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorEnvelope::new(codes::GENERIC, "Error processing order"),
            )
        }
    }
}
