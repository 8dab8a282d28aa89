//! Custom Axum extractors.
//!
//! [`ResolvedPool`] is the pool-resolver decorator: it reads the optional
//! `{pool}` path segment, resolves the pool from the shared registry
//! fresh on every request (so config reloads take effect immediately),
//! and hands the pool to the wrapped handler. Unknown pools are rejected
//! with 404 and the standard error envelope.

use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt,
};
use openrelay_core::pool::{Pool, DEFAULT_POOL_NAME};
use openrelay_sdk::objects::{codes, ErrorEnvelope};
use std::collections::HashMap;

/// The pool a request routes through.
pub struct ResolvedPool(pub Pool);

/// Rejection for requests naming a pool the registry does not know.
#[derive(Debug)]
pub struct UnknownPool;

impl IntoResponse for UnknownPool {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorEnvelope::new(codes::GENERIC, "Pool not found")),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for ResolvedPool {
    type Rejection = UnknownPool;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let params = parts
            .extract::<Path<HashMap<String, String>>>()
            .await
            .map(|Path(params)| params)
            .unwrap_or_default();
        let name = params
            .get("pool")
            .map(String::as_str)
            .unwrap_or(DEFAULT_POOL_NAME);
        match state.pools.resolve(name).await {
            Some(pool) => Ok(ResolvedPool(pool)),
            None => Err(UnknownPool),
        }
    }
}
