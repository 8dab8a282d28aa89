//! Token-pair listings.

use crate::api::extractors::ResolvedPool;
use crate::state::AppState;
use alloy_primitives::Bytes;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kanau::processor::Processor;
use openrelay_core::entities::pair::{GetAllTokenPairs, GetTokenAPairs, GetTokenABPairs, Pair};
use openrelay_core::entities::DatabaseProcessor;
use openrelay_sdk::objects::{codes, ErrorEnvelope, PagedAssetPairs};
use serde::Deserialize;
use tracing::error;

const MAX_PER_PAGE: i64 = 1000;

/// Filters for the pair listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetPairsQuery {
    pub asset_data_a: Option<Bytes>,
    pub asset_data_b: Option<Bytes>,
    pub network_id: i64,
    pub page: i64,
    pub per_page: i64,
}

impl Default for AssetPairsQuery {
    fn default() -> Self {
        Self {
            asset_data_a: None,
            asset_data_b: None,
            network_id: 1,
            page: 1,
            per_page: 100,
        }
    }
}

/// `GET /v2/asset_pairs` — distinct pairs on open orders.
///
/// With both filters set this is a point lookup; with one, pairs are
/// oriented so the filter token comes first; with none, the full listing.
pub async fn get_asset_pairs(
    State(state): State<AppState>,
    ResolvedPool(_pool): ResolvedPool,
    Query(query): Query<AssetPairsQuery>,
) -> Response {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
    let offset = (page - 1) * per_page;

    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let result: Result<(Vec<Pair>, i64), sqlx::Error> =
        match (query.asset_data_a, query.asset_data_b) {
            (Some(token_a), Some(token_b)) => {
                processor
                    .process(GetTokenABPairs {
                        network: query.network_id,
                        token_a,
                        token_b,
                    })
                    .await
            }
            (Some(token_a), None) | (None, Some(token_a)) => {
                processor
                    .process(GetTokenAPairs {
                        network: query.network_id,
                        token_a,
                        offset,
                        limit: per_page,
                    })
                    .await
            }
            (None, None) => {
                processor
                    .process(GetAllTokenPairs {
                        network: query.network_id,
                        offset,
                        limit: per_page,
                    })
                    .await
            }
        };

    match result {
        Ok((pairs, total)) => Json(PagedAssetPairs {
            total,
            page,
            per_page,
            records: pairs.iter().map(Pair::to_asset_pair).collect(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, network = query.network_id, "pair listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorEnvelope::new(codes::GENERIC, "Error processing request")),
            )
                .into_response()
        }
    }
}
