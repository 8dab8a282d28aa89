//! HTTP client for the relay API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

use crate::objects::{ErrorEnvelope, Order, OrderWithMetadata, PagedAssetPairs};
use alloy_primitives::{Bytes, B256};
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde::Serialize;
use url::Url;

/// Errors produced by the relay client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay rejected the request with a structured error envelope.
    #[error("relay rejected request: status {status}, code {}, reason {}", envelope.code, envelope.reason)]
    Rejected {
        status: StatusCode,
        envelope: ErrorEnvelope,
    },

    /// The server returned a non-2xx status without a parseable envelope.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// The order could not be serialized.
    #[error("codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Filters for `GET /v2/asset_pairs`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPairsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_data_a: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_data_b: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

/// Client for submitting orders to and querying a relay.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RelayClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Submit an order in canonical binary form.
    pub async fn submit_order(&self, order: &Order) -> Result<(), ClientError> {
        let url = self.base_url.join("v2/order")?;
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(order.to_bytes().to_vec())
            .send()
            .await?;
        Self::expect_accepted(response).await
    }

    /// Submit an order in the public JSON form.
    pub async fn submit_order_json(&self, order: &Order) -> Result<(), ClientError> {
        let url = self.base_url.join("v2/order")?;
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(order.to_json()?)
            .send()
            .await?;
        Self::expect_accepted(response).await
    }

    /// Fetch a single order with its derived metadata.
    pub async fn order_by_hash(&self, hash: B256) -> Result<OrderWithMetadata, ClientError> {
        let url = self.base_url.join(&format!("v2/order/{hash}"))?;
        let response = self.http.get(url).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::rejection(response).await)
        }
    }

    /// List tradable asset pairs.
    pub async fn asset_pairs(
        &self,
        query: &AssetPairsQuery,
    ) -> Result<PagedAssetPairs, ClientError> {
        let url = self.base_url.join("v2/asset_pairs")?;
        let response = self.http.get(url).query(query).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn expect_accepted(response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn rejection(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ClientError::Rejected { status, envelope },
            Err(_) => ClientError::Api { status, body },
        }
    }
}
