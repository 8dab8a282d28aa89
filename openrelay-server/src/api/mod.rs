//! HTTP API handlers.
//!
//! - [`ingest`] — `POST /v2/order`: the admission pipeline.
//! - [`orders`] — `GET /v2/order/{orderHash}`: per-hash lookup.
//! - [`pairs`] — `GET /v2/asset_pairs`: token-pair listings.
//!
//! Every route also exists under a `/{pool}` prefix; [`extractors`]
//! resolves the pool either way.

pub mod extractors;
pub mod ingest;
pub mod orders;
pub mod pairs;
