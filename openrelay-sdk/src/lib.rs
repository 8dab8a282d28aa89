#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

//! Wire formats and client for the OpenRelay order relay.
//!
//! * [`objects`] — the canonical [`objects::Order`] type, its JSON form,
//!   the public error envelope, and asset-pair listings.
//! * [`codec`] — the canonical binary encoding and the content hash.
//! * [`signature`] — packed-signature parsing and maker recovery.
//! * [`client`] — a `reqwest`-based API client (cargo feature `client`).

pub mod codec;
pub mod objects;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;
