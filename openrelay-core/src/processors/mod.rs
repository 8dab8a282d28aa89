//! Pipeline consumers.
//!
//! - [`fill::FillConsumer`]: refreshes on-chain fill/cancel state for every
//!   ingested order and forks the stream into `all` and `change` topics.
//! - [`persistence::PersistenceConsumer`]: writes every `all`-topic
//!   observation through the order store.

pub mod fill;
pub mod persistence;

pub use fill::{FillConfig, FillConsumer, FillState, FilledLookup, LookupError, MockFilledLookup};
pub use persistence::{derive_status, PersistenceConsumer};
