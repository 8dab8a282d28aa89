//! Application state shared across all request handlers.

use openrelay_core::channels::Publisher;
use openrelay_core::directories::{AccountService, AffiliateService, ExchangeLookup, TermsManager};
use openrelay_core::pool::PoolRegistry;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Application state that is shared across all request handlers.
///
/// Cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (query API and readiness probe).
    pub db: PgPool,
    /// Routing pools, resolved per request.
    pub pools: PoolRegistry,
    /// Maker standing lookups.
    pub accounts: Arc<dyn AccountService>,
    /// Fee-recipient authorization lookups.
    pub affiliates: Arc<dyn AffiliateService>,
    /// Terms-of-service acceptance lookups.
    pub terms: Arc<dyn TermsManager>,
    /// Exchange-registry lookups.
    pub exchanges: Arc<dyn ExchangeLookup>,
    /// Ingest-topic publisher for admitted orders.
    pub ingest: Arc<dyn Publisher>,
    /// Deadline applied to each outbound directory lookup.
    pub lookup_timeout: Duration,
}
