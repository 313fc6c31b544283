//! Service-layer error type
//!
//! `SyncError` bridges the ledger (`sqlx::Error`), the marketplace client
//! (`MarketplaceError`) and validation faults so worker code can propagate
//! with `?` instead of per-call `map_err` boilerplate.

use thiserror::Error;

use crate::marketplace::MarketplaceError;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Ledger read/write failed; the enclosing operation rolls back
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Outbound marketplace call failed (transport or decode)
    #[error("marketplace error: {0}")]
    Marketplace(#[from] MarketplaceError),

    /// Token refresh failed; the caller must not proceed with the stale
    /// credential
    #[error("credential refresh failed for channel {channel_uid}: {reason}")]
    CredentialRefresh { channel_uid: String, reason: String },

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// Transport-level malformation of an inbound delivery
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
