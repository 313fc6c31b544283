//! Outbound marketplace adapter
//!
//! `MarketplaceApi` is the seam the credential store and the batcher call
//! through; `MarketplaceClient` is the HTTP implementation. Rejections
//! travel inside `SyncOutcome` (non-zero code); only transport and decode
//! failures are errors, so the two are distinguishable at the call site.

pub mod client;
pub mod sign;

pub use client::MarketplaceClient;
pub use sign::{HmacSha256Signer, RequestSigner};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::Channel;
use thiserror::Error;

/// One SKU/warehouse entry of a product batch update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuInventory {
    pub sku_id: String,
    pub quantity: i64,
    pub warehouse_id: String,
}

/// Structured outcome of a batch update call.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// 0 means accepted; anything else is a rejection
    pub code: i64,
    /// External tracking id, recorded on the ledger rows for audit
    pub request_id: Option<String>,
    /// Raw response body for logging
    pub raw: serde_json::Value,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Refreshed credential pair; lifetimes are offsets in seconds and are
/// converted to absolute expiries before persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub access_token_expire_in: i64,
    #[serde(default)]
    pub refresh_token_expire_in: i64,
}

#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// Timeout or connection-level failure; logged as a transport fault
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but could not be interpreted
    #[error("malformed response: {0}")]
    Decode(String),

    /// The API answered with a non-success code (token refresh only —
    /// stock updates report rejections through `SyncOutcome`)
    #[error("rejected by marketplace (code {code}): {message}")]
    Rejected { code: i64, message: String },
}

impl From<reqwest::Error> for MarketplaceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MarketplaceError::Transport(format!("timed out: {e}"))
        } else if e.is_decode() {
            MarketplaceError::Decode(e.to_string())
        } else {
            MarketplaceError::Transport(e.to_string())
        }
    }
}

impl MarketplaceError {
    pub fn is_transport(&self) -> bool {
        matches!(self, MarketplaceError::Transport(_))
    }
}

/// Marketplace operations the reconciliation pipeline consumes.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Exchange a refresh credential for a new access/refresh pair.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, MarketplaceError>;

    /// Push one product's SKU/warehouse quantities in a single call.
    async fn update_stock(
        &self,
        channel: &Channel,
        item_id: &str,
        skus: &[SkuInventory],
    ) -> Result<SyncOutcome, MarketplaceError>;
}
