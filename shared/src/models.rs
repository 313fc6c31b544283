//! Ledger domain models
//!
//! Row types for the `channels` and `inventory_requests` tables. Timestamps
//! are epoch milliseconds except credential expiries, which stay in epoch
//! seconds to match the upstream token API.

use serde::{Deserialize, Serialize};

/// A connected storefront on the marketplace side, holding its own
/// API credential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Channel {
    pub channel_uid: String,
    pub name: String,
    /// External shop identifier assigned by the marketplace
    pub shop_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch seconds; the credential is stale once `now > expiry`
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One unit of inventory reconciliation work.
///
/// Rows are retained indefinitely as an audit log; there is no deletion
/// path. Status transitions out of `PENDING` belong exclusively to the
/// reconciliation batcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryRequest {
    pub id: i64,
    pub channel_uid: String,
    pub sku: String,
    /// External product identifier — the batching unit for outbound sync
    pub item_id: String,
    pub quantity: i64,
    pub status: String,
    /// External tracking id, set after a sync attempt
    pub request_id: Option<String>,
    /// JSON object; must carry `sku_id` and `warehouse_id` for the
    /// outbound update payload
    pub request_metadata: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl InventoryRequest {
    /// Parsed request metadata; malformed JSON degrades to an empty map.
    pub fn metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::from_str(&self.request_metadata).unwrap_or_default()
    }

    pub fn status(&self) -> Option<RequestStatus> {
        RequestStatus::from_db(&self.status)
    }
}

/// Lifecycle state of an inventory request.
///
/// `InQueue`, `Done` and `Warning` are reserved for richer pipelines and
/// currently have no transitions into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Queued, not yet attempted
    Pending,
    /// Reserved
    InQueue,
    /// Claimed by a batch currently in flight
    Processing,
    /// Reserved
    Done,
    /// External API confirmed the update
    Success,
    /// External API rejected the update or the attempt errored
    Failed,
    /// Reserved
    Warning,
}

impl RequestStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "IN_QUEUE" => Some(Self::InQueue),
            "PROCESSING" => Some(Self::Processing),
            "DONE" => Some(Self::Done),
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            "WARNING" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InQueue => "IN_QUEUE",
            Self::Processing => "PROCESSING",
            Self::Done => "DONE",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}
