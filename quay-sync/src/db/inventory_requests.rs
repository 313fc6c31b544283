//! Inventory request repository
//!
//! The ledger hot path: conditional upserts keyed on
//! `(channel_uid, sku, item_id)` during intake, window-filtered scans and
//! per-row status claims during reconciliation.

use shared::models::{InventoryRequest, RequestStatus};
use sqlx::{SqliteConnection, SqlitePool};

/// Pending rows older than this are no longer merged into; a new event for
/// the same key re-enters as fresh work instead of reviving stale state.
pub const LOOKBACK_WINDOW_MS: i64 = 2 * 24 * 60 * 60 * 1000;

/// Stage one stock-change as a `PENDING` row.
///
/// The partial unique index on `(channel_uid, sku, item_id) WHERE
/// status = 'PENDING'` makes this a merge: a concurrent or earlier pending
/// row for the same key absorbs the new quantity instead of duplicating.
/// When the absorbed row's `created_at` has fallen behind `window_cutoff`
/// it is reset, so the merged row counts as fresh work for the batcher.
pub async fn upsert_pending(
    conn: &mut SqliteConnection,
    channel_uid: &str,
    sku: &str,
    item_id: &str,
    quantity: i64,
    metadata_json: &str,
    now: i64,
    window_cutoff: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO inventory_requests (channel_uid, sku, item_id, quantity, status, request_metadata, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?6, ?6) \
         ON CONFLICT (channel_uid, sku, item_id) WHERE status = 'PENDING' DO UPDATE SET \
             quantity = excluded.quantity, \
             updated_at = excluded.updated_at, \
             created_at = CASE WHEN inventory_requests.created_at < ?7 \
                 THEN excluded.created_at ELSE inventory_requests.created_at END",
    )
    .bind(channel_uid)
    .bind(sku)
    .bind(item_id)
    .bind(quantity)
    .bind(metadata_json)
    .bind(now)
    .bind(window_cutoff)
    .execute(conn)
    .await?;
    Ok(())
}

/// Pending rows for one channel inside the lookback window, oldest first.
pub async fn list_pending_window(
    pool: &SqlitePool,
    channel_uid: &str,
    window_cutoff: i64,
) -> Result<Vec<InventoryRequest>, sqlx::Error> {
    sqlx::query_as::<_, InventoryRequest>(
        "SELECT id, channel_uid, sku, item_id, quantity, status, request_id, request_metadata, created_at, updated_at \
         FROM inventory_requests \
         WHERE channel_uid = ? AND status = 'PENDING' AND created_at >= ? \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(channel_uid)
    .bind(window_cutoff)
    .fetch_all(pool)
    .await
}

/// Claim a row for an in-flight batch: `PENDING` → `PROCESSING`.
///
/// Conditional on the row still being `PENDING`, so two overlapping
/// reconciliation runs cannot both own it. Returns whether the claim won.
pub async fn claim_processing(
    conn: &mut SqliteConnection,
    id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE inventory_requests SET status = 'PROCESSING', updated_at = ? \
         WHERE id = ? AND status = 'PENDING'",
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Record a batch outcome for one row. The external tracking id is kept
/// when none is supplied (pre-call failures have nothing to record).
pub async fn finish(
    conn: &mut SqliteConnection,
    id: i64,
    status: RequestStatus,
    request_id: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE inventory_requests SET status = ?1, request_id = COALESCE(?2, request_id), updated_at = ?3 WHERE id = ?4",
    )
    .bind(status.as_db())
    .bind(request_id)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<InventoryRequest>, sqlx::Error> {
    sqlx::query_as::<_, InventoryRequest>(
        "SELECT id, channel_uid, sku, item_id, quantity, status, request_id, request_metadata, created_at, updated_at \
         FROM inventory_requests WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Full ledger contents for one channel, insertion order. Audit/test path.
pub async fn list_for_channel(
    pool: &SqlitePool,
    channel_uid: &str,
) -> Result<Vec<InventoryRequest>, sqlx::Error> {
    sqlx::query_as::<_, InventoryRequest>(
        "SELECT id, channel_uid, sku, item_id, quantity, status, request_id, request_metadata, created_at, updated_at \
         FROM inventory_requests WHERE channel_uid = ? ORDER BY id ASC",
    )
    .bind(channel_uid)
    .fetch_all(pool)
    .await
}
