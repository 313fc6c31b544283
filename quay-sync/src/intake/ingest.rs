//! Batch ingestion of stock-change events
//!
//! One call covers one inbound delivery (single event or batch). Events are
//! validated and collapsed per identity key in memory, then staged into the
//! ledger inside a single transaction — success means every valid event is
//! durably recorded as a new or merged `PENDING` row.

use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;

use shared::inventory::StockChangeEvent;
use shared::util::now_millis;

use crate::db;
use crate::db::inventory_requests::LOOKBACK_WINDOW_MS;
use crate::error::SyncResult;

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestSummary {
    /// Distinct identity keys staged (created or merged)
    pub merged: usize,
    /// Events dropped as validation faults (never retried)
    pub skipped: usize,
}

pub async fn ingest(
    pool: &SqlitePool,
    channel_type: &str,
    events: Vec<StockChangeEvent>,
) -> SyncResult<IngestSummary> {
    let mut summary = IngestSummary::default();
    if events.is_empty() {
        return Ok(summary);
    }

    // One bulk lookup of known channels per delivery
    let valid_channels: HashSet<String> =
        db::channels::list_uids(pool).await?.into_iter().collect();

    // Collapse per identity key, last write wins within this call
    let mut staged: Vec<StockChangeEvent> = Vec::new();
    let mut by_key: HashMap<(String, String, String), usize> = HashMap::new();

    for event in events {
        if event.channel_uid.is_empty() || !valid_channels.contains(&event.channel_uid) {
            tracing::info!(channel = %event.channel_uid, "Skipping event for unknown channel");
            summary.skipped += 1;
            continue;
        }
        if event.channel_type != channel_type {
            tracing::info!(
                channel_type = %event.channel_type,
                "Skipping event for foreign channel type"
            );
            summary.skipped += 1;
            continue;
        }
        if event.sku.is_empty() || event.product_id.is_empty() {
            tracing::warn!(channel = %event.channel_uid, "Skipping event with missing identity fields");
            summary.skipped += 1;
            continue;
        }

        match by_key.entry(event.identity_key()) {
            std::collections::hash_map::Entry::Occupied(entry) => {
                staged[*entry.get()] = event;
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(staged.len());
                staged.push(event);
            }
        }
    }

    if staged.is_empty() {
        return Ok(summary);
    }

    let now = now_millis();
    let window_cutoff = now - LOOKBACK_WINDOW_MS;

    // All creations and merges commit together; any failure rolls the whole
    // delivery back and the transport redelivers it
    let mut tx = pool.begin().await?;
    for event in &staged {
        let metadata = serde_json::Value::Object(event.merged_metadata()).to_string();
        db::inventory_requests::upsert_pending(
            &mut *tx,
            &event.channel_uid,
            &event.sku,
            &event.product_id,
            event.available_quantity,
            &metadata,
            now,
            window_cutoff,
        )
        .await?;
    }
    tx.commit().await?;

    summary.merged = staged.len();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shared::models::Channel;
    use shared::util::now_secs;

    use super::*;
    use crate::db::DbService;

    async fn seed_channel(pool: &SqlitePool, uid: &str) {
        let now = now_millis();
        db::channels::insert(
            pool,
            &Channel {
                channel_uid: uid.into(),
                name: "store".into(),
                shop_id: "7000".into(),
                access_token: "at".into(),
                refresh_token: "rt".into(),
                access_token_expiry: now_secs() + 3600,
                refresh_token_expiry: now_secs() + 86400,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();
    }

    fn event(channel: &str, sku: &str, product: &str, qty: i64) -> StockChangeEvent {
        let mut request_metadata = serde_json::Map::new();
        request_metadata.insert("sku_id".into(), json!(format!("S-{sku}")));
        request_metadata.insert("warehouse_id".into(), json!("W-1"));
        StockChangeEvent {
            channel_uid: channel.into(),
            channel_type: "marketplace".into(),
            sku: sku.into(),
            product_id: product.into(),
            available_quantity: qty,
            request_metadata,
            product_metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn merges_duplicate_keys_within_one_call() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, "C1").await;

        let summary = ingest(
            &db.pool,
            "marketplace",
            vec![event("C1", "A", "P1", 5), event("C1", "A", "P1", 8)],
        )
        .await
        .unwrap();

        assert_eq!(summary.merged, 1);
        let rows = db::inventory_requests::list_for_channel(&db.pool, "C1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        // Last write wins by arrival order inside the call
        assert_eq!(rows[0].quantity, 8);
        assert_eq!(rows[0].status, "PENDING");
    }

    #[tokio::test]
    async fn second_call_updates_in_place_instead_of_duplicating() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, "C1").await;

        ingest(&db.pool, "marketplace", vec![event("C1", "A", "P1", 5)])
            .await
            .unwrap();
        ingest(&db.pool, "marketplace", vec![event("C1", "A", "P1", 11)])
            .await
            .unwrap();

        let rows = db::inventory_requests::list_for_channel(&db.pool, "C1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 11);
    }

    #[tokio::test]
    async fn unknown_channel_leaves_ledger_unchanged_without_failing_batch() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, "C1").await;

        let summary = ingest(
            &db.pool,
            "marketplace",
            vec![event("ghost", "A", "P1", 5), event("C1", "B", "P1", 3)],
        )
        .await
        .unwrap();

        assert_eq!(summary.merged, 1);
        assert_eq!(summary.skipped, 1);
        let rows = db::inventory_requests::list_for_channel(&db.pool, "C1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku, "B");
        let ghost_rows = db::inventory_requests::list_for_channel(&db.pool, "ghost")
            .await
            .unwrap();
        assert!(ghost_rows.is_empty());
    }

    #[tokio::test]
    async fn foreign_channel_type_is_skipped() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, "C1").await;

        let mut foreign = event("C1", "A", "P1", 5);
        foreign.channel_type = "webstore".into();
        let summary = ingest(&db.pool, "marketplace", vec![foreign]).await.unwrap();

        assert_eq!(summary.merged, 0);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn missing_metadata_still_creates_a_row() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, "C1").await;

        let mut bare = event("C1", "A", "P1", 5);
        bare.request_metadata = serde_json::Map::new();
        ingest(&db.pool, "marketplace", vec![bare]).await.unwrap();

        let rows = db::inventory_requests::list_for_channel(&db.pool, "C1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].metadata().is_empty());
    }

    #[tokio::test]
    async fn product_metadata_merges_into_request_metadata() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, "C1").await;

        let mut e = event("C1", "A", "P1", 5);
        e.product_metadata
            .insert("warehouse_id".into(), json!("W-9"));
        ingest(&db.pool, "marketplace", vec![e]).await.unwrap();

        let rows = db::inventory_requests::list_for_channel(&db.pool, "C1")
            .await
            .unwrap();
        assert_eq!(rows[0].metadata()["warehouse_id"], json!("W-9"));
    }
}
