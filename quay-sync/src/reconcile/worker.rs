//! ReconcileWorker — scheduled inventory reconciliation
//!
//! On each tick, every known channel is reconciled independently: pending
//! ledger rows inside the lookback window are grouped by external product
//! and pushed to the marketplace one call per product. Statuses persist per
//! group so a crash mid-run leaves auditable state instead of silent loss.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use shared::models::{Channel, RequestStatus};
use shared::util::now_millis;

use crate::credentials;
use crate::db;
use crate::db::inventory_requests::LOOKBACK_WINDOW_MS;
use crate::error::SyncResult;
use crate::marketplace::MarketplaceApi;

use super::batch::{self, ProductGroup};

pub struct ReconcileWorker {
    pool: SqlitePool,
    api: Arc<dyn MarketplaceApi>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ReconcileWorker {
    pub fn new(
        pool: SqlitePool,
        api: Arc<dyn MarketplaceApi>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            api,
            interval,
            shutdown,
        }
    }

    /// Run the reconciliation loop. The first tick fires immediately so a
    /// restart drains any backlog without waiting a full interval.
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "ReconcileWorker started");

        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("ReconcileWorker shutting down");
                    break;
                }

                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }

        tracing::info!("ReconcileWorker stopped");
    }

    /// One full pass over all channels. A channel's failure never aborts
    /// the others.
    pub async fn run_once(&self) {
        let channels = match db::channels::list_all(&self.pool).await {
            Ok(channels) => channels,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list channels, skipping run");
                return;
            }
        };

        for channel in channels {
            if let Err(e) = self.reconcile_channel(&channel.channel_uid).await {
                tracing::error!(
                    channel = %channel.channel_uid,
                    error = %e,
                    "Channel reconciliation failed"
                );
            }
        }
    }

    /// Reconcile one channel: refresh credentials if needed, then push each
    /// product group.
    pub async fn reconcile_channel(&self, channel_uid: &str) -> SyncResult<()> {
        let channel =
            credentials::get_valid_channel(&self.pool, self.api.as_ref(), channel_uid).await?;

        let window_cutoff = now_millis() - LOOKBACK_WINDOW_MS;
        let pending =
            db::inventory_requests::list_pending_window(&self.pool, channel_uid, window_cutoff)
                .await?;

        if pending.is_empty() {
            tracing::debug!(channel = %channel_uid, "No pending inventory requests");
            return Ok(());
        }

        let groups = batch::group_by_item(pending);
        tracing::info!(
            channel = %channel_uid,
            groups = groups.len(),
            "Reconciling pending inventory"
        );

        for group in groups {
            // A failed group is logged and the run moves to the next one
            if let Err(e) = self.process_group(&channel, &group).await {
                tracing::error!(
                    channel = %channel_uid,
                    item_id = %group.item_id,
                    error = %e,
                    "Product group failed"
                );
            }
        }

        Ok(())
    }

    /// Push one product group. Claims rows, fails the ones the external API
    /// cannot accept, then records the outcome of the single batch call.
    async fn process_group(&self, channel: &Channel, group: &ProductGroup) -> SyncResult<()> {
        let now = now_millis();

        // Claim and pre-validate inside one transaction so a crash mid-run
        // leaves PROCESSING/FAILED rows, never silent loss
        let mut tx = self.pool.begin().await?;
        let mut claimed = Vec::new();
        for request in &group.requests {
            if db::inventory_requests::claim_processing(&mut *tx, request.id, now).await? {
                claimed.push(request.clone());
            }
        }

        let plan = batch::build_payload(&claimed);
        for id in &plan.invalid {
            db::inventory_requests::finish(&mut *tx, *id, RequestStatus::Failed, None, now).await?;
        }
        tx.commit().await?;

        if plan.skus.is_empty() {
            return Ok(());
        }

        tracing::info!(
            item_id = %group.item_id,
            skus = plan.skus.len(),
            "Sending product inventory update"
        );

        match self.api.update_stock(channel, &group.item_id, &plan.skus).await {
            Ok(outcome) if outcome.is_success() => {
                tracing::info!(
                    item_id = %group.item_id,
                    request_id = outcome.request_id.as_deref().unwrap_or(""),
                    "Batch update accepted"
                );
                self.finish_group(&plan.ready, RequestStatus::Success, outcome.request_id.as_deref())
                    .await?;
            }
            Ok(outcome) => {
                tracing::warn!(
                    item_id = %group.item_id,
                    code = outcome.code,
                    raw = %outcome.raw,
                    "Batch update rejected"
                );
                self.finish_group(&plan.ready, RequestStatus::Failed, outcome.request_id.as_deref())
                    .await?;
            }
            Err(e) => {
                // Transport faults and rejections both end FAILED, but are
                // logged differently
                tracing::error!(
                    item_id = %group.item_id,
                    transport = e.is_transport(),
                    error = %e,
                    "Batch update errored"
                );
                self.finish_group(&plan.ready, RequestStatus::Failed, None).await?;
            }
        }

        Ok(())
    }

    /// Persist one group's terminal statuses together.
    async fn finish_group(
        &self,
        ids: &[i64],
        status: RequestStatus,
        request_id: Option<&str>,
    ) -> SyncResult<()> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        for id in ids {
            db::inventory_requests::finish(&mut *tx, *id, status, request_id, now).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
