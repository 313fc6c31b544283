//! Credential store
//!
//! Per-channel access/refresh credential pair with refresh-on-expiry.
//! Both intake-side callers and the batcher go through `get_valid_channel`
//! before touching the marketplace; the call is a blocking round trip with
//! no caching beyond the persisted expiry.

use sqlx::SqlitePool;

use shared::models::Channel;
use shared::util::now_secs;

use crate::db;
use crate::error::{SyncError, SyncResult};
use crate::marketplace::MarketplaceApi;

/// Load a channel, refreshing its access credential if expired.
///
/// At most one refresh round trip per call, and none when the stored
/// credential is still live. On refresh failure the stale credential is
/// never returned — the caller must skip its work for this run.
pub async fn get_valid_channel(
    pool: &SqlitePool,
    api: &dyn MarketplaceApi,
    channel_uid: &str,
) -> SyncResult<Channel> {
    let channel = db::channels::find(pool, channel_uid)
        .await?
        .ok_or_else(|| SyncError::ChannelNotFound(channel_uid.to_string()))?;

    let now = now_secs();
    if now <= channel.access_token_expiry {
        return Ok(channel);
    }

    tracing::info!(channel = %channel_uid, "Access credential expired, refreshing");

    let grant = api
        .refresh_token(&channel.refresh_token)
        .await
        .map_err(|e| SyncError::CredentialRefresh {
            channel_uid: channel_uid.to_string(),
            reason: e.to_string(),
        })?;

    // Offsets in seconds → absolute epoch expiries
    let access_token_expiry = now + grant.access_token_expire_in;
    let refresh_token_expiry = now + grant.refresh_token_expire_in;

    db::channels::update_tokens(
        pool,
        channel_uid,
        &grant.access_token,
        &grant.refresh_token,
        access_token_expiry,
        refresh_token_expiry,
    )
    .await?;

    Ok(Channel {
        access_token: grant.access_token,
        refresh_token: grant.refresh_token,
        access_token_expiry,
        refresh_token_expiry,
        ..channel
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use shared::util::now_millis;

    use super::*;
    use crate::db::DbService;
    use crate::marketplace::{MarketplaceError, SkuInventory, SyncOutcome, TokenGrant};

    struct CountingApi {
        refresh_calls: AtomicUsize,
        fail_refresh: bool,
    }

    impl CountingApi {
        fn new(fail_refresh: bool) -> Self {
            Self {
                refresh_calls: AtomicUsize::new(0),
                fail_refresh,
            }
        }
    }

    #[async_trait]
    impl MarketplaceApi for CountingApi {
        async fn refresh_token(&self, _refresh_token: &str) -> Result<TokenGrant, MarketplaceError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh {
                return Err(MarketplaceError::Rejected {
                    code: 105,
                    message: "invalid refresh token".into(),
                });
            }
            Ok(TokenGrant {
                access_token: "new-access".into(),
                refresh_token: "new-refresh".into(),
                access_token_expire_in: 3600,
                refresh_token_expire_in: 86400,
            })
        }

        async fn update_stock(
            &self,
            _channel: &Channel,
            _item_id: &str,
            _skus: &[SkuInventory],
        ) -> Result<SyncOutcome, MarketplaceError> {
            unreachable!("credential tests never sync stock")
        }
    }

    async fn seed_channel(pool: &SqlitePool, access_token_expiry: i64) {
        let now = now_millis();
        db::channels::insert(
            pool,
            &Channel {
                channel_uid: "C1".into(),
                name: "store".into(),
                shop_id: "7000".into(),
                access_token: "old-access".into(),
                refresh_token: "old-refresh".into(),
                access_token_expiry,
                refresh_token_expiry: now_secs() + 86400,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn live_credential_skips_refresh() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, now_secs() + 600).await;
        let api = CountingApi::new(false);

        let channel = get_valid_channel(&db.pool, &api, "C1").await.unwrap();
        assert_eq!(channel.access_token, "old-access");
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_credential_refreshes_once_and_persists() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, now_secs() - 10).await;
        let api = CountingApi::new(false);

        let before = now_secs();
        let channel = get_valid_channel(&db.pool, &api, "C1").await.unwrap();
        assert_eq!(channel.access_token, "new-access");
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
        // Expiry persisted as an absolute epoch, not the raw offset
        assert!(channel.access_token_expiry >= before + 3600);

        let stored = db::channels::find(&db.pool, "C1").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "new-access");
        assert_eq!(stored.refresh_token, "new-refresh");
        assert_eq!(stored.access_token_expiry, channel.access_token_expiry);
    }

    #[tokio::test]
    async fn failed_refresh_never_returns_stale_credential() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_channel(&db.pool, now_secs() - 10).await;
        let api = CountingApi::new(true);

        let err = get_valid_channel(&db.pool, &api, "C1").await.unwrap_err();
        assert!(matches!(err, SyncError::CredentialRefresh { .. }));

        // Stored credential is untouched
        let stored = db::channels::find(&db.pool, "C1").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "old-access");
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let db = DbService::open_in_memory().await.unwrap();
        let api = CountingApi::new(false);
        let err = get_valid_channel(&db.pool, &api, "missing").await.unwrap_err();
        assert!(matches!(err, SyncError::ChannelNotFound(_)));
    }
}
