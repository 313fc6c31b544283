//! Channel repository

use shared::models::Channel;
use shared::util::now_millis;
use sqlx::SqlitePool;

pub async fn find(pool: &SqlitePool, channel_uid: &str) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        "SELECT channel_uid, name, shop_id, access_token, refresh_token, access_token_expiry, refresh_token_expiry, created_at, updated_at FROM channels WHERE channel_uid = ?",
    )
    .bind(channel_uid)
    .fetch_optional(pool)
    .await
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        "SELECT channel_uid, name, shop_id, access_token, refresh_token, access_token_expiry, refresh_token_expiry, created_at, updated_at FROM channels ORDER BY channel_uid",
    )
    .fetch_all(pool)
    .await
}

/// All known channel identifiers; intake resolves this once per batch call
/// to cheaply filter events referencing unknown channels.
pub async fn list_uids(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT channel_uid FROM channels")
        .fetch_all(pool)
        .await
}

/// Register a channel. Channels are created on integration and never
/// hard-deleted while inventory requests reference them.
pub async fn insert(pool: &SqlitePool, channel: &Channel) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO channels (channel_uid, name, shop_id, access_token, refresh_token, access_token_expiry, refresh_token_expiry, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&channel.channel_uid)
    .bind(&channel.name)
    .bind(&channel.shop_id)
    .bind(&channel.access_token)
    .bind(&channel.refresh_token)
    .bind(channel.access_token_expiry)
    .bind(channel.refresh_token_expiry)
    .bind(channel.created_at)
    .bind(channel.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist a refreshed credential pair. One durable write per refresh;
/// expiries are absolute epoch seconds.
pub async fn update_tokens(
    pool: &SqlitePool,
    channel_uid: &str,
    access_token: &str,
    refresh_token: &str,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE channels SET access_token = ?, refresh_token = ?, access_token_expiry = ?, refresh_token_expiry = ?, updated_at = ? WHERE channel_uid = ?",
    )
    .bind(access_token)
    .bind(refresh_token)
    .bind(access_token_expiry)
    .bind(refresh_token_expiry)
    .bind(now_millis())
    .bind(channel_uid)
    .execute(pool)
    .await?;
    Ok(())
}
