//! HTTP implementation of the marketplace API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::models::Channel;
use shared::util::now_secs;

use crate::config::Config;
use super::sign::RequestSigner;
use super::{MarketplaceApi, MarketplaceError, SkuInventory, SyncOutcome, TokenGrant};

/// Response envelope shared by the marketplace open API and its auth
/// service: `code` 0 on success, payload under `data`.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

pub struct MarketplaceClient {
    http: Client,
    api_url: String,
    auth_url: String,
    app_key: String,
    app_secret: String,
    signer: Arc<dyn RequestSigner>,
}

impl MarketplaceClient {
    /// Build the client with a per-call timeout; a stuck external call must
    /// not hold a channel's reconciliation run indefinitely.
    pub fn new(config: &Config, signer: Arc<dyn RequestSigner>) -> Result<Self, MarketplaceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| MarketplaceError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.marketplace_api_url.trim_end_matches('/').to_string(),
            auth_url: config.marketplace_auth_url.trim_end_matches('/').to_string(),
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
            signer,
        })
    }
}

#[async_trait]
impl MarketplaceApi for MarketplaceClient {
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, MarketplaceError> {
        let url = format!("{}/api/v2/token/refresh", self.auth_url);

        let envelope: ApiEnvelope = self
            .http
            .get(&url)
            .query(&[
                ("app_key", self.app_key.as_str()),
                ("app_secret", self.app_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if envelope.code != 0 {
            return Err(MarketplaceError::Rejected {
                code: envelope.code,
                message: envelope.message,
            });
        }

        serde_json::from_value(envelope.data).map_err(|e| MarketplaceError::Decode(e.to_string()))
    }

    async fn update_stock(
        &self,
        channel: &Channel,
        item_id: &str,
        skus: &[SkuInventory],
    ) -> Result<SyncOutcome, MarketplaceError> {
        let path = format!("/api/products/{item_id}/inventory/update");

        let skus_payload: Vec<serde_json::Value> = skus
            .iter()
            .map(|sku| {
                serde_json::json!({
                    "id": sku.sku_id,
                    "inventory": [{"quantity": sku.quantity, "warehouse_id": sku.warehouse_id}],
                })
            })
            .collect();
        let body = serde_json::to_vec(&serde_json::json!({ "skus": skus_payload }))
            .map_err(|e| MarketplaceError::Decode(e.to_string()))?;

        let mut params = vec![
            ("app_key", self.app_key.clone()),
            ("shop_id", channel.shop_id.clone()),
            ("timestamp", now_secs().to_string()),
        ];
        let signature = self.signer.sign(&path, &params, &body);
        params.push(("sign", signature));

        let raw: serde_json::Value = self
            .http
            .post(format!("{}{path}", self.api_url))
            .query(&params)
            .header("X-Access-Token", &channel.access_token)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?
            .json()
            .await?;

        let envelope: ApiEnvelope = serde_json::from_value(raw.clone())
            .map_err(|e| MarketplaceError::Decode(e.to_string()))?;

        Ok(SyncOutcome {
            code: envelope.code,
            request_id: envelope.request_id.filter(|id| !id.is_empty()),
            raw,
        })
    }
}
