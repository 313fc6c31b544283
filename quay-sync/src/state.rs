//! Shared application state

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::db::DbService;
use crate::intake::Delivery;
use crate::marketplace::MarketplaceApi;

/// State handed to the HTTP layer; workers hold their own handles.
#[derive(Clone)]
pub struct AppState {
    /// Request ledger
    pub db: DbService,
    /// Outbound marketplace adapter
    pub marketplace: Arc<dyn MarketplaceApi>,
    /// Producer side of the intake channel
    pub intake_tx: mpsc::Sender<Delivery>,
}
