//! quay-sync — marketplace inventory reconciliation service
//!
//! Connects the Quay commerce platform to a third-party marketplace and
//! keeps stock levels reconciled:
//!
//! - **Intake** (`intake`): drains stock-change deliveries from the message
//!   transport, deduplicates them per identity key and records them as
//!   `PENDING` ledger rows
//! - **Ledger** (`db`): SQLite audit log of every inventory request and its
//!   lifecycle state
//! - **Batcher** (`reconcile`): scheduled worker that groups pending rows
//!   per external product and pushes one signed update call per product
//! - **Credentials** (`credentials`): per-channel access/refresh pair with
//!   refresh-on-expiry
//! - **Marketplace client** (`marketplace`): outbound adapter and signing
//!   seam
//! - **Ops surface** (`api`): health check + internal enqueue adapter

pub mod api;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod intake;
pub mod marketplace;
pub mod reconcile;
pub mod state;

// Re-export public types
pub use config::Config;
pub use db::DbService;
pub use error::{SyncError, SyncResult};
pub use state::AppState;
