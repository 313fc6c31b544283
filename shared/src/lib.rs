//! Shared types for the Quay marketplace connector
//!
//! Contract types exchanged between the platform side (stock-change
//! publishers) and the sync service, plus the domain models backing the
//! request ledger.

pub mod inventory;
pub mod models;
pub mod util;

// Re-exports
pub use inventory::{EnvelopeError, StockChangeEvent, StockChangeMessage};
pub use models::{Channel, InventoryRequest, RequestStatus};
