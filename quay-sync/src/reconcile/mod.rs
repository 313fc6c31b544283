//! Inventory reconciliation
//!
//! The timer-driven half of the pipeline: pending ledger rows are batched
//! per external product and pushed through the marketplace client.

pub mod batch;
pub mod worker;

pub use worker::ReconcileWorker;
