//! Stock-change intake
//!
//! `IntakeWorker` consumes deliveries from the message transport and
//! records them as `PENDING` ledger rows. The transport itself is external;
//! its enqueue/ack/reject contract is modeled as an mpsc channel of
//! `Delivery` items, each carrying a oneshot disposition the adapter maps
//! back onto the broker's ack/reject (or an HTTP status).

pub mod ingest;

use sqlx::SqlitePool;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use shared::inventory::StockChangeMessage;

use crate::error::{SyncError, SyncResult};

/// Buffered deliveries between the transport adapter and the worker
pub const INTAKE_QUEUE_DEPTH: usize = 128;

/// Outcome reported back to the transport for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Every valid event is durably recorded; the broker may drop the message
    Ack,
    /// Ingestion failed as a whole; the broker should redeliver
    Reject,
}

/// One message pulled off the transport.
pub struct Delivery {
    pub payload: Vec<u8>,
    pub done: oneshot::Sender<Disposition>,
}

impl Delivery {
    pub fn new(payload: Vec<u8>) -> (Self, oneshot::Receiver<Disposition>) {
        let (done, done_rx) = oneshot::channel();
        (Self { payload, done }, done_rx)
    }
}

/// Background worker that drains the intake channel.
pub struct IntakeWorker {
    pool: SqlitePool,
    channel_type: String,
    shutdown: CancellationToken,
}

impl IntakeWorker {
    pub fn new(pool: SqlitePool, channel_type: String, shutdown: CancellationToken) -> Self {
        Self {
            pool,
            channel_type,
            shutdown,
        }
    }

    pub async fn run(self, mut deliveries: mpsc::Receiver<Delivery>) {
        tracing::info!("IntakeWorker started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("IntakeWorker shutting down");
                    break;
                }

                delivery = deliveries.recv() => {
                    match delivery {
                        Some(delivery) => self.handle(delivery).await,
                        None => {
                            tracing::info!("Intake channel closed, IntakeWorker stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("IntakeWorker stopped");
    }

    async fn handle(&self, delivery: Delivery) {
        let disposition = match self.process(&delivery.payload).await {
            Ok(()) => Disposition::Ack,
            Err(e) => {
                tracing::error!(error = %e, "Delivery rejected");
                Disposition::Reject
            }
        };
        // The adapter may have given up waiting; nothing to do then
        let _ = delivery.done.send(disposition);
    }

    /// Parse and ingest one delivery. Item-level validation faults are
    /// skipped inside `ingest`; only transport-level malformation or a
    /// failed ledger write rejects the delivery as a whole.
    async fn process(&self, payload: &[u8]) -> SyncResult<()> {
        let events = StockChangeMessage::parse(payload)
            .map_err(|e| SyncError::InvalidPayload(e.to_string()))?;

        let summary = ingest::ingest(&self.pool, &self.channel_type, events).await?;
        tracing::info!(
            merged = summary.merged,
            skipped = summary.skipped,
            "Stock-change delivery ingested"
        );
        Ok(())
    }
}
