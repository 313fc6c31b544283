//! Inbound stock-change contract
//!
//! The platform publishes stock-change events in three shapes: a single
//! object, a bare array, or an envelope of the form
//! `{"inventory_requests": [...]}`. All three decode to a flat event list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One stock movement for one SKU in one warehouse.
///
/// Every field is defaulted so a sparse producer payload still decodes;
/// events with an empty identity field are dropped during ingest rather
/// than failing the whole delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockChangeEvent {
    #[serde(default)]
    pub channel_uid: String,
    #[serde(default)]
    pub channel_type: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub available_quantity: i64,
    #[serde(default)]
    pub request_metadata: Map<String, Value>,
    #[serde(default)]
    pub product_metadata: Map<String, Value>,
}

impl StockChangeEvent {
    /// Identity key used to deduplicate inventory work.
    pub fn identity_key(&self) -> (String, String, String) {
        (
            self.channel_uid.clone(),
            self.sku.clone(),
            self.product_id.clone(),
        )
    }

    /// Request metadata merged with product metadata; product entries win.
    pub fn merged_metadata(&self) -> Map<String, Value> {
        let mut merged = self.request_metadata.clone();
        for (key, value) in &self.product_metadata {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// Inbound message envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StockChangeMessage {
    Wrapped {
        inventory_requests: Vec<StockChangeEvent>,
    },
    Batch(Vec<StockChangeEvent>),
    Single(StockChangeEvent),
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Transport-level malformation; the whole delivery is rejected
    #[error("empty payload")]
    Empty,
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl StockChangeMessage {
    /// Decode a raw delivery payload into the flat event list.
    ///
    /// Empty bodies (no bytes, `null`, `{}` or `[]`) are transport-level
    /// malformations and reject the delivery; anything else that parses
    /// yields events for per-item validation downstream.
    pub fn parse(payload: &[u8]) -> Result<Vec<StockChangeEvent>, EnvelopeError> {
        if payload.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(EnvelopeError::Empty);
        }
        let value: Value = serde_json::from_slice(payload)?;
        match &value {
            Value::Null => return Err(EnvelopeError::Empty),
            Value::Object(map) if map.is_empty() => return Err(EnvelopeError::Empty),
            Value::Array(items) if items.is_empty() => return Err(EnvelopeError::Empty),
            _ => {}
        }
        let message: StockChangeMessage = serde_json::from_value(value)?;
        Ok(message.into_events())
    }

    pub fn into_events(self) -> Vec<StockChangeEvent> {
        match self {
            Self::Wrapped { inventory_requests } => inventory_requests,
            Self::Batch(events) => events,
            Self::Single(event) => vec![event],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_object() {
        let payload = br#"{
            "channel_uid": "C1",
            "channel_type": "marketplace",
            "sku": "A",
            "product_id": "P1",
            "available_quantity": 5,
            "request_metadata": {"sku_id": "S-1", "warehouse_id": "W-1"}
        }"#;
        let events = StockChangeMessage::parse(payload).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel_uid, "C1");
        assert_eq!(events[0].available_quantity, 5);
    }

    #[test]
    fn parses_bare_array() {
        let payload = br#"[
            {"channel_uid": "C1", "sku": "A", "product_id": "P1"},
            {"channel_uid": "C2", "sku": "B", "product_id": "P2"}
        ]"#;
        let events = StockChangeMessage::parse(payload).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].channel_uid, "C2");
    }

    #[test]
    fn parses_wrapped_envelope() {
        let payload = br#"{"inventory_requests": [
            {"channel_uid": "C1", "sku": "A", "product_id": "P1", "available_quantity": 3}
        ]}"#;
        let events = StockChangeMessage::parse(payload).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].available_quantity, 3);
    }

    #[test]
    fn missing_fields_default() {
        let events = StockChangeMessage::parse(br#"{"channel_uid": "C1", "sku": "A", "product_id": "P1"}"#).unwrap();
        assert_eq!(events[0].available_quantity, 0);
        assert!(events[0].request_metadata.is_empty());
    }

    #[test]
    fn rejects_empty_payloads() {
        let payloads: [&[u8]; 5] = [b"", b"  ", b"null", b"{}", b"[]"];
        for payload in payloads {
            assert!(matches!(
                StockChangeMessage::parse(payload),
                Err(EnvelopeError::Empty)
            ));
        }
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            StockChangeMessage::parse(b"{not json"),
            Err(EnvelopeError::Json(_))
        ));
    }

    #[test]
    fn product_metadata_wins_on_merge() {
        let payload = br#"{
            "channel_uid": "C1", "sku": "A", "product_id": "P1",
            "request_metadata": {"sku_id": "old", "warehouse_id": "W-1"},
            "product_metadata": {"sku_id": "new"}
        }"#;
        let events = StockChangeMessage::parse(payload).unwrap();
        let merged = events[0].merged_metadata();
        assert_eq!(merged["sku_id"], "new");
        assert_eq!(merged["warehouse_id"], "W-1");
    }
}
