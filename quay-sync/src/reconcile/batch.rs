//! Product grouping and payload assembly
//!
//! The external update API takes one call per product with multiple
//! SKU/warehouse entries, so the batching unit is the external product id —
//! call volume scales with distinct products touched, not with individual
//! stock movements.

use serde_json::Value;

use shared::models::InventoryRequest;

use crate::marketplace::SkuInventory;

/// Pending rows for one external product, in ledger order.
#[derive(Debug)]
pub struct ProductGroup {
    pub item_id: String,
    pub requests: Vec<InventoryRequest>,
}

/// Group rows by external product id, preserving first-seen (oldest-first)
/// order of both groups and rows.
pub fn group_by_item(requests: Vec<InventoryRequest>) -> Vec<ProductGroup> {
    let mut groups: Vec<ProductGroup> = Vec::new();
    for request in requests {
        match groups.iter_mut().find(|g| g.item_id == request.item_id) {
            Some(group) => group.requests.push(request),
            None => groups.push(ProductGroup {
                item_id: request.item_id.clone(),
                requests: vec![request],
            }),
        }
    }
    groups
}

/// Outcome of payload assembly for one product group.
#[derive(Debug, Default)]
pub struct PayloadPlan {
    /// Entries for the outbound update call, parallel to `ready`
    pub skus: Vec<SkuInventory>,
    /// Row ids backing `skus`
    pub ready: Vec<i64>,
    /// Rows missing `sku_id`/`warehouse_id`; marked FAILED without
    /// blocking their siblings
    pub invalid: Vec<i64>,
}

/// Build the update payload for one group. Rows without the metadata the
/// external API needs are split out as invalid.
pub fn build_payload(requests: &[InventoryRequest]) -> PayloadPlan {
    let mut plan = PayloadPlan::default();

    for request in requests {
        let metadata = request.metadata();
        let sku_id = metadata_str(&metadata, "sku_id");
        let warehouse_id = metadata_str(&metadata, "warehouse_id");

        if sku_id.is_empty() || warehouse_id.is_empty() {
            tracing::warn!(
                request_id = request.id,
                sku = %request.sku,
                "Skipping request with missing sku_id/warehouse_id"
            );
            plan.invalid.push(request.id);
            continue;
        }

        plan.ready.push(request.id);
        plan.skus.push(SkuInventory {
            sku_id,
            quantity: request.quantity,
            warehouse_id,
        });
    }

    plan
}

/// Metadata values arrive as strings or bare numbers; both stringify,
/// everything else is treated as absent.
fn metadata_str(metadata: &serde_json::Map<String, Value>, key: &str) -> String {
    match metadata.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: i64, item_id: &str, metadata: &str) -> InventoryRequest {
        InventoryRequest {
            id,
            channel_uid: "C1".into(),
            sku: format!("sku-{id}"),
            item_id: item_id.into(),
            quantity: 10 + id,
            status: "PENDING".into(),
            request_id: None,
            request_metadata: metadata.into(),
            created_at: id,
            updated_at: id,
        }
    }

    #[test]
    fn groups_preserve_oldest_first_order() {
        let groups = group_by_item(vec![
            request(1, "P1", "{}"),
            request(2, "P2", "{}"),
            request(3, "P1", "{}"),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].item_id, "P1");
        assert_eq!(groups[0].requests.len(), 2);
        assert_eq!(groups[1].item_id, "P2");
    }

    #[test]
    fn payload_excludes_rows_missing_metadata() {
        let plan = build_payload(&[
            request(1, "P1", r#"{"sku_id": "S-1", "warehouse_id": "W-1"}"#),
            request(2, "P1", r#"{"sku_id": "S-2"}"#),
            request(3, "P1", r#"{"warehouse_id": "W-1"}"#),
        ]);
        assert_eq!(plan.ready, vec![1]);
        assert_eq!(plan.invalid, vec![2, 3]);
        assert_eq!(plan.skus.len(), 1);
        assert_eq!(plan.skus[0].sku_id, "S-1");
        assert_eq!(plan.skus[0].quantity, 11);
    }

    #[test]
    fn numeric_metadata_values_stringify() {
        let plan = build_payload(&[request(
            1,
            "P1",
            r#"{"sku_id": 17291, "warehouse_id": 44}"#,
        )]);
        assert_eq!(plan.skus[0].sku_id, "17291");
        assert_eq!(plan.skus[0].warehouse_id, "44");
    }
}
