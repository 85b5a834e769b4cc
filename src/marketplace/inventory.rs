use crate::http::build_client;
use crate::marketplace::config::ROOT;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use urlencoding::encode;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemRequest {
    pub availability: InventoryAvailability,
    pub condition: String,
    pub product: InventoryProduct,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAvailability {
    pub ship_to_location_availability: ShipToLocationAvailability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipToLocationAvailability {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProduct {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspects: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<Vec<String>>,
}

/// PUT the inventory record for a SKU. Re-running for the same SKU overwrites
/// the same record, which is what makes the deterministic SKU an upsert key.
pub async fn upsert_inventory_item(
    sku: &str,
    payload: &InventoryItemRequest,
    access_token: &str,
) -> Result<(), InventoryError> {
    let client = build_client();
    let url = format!("{}/sell/inventory/v1/inventory_item/{}", *ROOT, encode(sku));
    let response = client
        .put(url)
        .bearer_auth(access_token)
        .json(payload)
        .send()
        .await
        .map_err(|err| InventoryError::Request(err.to_string()))?;

    if !response.status().is_success() {
        return Err(InventoryError::Request(format!(
            "HTTP {}",
            response.status()
        )));
    }

    Ok(())
}
