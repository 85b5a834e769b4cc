use serde::Serialize;
use std::collections::BTreeMap;

/// Fully assembled item handed to the marketplace publisher. Built once per
/// run and never mutated after handoff. Product identifiers ride both in the
/// aspect map and at the top level; the marketplace wants them in both places.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    pub sku: String,
    pub condition: String,
    pub quantity: i32,
    pub title: String,
    pub description: String,
    pub aspects: BTreeMap<String, Vec<String>>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
}
