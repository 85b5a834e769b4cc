use crate::catalog::transform::MAX_IMAGES;
use crate::marketplace::config::MARKETPLACE_ID;
use crate::marketplace::inventory::{
    InventoryAvailability, InventoryItemRequest, InventoryProduct, ShipToLocationAvailability,
};
use crate::marketplace::listing::ListingPayload;
use crate::marketplace::offers::{CreateOfferRequest, UpdateOfferRequest};
use crate::models::ItemCondition;
use std::collections::BTreeMap;

/// Fixed SKU namespace. Same external id, same SKU, same marketplace
/// inventory record on every run.
pub const SKU_PREFIX: &str = "LSTR-";

pub fn sku_for(external_product_id: &str) -> String {
    format!("{SKU_PREFIX}{external_product_id}")
}

pub struct AssembleInput<'a> {
    pub external_product_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub images: &'a [String],
    pub aspects: &'a BTreeMap<String, Vec<String>>,
    pub brand: Option<&'a str>,
    pub mpn: Option<&'a str>,
    pub upc: Option<&'a str>,
    pub ean: Option<&'a str>,
    pub condition: Option<&'a str>,
    pub quantity: Option<i32>,
}

pub fn build_payload(input: AssembleInput<'_>) -> ListingPayload {
    let mut images: Vec<String> = input.images.to_vec();
    images.truncate(MAX_IMAGES);

    ListingPayload {
        sku: sku_for(input.external_product_id),
        condition: ItemCondition::from_input(input.condition)
            .marketplace_code()
            .to_string(),
        quantity: input.quantity.unwrap_or(1).max(1),
        title: input.title.to_string(),
        description: input.description.to_string(),
        aspects: input.aspects.clone(),
        images,
        brand: input.brand.map(|value| value.to_string()),
        mpn: input.mpn.map(|value| value.to_string()),
        upc: input.upc.map(|value| value.to_string()),
        ean: input.ean.map(|value| value.to_string()),
    }
}

pub fn inventory_request_from(payload: &ListingPayload) -> InventoryItemRequest {
    let aspects = if payload.aspects.is_empty() {
        None
    } else {
        Some(payload.aspects.clone())
    };
    InventoryItemRequest {
        availability: InventoryAvailability {
            ship_to_location_availability: ShipToLocationAvailability {
                quantity: payload.quantity,
            },
        },
        condition: payload.condition.clone(),
        product: InventoryProduct {
            title: payload.title.clone(),
            description: payload.description.clone(),
            aspects,
            image_urls: payload.images.clone(),
            brand: payload.brand.clone(),
            mpn: payload.mpn.clone(),
            upc: payload.upc.clone().map(|value| vec![value]),
            ean: payload.ean.clone().map(|value| vec![value]),
        },
    }
}

pub fn offer_requests_from(
    payload: &ListingPayload,
    category_id: &str,
) -> (CreateOfferRequest, UpdateOfferRequest) {
    let create = CreateOfferRequest {
        sku: payload.sku.clone(),
        marketplace_id: MARKETPLACE_ID.clone(),
        format: "FIXED_PRICE",
        category_id: category_id.to_string(),
        listing_description: payload.description.clone(),
        available_quantity: payload.quantity,
    };
    let update = UpdateOfferRequest {
        format: "FIXED_PRICE",
        category_id: category_id.to_string(),
        listing_description: payload.description.clone(),
        available_quantity: payload.quantity,
    };
    (create, update)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(images: &'a [String], aspects: &'a BTreeMap<String, Vec<String>>) -> AssembleInput<'a> {
        AssembleInput {
            external_product_id: "EXT-77",
            title: "Wireless Headphones XL",
            description: "Over-ear, 40h battery",
            images,
            aspects,
            brand: Some("Acme"),
            mpn: Some("PN-77"),
            upc: Some("840000000000"),
            ean: None,
            condition: None,
            quantity: None,
        }
    }

    #[test]
    fn sku_is_deterministic() {
        assert_eq!(sku_for("EXT-77"), "LSTR-EXT-77");
        assert_eq!(sku_for("EXT-77"), sku_for("EXT-77"));
    }

    #[test]
    fn payload_caps_images_in_order() {
        let images: Vec<String> = (0..20).map(|idx| format!("https://m/{idx}.jpg")).collect();
        let aspects = BTreeMap::new();
        let payload = build_payload(input(&images, &aspects));
        assert_eq!(payload.images.len(), MAX_IMAGES);
        assert_eq!(payload.images[0], "https://m/0.jpg");
        assert_eq!(payload.images[11], "https://m/11.jpg");
    }

    #[test]
    fn identifiers_ride_top_level_and_condition_defaults() {
        let images = Vec::new();
        let aspects = BTreeMap::from([("Brand".to_string(), vec!["Acme".to_string()])]);
        let payload = build_payload(input(&images, &aspects));
        assert_eq!(payload.condition, "NEW");
        assert_eq!(payload.quantity, 1);
        assert_eq!(payload.upc.as_deref(), Some("840000000000"));
        assert_eq!(payload.mpn.as_deref(), Some("PN-77"));
        // identifier also stays in the aspect map
        assert_eq!(payload.aspects.get("Brand"), Some(&vec!["Acme".to_string()]));
    }

    #[test]
    fn inventory_request_mirrors_payload() {
        let images = vec!["https://m/0.jpg".to_string()];
        let aspects = BTreeMap::from([("Brand".to_string(), vec!["Acme".to_string()])]);
        let payload = build_payload(build_input_with_condition(&images, &aspects, "used_good", 3));
        let request = inventory_request_from(&payload);
        assert_eq!(request.condition, "USED_GOOD");
        assert_eq!(
            request
                .availability
                .ship_to_location_availability
                .quantity,
            3
        );
        assert_eq!(request.product.upc, Some(vec!["840000000000".to_string()]));
    }

    fn build_input_with_condition<'a>(
        images: &'a [String],
        aspects: &'a BTreeMap<String, Vec<String>>,
        condition: &'a str,
        quantity: i32,
    ) -> AssembleInput<'a> {
        AssembleInput {
            condition: Some(condition),
            quantity: Some(quantity),
            ..input(images, aspects)
        }
    }
}
