#![allow(non_snake_case)]

use crate::http::build_client;
use crate::marketplace::config::ROOT;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OfferError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("offer already exists for sku")]
    EntityExists,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub sku: String,
    pub marketplace_id: String,
    pub format: &'static str,
    pub category_id: String,
    pub listing_description: String,
    pub available_quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferRequest {
    pub format: &'static str,
    pub category_id: String,
    pub listing_description: String,
    pub available_quantity: i32,
}

pub async fn create_offer(
    request: &CreateOfferRequest,
    access_token: &str,
) -> Result<String, OfferError> {
    let client = build_client();
    let url = format!("{}/sell/inventory/v1/offer", *ROOT);
    let response = client
        .post(url)
        .bearer_auth(access_token)
        .json(request)
        .send()
        .await
        .map_err(|err| OfferError::Request(err.to_string()))?;
    if response.status() == 409 {
        return Err(OfferError::EntityExists);
    }
    if !response.status().is_success() {
        return Err(OfferError::Request(format!("HTTP {}", response.status())));
    }
    #[derive(serde::Deserialize)]
    struct OfferResponse {
        offerId: String,
    }
    let payload: OfferResponse = response
        .json()
        .await
        .map_err(|err| OfferError::Request(err.to_string()))?;
    Ok(payload.offerId)
}

pub async fn publish_offer(offer_id: &str, access_token: &str) -> Result<String, OfferError> {
    let client = build_client();
    let url = format!("{}/sell/inventory/v1/offer/{offer_id}/publish", *ROOT);
    let response = client
        .post(url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|err| OfferError::Request(err.to_string()))?;
    if !response.status().is_success() {
        return Err(OfferError::Request(format!("HTTP {}", response.status())));
    }
    #[derive(serde::Deserialize)]
    struct PublishResponse {
        listingId: Option<String>,
    }
    let payload: PublishResponse = response
        .json()
        .await
        .map_err(|err| OfferError::Request(err.to_string()))?;
    Ok(payload.listingId.unwrap_or_default())
}

#[derive(Debug, serde::Deserialize)]
pub struct OfferSummary {
    pub offerId: Option<String>,
    pub marketplaceId: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OfferSearchResponse {
    offers: Option<Vec<OfferSummary>>,
}

pub async fn get_offers_by_sku(
    sku: &str,
    access_token: &str,
) -> Result<Vec<OfferSummary>, OfferError> {
    let client = build_client();
    let url = format!("{}/sell/inventory/v1/offer", *ROOT);
    let response = client
        .get(url)
        .bearer_auth(access_token)
        .query(&[("sku", sku)])
        .send()
        .await
        .map_err(|err| OfferError::Request(err.to_string()))?;
    if !response.status().is_success() {
        return Err(OfferError::Request(format!("HTTP {}", response.status())));
    }
    let payload: OfferSearchResponse = response
        .json()
        .await
        .map_err(|err| OfferError::Request(err.to_string()))?;
    Ok(payload.offers.unwrap_or_default())
}

pub async fn update_offer(
    offer_id: &str,
    payload: &UpdateOfferRequest,
    access_token: &str,
) -> Result<(), OfferError> {
    let client = build_client();
    let url = format!("{}/sell/inventory/v1/offer/{offer_id}", *ROOT);
    let response = client
        .put(url)
        .bearer_auth(access_token)
        .json(payload)
        .send()
        .await
        .map_err(|err| OfferError::Request(err.to_string()))?;
    if !response.status().is_success() {
        return Err(OfferError::Request(format!("HTTP {}", response.status())));
    }
    Ok(())
}

pub async fn withdraw_offer(offer_id: &str, access_token: &str) -> Result<(), OfferError> {
    let client = build_client();
    let url = format!("{}/sell/inventory/v1/offer/{offer_id}/withdraw", *ROOT);
    let response = client
        .post(url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|err| OfferError::Request(err.to_string()))?;
    if !response.status().is_success() {
        return Err(OfferError::Request(format!("HTTP {}", response.status())));
    }
    Ok(())
}
