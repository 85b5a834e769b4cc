use crate::http::build_client;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// One unresolved required aspect, queued for the offline learning job.
#[derive(Debug, Clone, Serialize)]
pub struct AspectMissRecord {
    pub external_product_id: String,
    pub aspect_name: String,
    pub product_title: String,
    pub category_id: String,
    pub category_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_model: Option<String>,
    pub status: &'static str,
    pub recorded_at: DateTime<Utc>,
}

impl AspectMissRecord {
    pub fn pending(
        external_product_id: &str,
        aspect_name: &str,
        product_title: &str,
        category_id: &str,
        category_name: &str,
        source_brand: Option<&str>,
        source_model: Option<&str>,
    ) -> Self {
        Self {
            external_product_id: external_product_id.to_string(),
            aspect_name: aspect_name.to_string(),
            product_title: product_title.to_string(),
            category_id: category_id.to_string(),
            category_name: category_name.to_string(),
            source_brand: source_brand.map(|value| value.to_string()),
            source_model: source_model.map(|value| value.to_string()),
            status: "pending",
            recorded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MissStore {
    base_url: String,
    api_key: String,
    http: Client,
}

#[derive(Debug, Error)]
pub enum MissStoreError {
    #[error("request failed: {0}")]
    Request(String),
}

impl MissStore {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("MISS_STORE_URL").ok()?;
        let api_key = std::env::var("MISS_STORE_KEY").ok()?;
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http: build_client(),
        })
    }

    pub async fn insert(&self, record: &AspectMissRecord) -> Result<(), MissStoreError> {
        let url = format!("{}/rest/v1/aspect_misses", self.base_url);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(record)
            .send()
            .await
            .map_err(|err| MissStoreError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(MissStoreError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Persist miss records without touching the pipeline's fate: spawned off the
/// request task, every error swallowed after a warn. With no store configured
/// the misses are only logged.
pub fn record_all(store: Option<&MissStore>, misses: Vec<AspectMissRecord>) {
    if misses.is_empty() {
        return;
    }
    for miss in &misses {
        crate::metrics::inc_aspect_miss(&miss.aspect_name);
        warn!(
            target = "lister.aspects",
            aspect = %miss.aspect_name,
            product = %miss.external_product_id,
            category = %miss.category_id,
            "required_aspect_unresolved"
        );
    }
    let Some(store) = store.cloned() else {
        return;
    };
    tokio::spawn(async move {
        for miss in misses {
            if let Err(err) = store.insert(&miss).await {
                warn!(
                    target = "lister.aspects",
                    aspect = %miss.aspect_name,
                    error = %err,
                    "aspect_miss_write_failed"
                );
            }
        }
    });
}
