use crate::aspects::{self, compile_patterns, resolve_aspects};
use crate::assemble::{self, AssembleInput};
use crate::catalog::{self, CatalogClient, build_draft, truncate_title};
use crate::content::{ContentClient, ContentConfig, ProductFacts};
use crate::marketplace::ListingPayload;
use crate::marketplace::config as market_config;
use crate::marketplace::offers::{self, CreateOfferRequest, OfferError, UpdateOfferRequest};
use crate::marketplace::{inventory, taxonomy};
use crate::models::{ListingRequest, ListingResponse, StageReport};
use serde_json::{Value, json};
use std::{fmt, future::Future, time::Instant};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Named stages of the listing state machine. Catalog fetch, category
/// resolution, and the final submission are the only stages allowed to fail
/// the run; everything else degrades in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingCatalog,
    ResolvingCategory,
    FetchingAspects,
    ResolvingAspects,
    GeneratingContent,
    Assembling,
    Publishing,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::FetchingCatalog => "fetching-catalog",
            Self::ResolvingCategory => "resolving-category",
            Self::FetchingAspects => "fetching-aspects",
            Self::ResolvingAspects => "resolving-aspects",
            Self::GeneratingContent => "generating-content",
            Self::Assembling => "assembling",
            Self::Publishing => "publishing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: Stage,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    InvalidInput,
    NotFound,
    CategoryUndetermined,
    MarketplaceRejected,
    Internal,
}

impl PipelineError {
    pub fn invalid_input(stage: Stage, message: impl Into<String>) -> Self {
        Self::build(stage, PipelineErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::build(Stage::FetchingCatalog, PipelineErrorKind::NotFound, message)
    }

    pub fn undetermined(message: impl Into<String>) -> Self {
        Self::build(
            Stage::ResolvingCategory,
            PipelineErrorKind::CategoryUndetermined,
            message,
        )
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::build(
            Stage::Publishing,
            PipelineErrorKind::MarketplaceRejected,
            message,
        )
    }

    pub fn internal(stage: Stage, message: impl Into<String>) -> Self {
        Self::build(stage, PipelineErrorKind::Internal, message)
    }

    fn build(stage: Stage, kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
pub struct StageOutcome<T> {
    pub value: T,
    pub output: Value,
}

impl<T> StageOutcome<T> {
    fn new(value: T, output: Value) -> Self {
        Self { value, output }
    }
}

pub struct Pipeline {
    catalog: Option<CatalogClient>,
    patterns: Option<aspects::PatternStore>,
    misses: Option<aspects::MissStore>,
    content: ContentClient,
    marketplace_token: Option<String>,
}

impl Pipeline {
    pub fn from_env() -> Self {
        Self {
            catalog: CatalogClient::from_env(),
            patterns: aspects::PatternStore::from_env(),
            misses: aspects::MissStore::from_env(),
            content: ContentClient::new(ContentConfig::from_env()),
            marketplace_token: market_config::access_token(),
        }
    }

    /// All collaborators unconfigured: deterministic local behavior end to
    /// end. What the binary does on a bare environment, and what the tests
    /// exercise.
    pub fn offline() -> Self {
        Self {
            catalog: None,
            patterns: None,
            misses: None,
            content: ContentClient::new(ContentConfig {
                gateway_url: None,
                api_key: None,
                function_name: None,
                model: None,
            }),
            marketplace_token: None,
        }
    }

    pub async fn run(&self, request: ListingRequest) -> Result<ListingResponse, PipelineError> {
        let external_id = validate_external_id(&request.external_product_id)?;
        let mut stages = Vec::new();

        let draft = self
            .capture_stage(Stage::FetchingCatalog, &mut stages, async {
                let record = match &self.catalog {
                    Some(client) => client
                        .fetch(&external_id)
                        .await
                        .map_err(|err| {
                            PipelineError::internal(Stage::FetchingCatalog, err.to_string())
                        })?
                        .ok_or_else(|| {
                            PipelineError::not_found(format!(
                                "catalog record `{external_id}` not found"
                            ))
                        })?,
                    None => {
                        warn!(
                            target = "lister.catalog",
                            product = %external_id,
                            "catalog_service_unconfigured_using_demo_record"
                        );
                        catalog::client::demo_record(&external_id).ok_or_else(|| {
                            PipelineError::not_found(format!(
                                "catalog record `{external_id}` not found"
                            ))
                        })?
                    }
                };
                let draft = build_draft(&external_id, &record);
                Ok(StageOutcome::new(
                    draft.clone(),
                    json!({
                        "title": draft.title,
                        "image_count": draft.images.len(),
                        "seeded_aspects": draft.aspects.keys().collect::<Vec<_>>(),
                    }),
                ))
            })
            .await?;

        let category = self
            .capture_stage(Stage::ResolvingCategory, &mut stages, async {
                let suggestion = match &self.marketplace_token {
                    Some(token) => taxonomy::suggest_category(&draft.title, token)
                        .await
                        .map_err(|err| {
                            PipelineError::undetermined(format!("category service: {err}"))
                        })?,
                    None => taxonomy::suggest_from_pool(&draft.title),
                };
                let category = suggestion.ok_or_else(|| {
                    PipelineError::undetermined(format!(
                        "no category suggestion for `{}`",
                        draft.title
                    ))
                })?;
                Ok(StageOutcome::new(
                    category.clone(),
                    json!({
                        "category_id": category.category_id,
                        "category_name": category.category_name,
                    }),
                ))
            })
            .await?;

        // Aspect discovery is advisory; a failed fetch shrinks to no
        // additional requirements instead of aborting.
        let requirements = self
            .capture_stage(Stage::FetchingAspects, &mut stages, async {
                let requirements = match &self.marketplace_token {
                    Some(token) => {
                        match taxonomy::fetch_category_aspects(&category.category_id, token).await {
                            Ok(list) => list,
                            Err(err) => {
                                warn!(
                                    target = "lister.aspects",
                                    category = %category.category_id,
                                    error = %err,
                                    "aspect_requirements_fetch_failed"
                                );
                                Vec::new()
                            }
                        }
                    }
                    None => taxonomy::builtin_requirements(&category.category_id),
                };
                let required: Vec<&str> = requirements
                    .iter()
                    .filter(|requirement| requirement.required)
                    .map(|requirement| requirement.name.as_str())
                    .collect();
                Ok(StageOutcome::new(
                    requirements.clone(),
                    json!({
                        "count": requirements.len(),
                        "required": required,
                    }),
                ))
            })
            .await?;

        let aspects_map = self
            .capture_stage(Stage::ResolvingAspects, &mut stages, async {
                let rows = match &self.patterns {
                    Some(store) => match store.fetch_for_category(&category.category_id).await {
                        Ok(rows) => rows,
                        Err(err) => {
                            warn!(
                                target = "lister.aspects",
                                category = %category.category_id,
                                error = %err,
                                "learned_pattern_fetch_failed"
                            );
                            Vec::new()
                        }
                    },
                    None => Vec::new(),
                };
                let patterns = compile_patterns(rows);
                let resolution =
                    resolve_aspects(&draft, &requirements, &patterns, &category, &external_id);
                let missed: Vec<String> = resolution
                    .misses
                    .iter()
                    .map(|miss| miss.aspect_name.clone())
                    .collect();
                aspects::misses::record_all(self.misses.as_ref(), resolution.misses);
                Ok(StageOutcome::new(
                    resolution.aspects.clone(),
                    json!({
                        "resolved": resolution.aspects.len(),
                        "patterns_considered": patterns.len(),
                        "missed": missed,
                    }),
                ))
            })
            .await?;

        let (title, description) = self
            .capture_stage(Stage::GeneratingContent, &mut stages, async {
                let facts = ProductFacts {
                    title: &draft.title,
                    description: &draft.description,
                    features: &draft.features,
                    brand: draft.brand.as_deref(),
                    model: draft.model.as_deref(),
                    color: draft.color.as_deref(),
                    category_name: &category.category_name,
                };
                match self.content.rewrite(&facts).await {
                    Ok(generated) => {
                        let title = truncate_title(&generated.title);
                        Ok(StageOutcome::new(
                            (title.clone(), generated.description),
                            json!({ "fallback": false, "title": title }),
                        ))
                    }
                    Err(err) => {
                        warn!(
                            target = "lister.content",
                            product = %external_id,
                            error = %err,
                            "content_generation_fallback"
                        );
                        Ok(StageOutcome::new(
                            (draft.title.clone(), draft.description.clone()),
                            json!({ "fallback": true, "title": draft.title.clone() }),
                        ))
                    }
                }
            })
            .await?;

        let payload = self
            .capture_stage(Stage::Assembling, &mut stages, async {
                let payload = assemble::build_payload(AssembleInput {
                    external_product_id: &external_id,
                    title: &title,
                    description: &description,
                    images: &draft.images,
                    aspects: &aspects_map,
                    brand: draft.brand.as_deref(),
                    mpn: draft.part_number.as_deref(),
                    upc: draft.upc.as_deref(),
                    ean: draft.ean.as_deref(),
                    condition: request.condition.as_deref(),
                    quantity: request.quantity,
                });
                Ok(StageOutcome::new(
                    payload.clone(),
                    json!({
                        "sku": payload.sku,
                        "condition": payload.condition,
                        "quantity": payload.quantity,
                        "aspect_count": payload.aspects.len(),
                        "image_count": payload.images.len(),
                    }),
                ))
            })
            .await?;

        let receipt = self
            .capture_stage(Stage::Publishing, &mut stages, async {
                let receipt = match &self.marketplace_token {
                    Some(token) => publish_live(&payload, &category.category_id, token).await?,
                    None => {
                        let listing_id = simulated_listing_id();
                        PublishReceipt {
                            listing_id: listing_id.clone(),
                            offer_id: None,
                            listing_url: market_config::item_url(&listing_id),
                            simulated: true,
                        }
                    }
                };
                Ok(StageOutcome::new(
                    receipt.clone(),
                    json!({
                        "listing_id": receipt.listing_id,
                        "offer_id": receipt.offer_id,
                        "listing_url": receipt.listing_url,
                        "simulated": receipt.simulated,
                    }),
                ))
            })
            .await?;

        Ok(ListingResponse {
            sku: payload.sku.clone(),
            title: payload.title.clone(),
            category_id: category.category_id,
            category_name: category.category_name,
            aspects_included: payload.aspects.keys().cloned().collect(),
            listing_id: receipt.listing_id,
            listing_url: receipt.listing_url,
            success: true,
            stages,
        })
    }

    async fn capture_stage<T, Fut>(
        &self,
        stage: Stage,
        stages: &mut Vec<StageReport>,
        fut: Fut,
    ) -> Result<T, PipelineError>
    where
        Fut: Future<Output = Result<StageOutcome<T>, PipelineError>>,
    {
        let started = Instant::now();
        let outcome = fut.await?;
        let elapsed_ms = started.elapsed().as_millis();
        crate::metrics::stage_elapsed(stage.name(), elapsed_ms);
        stages.push(StageReport::new(stage.name(), elapsed_ms, outcome.output));
        Ok(outcome.value)
    }
}

#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub listing_id: String,
    pub offer_id: Option<String>,
    pub listing_url: String,
    pub simulated: bool,
}

async fn publish_live(
    payload: &ListingPayload,
    category_id: &str,
    access_token: &str,
) -> Result<PublishReceipt, PipelineError> {
    let inventory_request = assemble::inventory_request_from(payload);
    inventory::upsert_inventory_item(&payload.sku, &inventory_request, access_token)
        .await
        .map_err(|err| PipelineError::rejected(format!("inventory upsert: {err}")))?;

    let (create, update) = assemble::offer_requests_from(payload, category_id);
    let (listing_id, offer_id) = match offers::create_offer(&create, access_token).await {
        Ok(offer_id) => {
            let listing_id = offers::publish_offer(&offer_id, access_token)
                .await
                .map_err(|err| PipelineError::rejected(format!("publish offer: {err}")))?;
            (listing_id, Some(offer_id))
        }
        Err(OfferError::EntityExists) => {
            reconcile_existing_offer(&create, &update, access_token).await?
        }
        Err(err) => {
            return Err(PipelineError::rejected(format!("create offer: {err}")));
        }
    };

    let listing_id = if listing_id.is_empty() {
        simulated_listing_id()
    } else {
        listing_id
    };
    Ok(PublishReceipt {
        listing_url: market_config::item_url(&listing_id),
        listing_id,
        offer_id,
        simulated: false,
    })
}

// A concurrent run already created the offer for this SKU. Update it in
// place and re-publish; both runs converge on the same inventory record.
async fn reconcile_existing_offer(
    create_request: &CreateOfferRequest,
    update_request: &UpdateOfferRequest,
    access_token: &str,
) -> Result<(String, Option<String>), PipelineError> {
    let existing = offers::get_offers_by_sku(&create_request.sku, access_token)
        .await
        .map_err(|err| PipelineError::rejected(format!("offer lookup: {err}")))?;
    let candidate = existing
        .iter()
        .find(|offer| offer.marketplaceId.as_deref() == Some(&create_request.marketplace_id))
        .or_else(|| existing.first())
        .and_then(|offer| offer.offerId.clone())
        .ok_or_else(|| {
            PipelineError::rejected("no existing offer found for reconciliation")
        })?;

    if let Err(err) = offers::update_offer(&candidate, update_request, access_token).await {
        warn!(
            target = "lister.marketplace",
            offer_id = %candidate,
            error = %err,
            "offer_update_failed_withdraw_retry"
        );
        offers::withdraw_offer(&candidate, access_token)
            .await
            .map_err(|err| PipelineError::rejected(format!("withdraw offer: {err}")))?;
        offers::update_offer(&candidate, update_request, access_token)
            .await
            .map_err(|err| PipelineError::rejected(format!("update offer: {err}")))?;
    }

    let listing_id = offers::publish_offer(&candidate, access_token)
        .await
        .map_err(|err| PipelineError::rejected(format!("publish offer: {err}")))?;
    let listing_id = if listing_id.is_empty() {
        simulated_listing_id()
    } else {
        listing_id
    };
    Ok((listing_id, Some(candidate)))
}

fn simulated_listing_id() -> String {
    format!("SIM-{}", Uuid::new_v4().simple())
}

fn validate_external_id(raw: &str) -> Result<String, PipelineError> {
    let id = raw.trim();
    let well_formed = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if !well_formed {
        return Err(PipelineError::invalid_input(
            Stage::FetchingCatalog,
            format!("invalid external product identifier `{raw}`"),
        ));
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingRequest;

    fn request(id: &str) -> ListingRequest {
        ListingRequest {
            external_product_id: id.to_string(),
            condition: None,
            quantity: None,
        }
    }

    #[tokio::test]
    async fn offline_run_walks_every_stage() {
        let pipeline = Pipeline::offline();
        let response = pipeline.run(request("HDPH-001")).await.expect("run");
        let names: Vec<String> = response
            .stages
            .iter()
            .map(|stage| stage.name.clone())
            .collect();
        assert_eq!(
            names,
            vec![
                "fetching-catalog",
                "resolving-category",
                "fetching-aspects",
                "resolving-aspects",
                "generating-content",
                "assembling",
                "publishing",
            ]
        );
        assert!(response.success);
        assert_eq!(response.sku, "LSTR-HDPH-001");
        assert_eq!(response.category_name, "Consumer Electronics");
        assert!(response.aspects_included.contains(&"Brand".to_string()));
        assert!(!response.listing_url.is_empty());
    }

    #[tokio::test]
    async fn sku_is_stable_across_runs() {
        let pipeline = Pipeline::offline();
        let first = pipeline.run(request("HDPH-002")).await.expect("first run");
        let second = pipeline.run(request("HDPH-002")).await.expect("second run");
        assert_eq!(first.sku, second.sku);
    }

    #[tokio::test]
    async fn content_failure_keeps_catalog_title() {
        let pipeline = Pipeline::offline();
        let response = pipeline.run(request("HDPH-003")).await.expect("run");
        let content_stage = response
            .stages
            .iter()
            .find(|stage| stage.name == "generating-content")
            .expect("content stage");
        assert_eq!(content_stage.output["fallback"], json!(true));
        // demo catalog title survives unchanged
        assert_eq!(response.title, "Wireless Headphones HDPH-003");
    }

    #[tokio::test]
    async fn unresolved_required_aspect_is_reported_not_fatal() {
        let pipeline = Pipeline::offline();
        let response = pipeline.run(request("HDPH-004")).await.expect("run");
        // builtin electronics requirements include Connectivity, which the
        // demo record cannot satisfy
        assert!(!response.aspects_included.contains(&"Connectivity".to_string()));
        let resolve_stage = response
            .stages
            .iter()
            .find(|stage| stage.name == "resolving-aspects")
            .expect("resolve stage");
        assert_eq!(resolve_stage.output["missed"], json!(["Connectivity"]));
    }

    #[tokio::test]
    async fn condition_flows_into_assembled_payload() {
        let pipeline = Pipeline::offline();
        let mut req = request("HDPH-005");
        req.condition = Some("used_good".to_string());
        req.quantity = Some(2);
        let response = pipeline.run(req).await.expect("run");
        let assemble_stage = response
            .stages
            .iter()
            .find(|stage| stage.name == "assembling")
            .expect("assemble stage");
        assert_eq!(assemble_stage.output["condition"], json!("USED_GOOD"));
        assert_eq!(assemble_stage.output["quantity"], json!(2));
    }

    #[tokio::test]
    async fn absent_catalog_record_is_not_found() {
        let pipeline = Pipeline::offline();
        let err = pipeline
            .run(request("MISSING-42"))
            .await
            .expect_err("no record");
        assert_eq!(err.kind(), PipelineErrorKind::NotFound);
        assert_eq!(err.stage(), Stage::FetchingCatalog);
    }

    #[tokio::test]
    async fn title_without_category_match_is_undetermined() {
        let pipeline = Pipeline::offline();
        let err = pipeline
            .run(request("MISC-010"))
            .await
            .expect_err("no category");
        assert_eq!(err.kind(), PipelineErrorKind::CategoryUndetermined);
        assert_eq!(err.stage(), Stage::ResolvingCategory);
    }

    #[tokio::test]
    async fn malformed_identifier_is_rejected_up_front() {
        let pipeline = Pipeline::offline();
        let err = pipeline
            .run(request("not a valid id!"))
            .await
            .expect_err("should reject");
        assert_eq!(err.kind(), PipelineErrorKind::InvalidInput);
        assert_eq!(err.stage(), Stage::FetchingCatalog);
    }
}
