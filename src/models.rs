use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /listings`. The external product identifier names a record
/// in the upstream catalog; condition and quantity are optional seller hints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListingRequest {
    pub external_product_id: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ListingResponse {
    pub sku: String,
    pub title: String,
    pub category_id: String,
    pub category_name: String,
    pub aspects_included: Vec<String>,
    pub listing_id: String,
    pub listing_url: String,
    pub success: bool,
    pub stages: Vec<StageReport>,
}

/// One entry of the per-run transcript: what a stage produced and how long
/// it took.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StageReport {
    pub name: String,
    pub elapsed_ms: u128,
    pub timestamp: DateTime<Utc>,
    pub output: Value,
}

impl StageReport {
    pub fn new(name: &str, elapsed_ms: u128, output: Value) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms,
            timestamp: Utc::now(),
            output,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Internal condition vocabulary. The marketplace speaks its own condition
/// enum; the mapping is a static table and anything unrecognized lands on
/// `New` so a sloppy caller still produces a valid payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemCondition {
    #[default]
    New,
    OpenBox,
    Refurbished,
    LikeNew,
    Good,
    Acceptable,
    ForParts,
}

impl ItemCondition {
    pub fn from_input(input: Option<&str>) -> Self {
        let Some(raw) = input else {
            return Self::New;
        };
        match raw.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "new" => Self::New,
            "open_box" | "new_other" => Self::OpenBox,
            "refurbished" | "certified_refurbished" => Self::Refurbished,
            "like_new" | "used_like_new" => Self::LikeNew,
            "good" | "used_good" => Self::Good,
            "acceptable" | "used_acceptable" => Self::Acceptable,
            "for_parts" | "parts" | "not_working" => Self::ForParts,
            _ => Self::New,
        }
    }

    pub fn marketplace_code(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::OpenBox => "NEW_OTHER",
            Self::Refurbished => "CERTIFIED_REFURBISHED",
            Self::LikeNew => "LIKE_NEW",
            Self::Good => "USED_GOOD",
            Self::Acceptable => "USED_ACCEPTABLE",
            Self::ForParts => "FOR_PARTS_OR_NOT_WORKING",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_maps_known_inputs() {
        assert_eq!(
            ItemCondition::from_input(Some("used_good")).marketplace_code(),
            "USED_GOOD"
        );
        assert_eq!(
            ItemCondition::from_input(Some("Like New")).marketplace_code(),
            "LIKE_NEW"
        );
    }

    #[test]
    fn condition_defaults_to_new() {
        assert_eq!(
            ItemCondition::from_input(Some("mint-in-box-ish")).marketplace_code(),
            "NEW"
        );
        assert_eq!(ItemCondition::from_input(None).marketplace_code(), "NEW");
    }
}
