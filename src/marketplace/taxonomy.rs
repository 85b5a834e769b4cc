#![allow(non_snake_case)]

use crate::http::build_client;
use crate::marketplace::config::{CATEGORY_TREE_ID, ROOT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("taxonomy request failed: {0}")]
    Request(String),
}

/// Category picked for the run. Produced once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category_id: String,
    pub category_name: String,
}

/// One category-mandated attribute, as the metadata service reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AspectRequirement {
    pub name: String,
    pub required: bool,
}

// --- wire shapes (marketplace taxonomy API) ---

#[derive(Debug, Clone, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    categorySuggestions: Vec<SuggestionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct SuggestionEntry {
    category: SuggestionCategory,
}

#[derive(Debug, Clone, Deserialize)]
struct SuggestionCategory {
    categoryId: String,
    categoryName: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AspectsResponse {
    #[serde(default)]
    aspects: Vec<WireAspect>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireAspect {
    localizedAspectName: String,
    #[serde(default)]
    aspectConstraint: Option<WireAspectConstraint>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireAspectConstraint {
    #[serde(default)]
    aspectRequired: Option<bool>,
}

/// Ask the marketplace for the best category for a product title.
/// `Ok(None)` means the service had no suggestion at all.
pub async fn suggest_category(
    title: &str,
    access_token: &str,
) -> Result<Option<CategorySuggestion>, TaxonomyError> {
    let client = build_client();
    let url = format!(
        "{}/commerce/taxonomy/v1/category_tree/{}/get_category_suggestions",
        *ROOT, *CATEGORY_TREE_ID
    );
    let response = client
        .get(url)
        .query(&[("q", title)])
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|err| TaxonomyError::Request(err.to_string()))?;

    if !response.status().is_success() {
        return Err(TaxonomyError::Request(format!(
            "HTTP {}",
            response.status()
        )));
    }

    let payload: SuggestionResponse = response
        .json()
        .await
        .map_err(|err| TaxonomyError::Request(err.to_string()))?;

    Ok(payload.categorySuggestions.into_iter().next().map(|entry| {
        CategorySuggestion {
            category_id: entry.category.categoryId,
            category_name: entry.category.categoryName,
        }
    }))
}

/// Fetch the required/optional aspect list for a category.
pub async fn fetch_category_aspects(
    category_id: &str,
    access_token: &str,
) -> Result<Vec<AspectRequirement>, TaxonomyError> {
    let client = build_client();
    let url = format!(
        "{}/commerce/taxonomy/v1/category_tree/{}/get_item_aspects_for_category",
        *ROOT, *CATEGORY_TREE_ID
    );
    let response = client
        .get(url)
        .query(&[("category_id", category_id)])
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|err| TaxonomyError::Request(err.to_string()))?;

    if !response.status().is_success() {
        return Err(TaxonomyError::Request(format!(
            "HTTP {}",
            response.status()
        )));
    }

    let payload: AspectsResponse = response
        .json()
        .await
        .map_err(|err| TaxonomyError::Request(err.to_string()))?;

    Ok(payload
        .aspects
        .into_iter()
        .map(|aspect| AspectRequirement {
            name: aspect.localizedAspectName,
            required: aspect
                .aspectConstraint
                .and_then(|constraint| constraint.aspectRequired)
                .unwrap_or(false),
        })
        .filter(|requirement| !requirement.name.trim().is_empty())
        .collect())
}

// --- built-in pool for runs without marketplace access ---

pub struct CategoryDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub keywords: &'static [&'static str],
    pub required_aspects: &'static [&'static str],
    pub optional_aspects: &'static [&'static str],
}

pub const CATEGORY_POOL: [CategoryDefinition; 5] = [
    CategoryDefinition {
        id: "31387",
        label: "Consumer Electronics",
        keywords: &["headphones", "speaker", "camera", "charger", "electronics"],
        required_aspects: &["Brand", "Connectivity"],
        optional_aspects: &["Color", "Model"],
    },
    CategoryDefinition {
        id: "11450",
        label: "Clothing, Shoes & Accessories",
        keywords: &["shoe", "sneaker", "jacket", "shirt", "apparel"],
        required_aspects: &["Brand", "Size"],
        optional_aspects: &["Color", "Material"],
    },
    CategoryDefinition {
        id: "261178",
        label: "Collectibles",
        keywords: &["collectible", "vintage", "retro", "figurine"],
        required_aspects: &["Brand"],
        optional_aspects: &["Material", "Color"],
    },
    CategoryDefinition {
        id: "281",
        label: "Motors Parts & Accessories",
        keywords: &["brake", "filter", "spark", "motor", "bumper"],
        required_aspects: &["Brand", "Manufacturer Part Number"],
        optional_aspects: &["Material"],
    },
    CategoryDefinition {
        id: "293",
        label: "Health & Beauty",
        keywords: &["serum", "shampoo", "lotion", "fragrance", "beauty"],
        required_aspects: &["Brand"],
        optional_aspects: &["Size", "Item Size"],
    },
];

/// Keyword match over the built-in pool; first category with a keyword hit
/// in the title wins. No hit means no suggestion.
pub fn suggest_from_pool(title: &str) -> Option<CategorySuggestion> {
    let haystack = title.to_lowercase();
    CATEGORY_POOL
        .iter()
        .find(|definition| {
            definition
                .keywords
                .iter()
                .any(|keyword| haystack.contains(keyword))
        })
        .map(|definition| CategorySuggestion {
            category_id: definition.id.to_string(),
            category_name: definition.label.to_string(),
        })
}

pub fn builtin_requirements(category_id: &str) -> Vec<AspectRequirement> {
    let Some(definition) = CATEGORY_POOL
        .iter()
        .find(|definition| definition.id == category_id)
    else {
        return Vec::new();
    };
    let required = definition.required_aspects.iter().map(|name| AspectRequirement {
        name: name.to_string(),
        required: true,
    });
    let optional = definition.optional_aspects.iter().map(|name| AspectRequirement {
        name: name.to_string(),
        required: false,
    });
    required.chain(optional).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_matches_title_keywords() {
        let suggestion = suggest_from_pool("Wireless Headphones XL").expect("suggestion");
        assert_eq!(suggestion.category_id, "31387");
        assert_eq!(suggestion.category_name, "Consumer Electronics");
    }

    #[test]
    fn pool_returns_none_without_keyword_hit() {
        assert!(suggest_from_pool("Quantum flux capacitor doohickey").is_none());
    }

    #[test]
    fn builtin_requirements_flag_required_aspects() {
        let requirements = builtin_requirements("31387");
        let brand = requirements.iter().find(|r| r.name == "Brand").unwrap();
        let color = requirements.iter().find(|r| r.name == "Color").unwrap();
        assert!(brand.required);
        assert!(!color.required);
    }
}
