use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Raw catalog record as the upstream catalog service returns it. Everything
/// is optional; the transformer decides what a usable draft looks like.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// Structured image set; each entry carries size variants.
    #[serde(default)]
    pub images: Vec<CatalogImage>,
    /// Legacy delimited filename list, used when `images` is empty.
    pub image_list: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub part_number: Option<String>,
    pub upc: Option<String>,
    pub ean: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogImage {
    pub large: Option<String>,
    pub medium: Option<String>,
}

impl CatalogImage {
    /// Preferred variant: large, then medium.
    pub fn best(&self) -> Option<&str> {
        self.large
            .as_deref()
            .or(self.medium.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}
