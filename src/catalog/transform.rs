use crate::catalog::record::CatalogRecord;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Marketplace listing-title ceiling.
pub const MAX_TITLE_LEN: usize = 80;
/// Marketplace image ceiling per listing.
pub const MAX_IMAGES: usize = 12;

const PLACEHOLDER_DESCRIPTION: &str =
    "Please refer to the photos and product title for details about this item.";

static MEDIA_BASE_URL: Lazy<String> = Lazy::new(|| {
    std::env::var("MEDIA_BASE_URL").unwrap_or_else(|_| "https://cdn.example.com/media".to_string())
});

/// Normalized product draft built once from the raw catalog record.
/// The aspect map is the only part that grows later, and only through the
/// resolver's returned copy.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub part_number: Option<String>,
    pub upc: Option<String>,
    pub ean: Option<String>,
    pub features: Vec<String>,
    pub aspects: BTreeMap<String, Vec<String>>,
}

pub fn build_draft(external_id: &str, record: &CatalogRecord) -> ProductDraft {
    let title = record
        .title
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| truncate(value, MAX_TITLE_LEN))
        .unwrap_or_else(|| truncate(&format!("Catalog item {external_id}"), MAX_TITLE_LEN));

    let description = build_description(record);
    let images = build_images(record);

    let mut aspects = BTreeMap::new();
    seed_aspect(&mut aspects, "Brand", record.brand.as_deref());
    seed_aspect(&mut aspects, "Model", record.model.as_deref());
    seed_aspect(&mut aspects, "Color", record.color.as_deref());
    seed_aspect(&mut aspects, "Manufacturer", record.manufacturer.as_deref());
    seed_aspect(&mut aspects, "MPN", record.part_number.as_deref());
    seed_aspect(&mut aspects, "UPC", record.upc.as_deref());

    ProductDraft {
        title,
        description,
        images,
        brand: clean(record.brand.as_deref()),
        model: clean(record.model.as_deref()),
        manufacturer: clean(record.manufacturer.as_deref()),
        color: clean(record.color.as_deref()),
        size: clean(record.size.as_deref()),
        material: clean(record.material.as_deref()),
        part_number: clean(record.part_number.as_deref()),
        upc: clean(record.upc.as_deref()),
        ean: clean(record.ean.as_deref()),
        features: record
            .features
            .iter()
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect(),
        aspects,
    }
}

fn build_description(record: &CatalogRecord) -> String {
    if let Some(text) = record
        .description
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return text.to_string();
    }

    let bullets: Vec<&str> = record
        .features
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .collect();
    if !bullets.is_empty() {
        let items: String = bullets
            .iter()
            .map(|entry| format!("<li>{entry}</li>"))
            .collect();
        return format!("<ul>{items}</ul>");
    }

    PLACEHOLDER_DESCRIPTION.to_string()
}

fn build_images(record: &CatalogRecord) -> Vec<String> {
    let mut urls: Vec<String> = record
        .images
        .iter()
        .filter_map(|image| image.best())
        .map(media_url)
        .collect();
    // structured entries may all lack a usable variant
    if urls.is_empty() {
        urls = record
            .image_list
            .as_deref()
            .map(split_filenames)
            .unwrap_or_default()
            .into_iter()
            .map(|name| media_url(&name))
            .collect();
    }
    urls.truncate(MAX_IMAGES);
    urls
}

fn split_filenames(raw: &str) -> Vec<String> {
    raw.split([',', ';', '|', '\n'])
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

fn media_url(name: &str) -> String {
    if name.starts_with("http://") || name.starts_with("https://") {
        name.to_string()
    } else {
        format!(
            "{}/{}",
            MEDIA_BASE_URL.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    }
}

fn seed_aspect(aspects: &mut BTreeMap<String, Vec<String>>, name: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
        aspects.insert(name.to_string(), vec![value.to_string()]);
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

/// Clamp any candidate title to the marketplace ceiling. Applied to catalog
/// titles and to rewritten ones, so the limit holds whichever source wins.
pub fn truncate_title(value: &str) -> String {
    truncate(value, MAX_TITLE_LEN)
}

fn truncate(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        value.to_string()
    } else {
        value
            .chars()
            .take(limit)
            .collect::<String>()
            .trim_end()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::record::CatalogImage;

    fn record_with_title(title: &str) -> CatalogRecord {
        CatalogRecord {
            title: Some(title.to_string()),
            ..CatalogRecord::default()
        }
    }

    #[test]
    fn title_is_truncated_to_marketplace_limit() {
        let long = "X".repeat(200);
        let draft = build_draft("EXT-1", &record_with_title(&long));
        assert_eq!(draft.title.chars().count(), MAX_TITLE_LEN);
    }

    #[test]
    fn description_falls_back_to_feature_bullets() {
        let record = CatalogRecord {
            title: Some("Widget".into()),
            features: vec!["Durable".into(), "Lightweight".into()],
            ..CatalogRecord::default()
        };
        let draft = build_draft("EXT-1", &record);
        assert_eq!(draft.description, "<ul><li>Durable</li><li>Lightweight</li></ul>");
    }

    #[test]
    fn description_never_empty() {
        let draft = build_draft("EXT-1", &record_with_title("Widget"));
        assert_eq!(draft.description, PLACEHOLDER_DESCRIPTION);
    }

    #[test]
    fn structured_images_prefer_large_variant() {
        let record = CatalogRecord {
            title: Some("Widget".into()),
            images: vec![
                CatalogImage {
                    large: Some("https://img.example.com/a-large.jpg".into()),
                    medium: Some("https://img.example.com/a-medium.jpg".into()),
                },
                CatalogImage {
                    large: None,
                    medium: Some("https://img.example.com/b-medium.jpg".into()),
                },
            ],
            ..CatalogRecord::default()
        };
        let draft = build_draft("EXT-1", &record);
        assert_eq!(
            draft.images,
            vec![
                "https://img.example.com/a-large.jpg".to_string(),
                "https://img.example.com/b-medium.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn unusable_image_variants_fall_back_to_filename_list() {
        let record = CatalogRecord {
            title: Some("Widget".into()),
            images: vec![CatalogImage {
                large: None,
                medium: Some("   ".into()),
            }],
            image_list: Some("a.jpg;b.jpg".into()),
            ..CatalogRecord::default()
        };
        let draft = build_draft("EXT-1", &record);
        assert_eq!(draft.images.len(), 2);
        assert!(draft.images[0].ends_with("/a.jpg"));
    }

    #[test]
    fn image_cap_preserves_source_order() {
        let names: Vec<String> = (0..20).map(|idx| format!("img-{idx}.jpg")).collect();
        let record = CatalogRecord {
            title: Some("Widget".into()),
            image_list: Some(names.join(";")),
            ..CatalogRecord::default()
        };
        let draft = build_draft("EXT-1", &record);
        assert_eq!(draft.images.len(), MAX_IMAGES);
        assert!(draft.images[0].ends_with("img-0.jpg"));
        assert!(draft.images[11].ends_with("img-11.jpg"));
    }

    #[test]
    fn identifier_fields_seed_the_aspect_map() {
        let record = CatalogRecord {
            title: Some("Widget".into()),
            brand: Some("Acme".into()),
            color: Some("Black".into()),
            part_number: Some("PN-9".into()),
            model: None,
            ..CatalogRecord::default()
        };
        let draft = build_draft("EXT-1", &record);
        assert_eq!(draft.aspects.get("Brand"), Some(&vec!["Acme".to_string()]));
        assert_eq!(draft.aspects.get("Color"), Some(&vec!["Black".to_string()]));
        assert_eq!(draft.aspects.get("MPN"), Some(&vec!["PN-9".to_string()]));
        assert!(!draft.aspects.contains_key("Model"));
    }
}
