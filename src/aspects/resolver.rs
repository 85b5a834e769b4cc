use crate::aspects::misses::AspectMissRecord;
use crate::aspects::patterns::CompiledPattern;
use crate::catalog::ProductDraft;
use crate::marketplace::{AspectRequirement, CategorySuggestion};
use std::collections::BTreeMap;

/// Result of a resolution pass: the augmented aspect map plus the miss
/// records for required aspects nothing could fill. Pure output; persisting
/// the misses is the caller's concern.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub aspects: BTreeMap<String, Vec<String>>,
    pub misses: Vec<AspectMissRecord>,
}

/// Fill category aspects from the draft, walking a fixed precedence chain
/// per requirement:
///
/// 1. value already in the draft's aspect map — final, skip;
/// 2. direct field alias (case-insensitive table over catalog fields);
/// 3. learned patterns, category-specific before universal, first title
///    match wins;
/// 4. required and still empty — record a miss; optional — omit silently.
pub fn resolve_aspects(
    draft: &ProductDraft,
    requirements: &[AspectRequirement],
    patterns: &[CompiledPattern],
    category: &CategorySuggestion,
    external_product_id: &str,
) -> Resolution {
    let mut aspects = draft.aspects.clone();
    let mut misses = Vec::new();

    for requirement in requirements {
        let name = requirement.name.trim();
        if name.is_empty() || has_aspect(&aspects, name) {
            continue;
        }

        if let Some(value) = direct_field_value(draft, name) {
            aspects.insert(name.to_string(), vec![value.to_string()]);
            continue;
        }

        if let Some(value) = match_patterns(patterns, name, &category.category_id, &draft.title) {
            aspects.insert(name.to_string(), vec![value]);
            continue;
        }

        if requirement.required {
            misses.push(AspectMissRecord::pending(
                external_product_id,
                name,
                &draft.title,
                &category.category_id,
                &category.category_name,
                draft.brand.as_deref(),
                draft.model.as_deref(),
            ));
        }
    }

    Resolution { aspects, misses }
}

// First-writer-wins is keyed case-insensitively so "brand" never shadows an
// existing "Brand" entry with a second value.
fn has_aspect(aspects: &BTreeMap<String, Vec<String>>, name: &str) -> bool {
    let wanted = normalize_name(name);
    aspects.keys().any(|key| normalize_name(key) == wanted)
}

/// Alias table mapping aspect names onto catalog fields the transformer did
/// not already copy under that exact name.
fn direct_field_value<'a>(draft: &'a ProductDraft, aspect_name: &str) -> Option<&'a str> {
    let field = match normalize_name(aspect_name).as_str() {
        "mpn" | "manufacturer part number" | "part number" => &draft.part_number,
        "size" | "item size" => &draft.size,
        "material" | "material type" => &draft.material,
        "model" | "model name" | "model number" => &draft.model,
        "color" | "colour" | "main color" => &draft.color,
        "brand" | "brand name" => &draft.brand,
        "manufacturer" => &draft.manufacturer,
        "upc" => &draft.upc,
        "ean" => &draft.ean,
        _ => return None,
    };
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn match_patterns(
    patterns: &[CompiledPattern],
    aspect_name: &str,
    category_id: &str,
    title: &str,
) -> Option<String> {
    let wanted = normalize_name(aspect_name);
    let mut candidates: Vec<&CompiledPattern> = patterns
        .iter()
        .filter(|pattern| normalize_name(&pattern.aspect_name) == wanted)
        .filter(|pattern| match pattern.category_id.as_deref() {
            Some(id) => id == category_id,
            None => true,
        })
        .collect();
    // Category-specific rules outrank universal ones; ties keep store order.
    candidates.sort_by_key(|pattern| pattern.category_id.is_none());

    candidates
        .into_iter()
        .find(|pattern| pattern.rule.matches(title))
        .map(|pattern| pattern.aspect_value.clone())
}

fn normalize_name(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspects::patterns::{LearnedPatternRow, compile_patterns};
    use crate::catalog::record::CatalogRecord;
    use crate::catalog::transform::build_draft;

    fn category() -> CategorySuggestion {
        CategorySuggestion {
            category_id: "31387".to_string(),
            category_name: "Consumer Electronics".to_string(),
        }
    }

    fn requirement(name: &str, required: bool) -> AspectRequirement {
        AspectRequirement {
            name: name.to_string(),
            required,
        }
    }

    fn pattern_row(
        aspect: &str,
        value: &str,
        keyword: &str,
        category: Option<&str>,
    ) -> LearnedPatternRow {
        LearnedPatternRow {
            aspect_name: aspect.to_string(),
            aspect_value: value.to_string(),
            keyword_pattern: keyword.to_string(),
            match_type: None,
            category_id: category.map(|value| value.to_string()),
        }
    }

    fn headphones_draft() -> ProductDraft {
        let record = CatalogRecord {
            title: Some("Wireless Headphones XL".into()),
            brand: Some("Acme".into()),
            color: Some("Black".into()),
            ..CatalogRecord::default()
        };
        build_draft("EXT-1", &record)
    }

    #[test]
    fn catalog_value_wins_over_learned_pattern() {
        let draft = headphones_draft();
        let patterns = compile_patterns(vec![pattern_row("Brand", "OffBrand", "wireless", None)]);
        let resolution = resolve_aspects(
            &draft,
            &[requirement("Brand", true)],
            &patterns,
            &category(),
            "EXT-1",
        );
        assert_eq!(
            resolution.aspects.get("Brand"),
            Some(&vec!["Acme".to_string()])
        );
        assert!(resolution.misses.is_empty());
    }

    #[test]
    fn direct_alias_maps_catalog_field() {
        let record = CatalogRecord {
            title: Some("Brake pads".into()),
            part_number: Some("BP-553".into()),
            ..CatalogRecord::default()
        };
        let draft = build_draft("EXT-2", &record);
        let resolution = resolve_aspects(
            &draft,
            &[requirement("Manufacturer Part Number", true)],
            &[],
            &category(),
            "EXT-2",
        );
        assert_eq!(
            resolution.aspects.get("Manufacturer Part Number"),
            Some(&vec!["BP-553".to_string()])
        );
    }

    #[test]
    fn category_specific_pattern_beats_universal() {
        let draft = headphones_draft();
        let patterns = compile_patterns(vec![
            pattern_row("Connectivity", "Wired", "wireless", None),
            pattern_row("Connectivity", "Bluetooth", "wireless", Some("31387")),
        ]);
        let resolution = resolve_aspects(
            &draft,
            &[requirement("Connectivity", true)],
            &patterns,
            &category(),
            "EXT-1",
        );
        assert_eq!(
            resolution.aspects.get("Connectivity"),
            Some(&vec!["Bluetooth".to_string()])
        );
    }

    #[test]
    fn other_category_patterns_are_ignored() {
        let draft = headphones_draft();
        let patterns = compile_patterns(vec![pattern_row(
            "Connectivity",
            "Bluetooth",
            "wireless",
            Some("11450"),
        )]);
        let resolution = resolve_aspects(
            &draft,
            &[requirement("Connectivity", false)],
            &patterns,
            &category(),
            "EXT-1",
        );
        assert!(!resolution.aspects.contains_key("Connectivity"));
    }

    #[test]
    fn required_miss_recorded_optional_omitted() {
        let draft = headphones_draft();
        let resolution = resolve_aspects(
            &draft,
            &[
                requirement("Connectivity", true),
                requirement("Battery Life", false),
            ],
            &[],
            &category(),
            "EXT-1",
        );
        assert_eq!(resolution.misses.len(), 1);
        let miss = &resolution.misses[0];
        assert_eq!(miss.aspect_name, "Connectivity");
        assert_eq!(miss.status, "pending");
        assert_eq!(miss.source_brand.as_deref(), Some("Acme"));
        assert!(!resolution.aspects.contains_key("Battery Life"));
    }

    #[test]
    fn empty_requirements_keep_draft_aspects_without_misses() {
        let draft = headphones_draft();
        let resolution = resolve_aspects(&draft, &[], &[], &category(), "EXT-1");
        assert_eq!(resolution.aspects, draft.aspects);
        assert!(resolution.misses.is_empty());
    }

    #[test]
    fn end_to_end_headphones_example() {
        let draft = headphones_draft();
        let resolution = resolve_aspects(
            &draft,
            &[requirement("Brand", true), requirement("Connectivity", true)],
            &[],
            &category(),
            "EXT-1",
        );
        assert_eq!(
            resolution.aspects.get("Brand"),
            Some(&vec!["Acme".to_string()])
        );
        assert!(!resolution.aspects.contains_key("Connectivity"));
        assert_eq!(resolution.misses.len(), 1);
        assert_eq!(resolution.misses[0].aspect_name, "Connectivity");
    }
}
