use crate::http::build_client;
use regex::{Regex, RegexBuilder};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// A learned inference rule as stored: when the keyword rule matches a
/// product title, `aspect_value` is a usable value for `aspect_name`.
/// `category_id = None` marks a universal pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct LearnedPatternRow {
    pub aspect_name: String,
    pub aspect_value: String,
    pub keyword_pattern: String,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("empty keyword pattern")]
    EmptyPattern,
    #[error("unknown match type `{0}`")]
    UnknownMatchType(String),
    #[error("invalid regex: {0}")]
    InvalidRegex(String),
}

/// Typed match rule, validated when patterns are loaded so match time never
/// sees a malformed rule.
#[derive(Debug, Clone)]
pub enum MatchRule {
    Substring(String),
    Exact(String),
    Regex(Regex),
}

impl MatchRule {
    pub fn parse(match_type: Option<&str>, pattern: &str) -> Result<Self, PatternError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }
        match match_type.map(|value| value.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("substring") => Ok(Self::Substring(pattern.to_lowercase())),
            Some("exact") => Ok(Self::Exact(normalize_text(pattern))),
            Some("regex") => RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(Self::Regex)
                .map_err(|err| PatternError::InvalidRegex(err.to_string())),
            Some(other) => Err(PatternError::UnknownMatchType(other.to_string())),
        }
    }

    pub fn matches(&self, title: &str) -> bool {
        match self {
            Self::Substring(needle) => title.to_lowercase().contains(needle),
            Self::Exact(expected) => normalize_text(title) == *expected,
            Self::Regex(re) => re.is_match(title),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub aspect_name: String,
    pub aspect_value: String,
    pub rule: MatchRule,
    pub category_id: Option<String>,
}

/// Compile stored rows into typed rules. Malformed rows are dropped with a
/// warning; a bad pattern must never fail a listing run.
pub fn compile_patterns(rows: Vec<LearnedPatternRow>) -> Vec<CompiledPattern> {
    let mut compiled = Vec::with_capacity(rows.len());
    for row in rows {
        match MatchRule::parse(row.match_type.as_deref(), &row.keyword_pattern) {
            Ok(rule) => compiled.push(CompiledPattern {
                aspect_name: row.aspect_name,
                aspect_value: row.aspect_value,
                rule,
                category_id: row.category_id.filter(|id| !id.trim().is_empty()),
            }),
            Err(err) => {
                warn!(
                    target = "lister.aspects",
                    aspect = %row.aspect_name,
                    pattern = %row.keyword_pattern,
                    error = %err,
                    "learned_pattern_rejected"
                );
            }
        }
    }
    compiled
}

fn normalize_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
pub struct PatternStore {
    base_url: String,
    api_key: String,
    http: Client,
}

#[derive(Debug, Error)]
pub enum PatternStoreError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Deserialize(String),
}

impl PatternStore {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("PATTERN_STORE_URL").ok()?;
        let api_key = std::env::var("PATTERN_STORE_KEY").ok()?;
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http: build_client(),
        })
    }

    /// Read patterns applicable to a category: category-specific rows plus
    /// universal rows (null category).
    pub async fn fetch_for_category(
        &self,
        category_id: &str,
    ) -> Result<Vec<LearnedPatternRow>, PatternStoreError> {
        let url = format!(
            "{}/rest/v1/learned_patterns?or=(category_id.eq.{},category_id.is.null)&select=*",
            self.base_url,
            urlencoding::encode(category_id)
        );
        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|err| PatternStoreError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PatternStoreError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|err| PatternStoreError::Deserialize(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        aspect: &str,
        value: &str,
        pattern: &str,
        match_type: Option<&str>,
        category: Option<&str>,
    ) -> LearnedPatternRow {
        LearnedPatternRow {
            aspect_name: aspect.to_string(),
            aspect_value: value.to_string(),
            keyword_pattern: pattern.to_string(),
            match_type: match_type.map(|value| value.to_string()),
            category_id: category.map(|value| value.to_string()),
        }
    }

    #[test]
    fn substring_rule_is_case_insensitive() {
        let rule = MatchRule::parse(None, "Bluetooth").unwrap();
        assert!(rule.matches("ACME BLUETOOTH speaker"));
        assert!(!rule.matches("wired speaker"));
    }

    #[test]
    fn exact_rule_normalizes_whitespace() {
        let rule = MatchRule::parse(Some("exact"), "wireless  headphones").unwrap();
        assert!(rule.matches("Wireless Headphones"));
        assert!(!rule.matches("Wireless Headphones XL"));
    }

    #[test]
    fn regex_rule_matches_title() {
        let rule = MatchRule::parse(Some("regex"), r"\b(bt|bluetooth)\b").unwrap();
        assert!(rule.matches("Acme BT headset"));
    }

    #[test]
    fn malformed_rows_are_dropped_not_fatal() {
        let rows = vec![
            row("Connectivity", "Bluetooth", "(unclosed", Some("regex"), None),
            row("Connectivity", "Wired", "wired", None, None),
            row("Connectivity", "", "", None, None),
        ];
        let compiled = compile_patterns(rows);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].aspect_value, "Wired");
    }
}
