use once_cell::sync::Lazy;
use std::env;

pub static MARKET_ENV: Lazy<String> =
    Lazy::new(|| env::var("MARKETPLACE_ENV").unwrap_or_else(|_| "SANDBOX".to_string()));

pub static MARKETPLACE_ID: Lazy<String> =
    Lazy::new(|| env::var("MARKETPLACE_ID").unwrap_or_else(|_| "EBAY_US".to_string()));

pub static CATEGORY_TREE_ID: Lazy<String> =
    Lazy::new(|| env::var("MARKETPLACE_CATEGORY_TREE_ID").unwrap_or_else(|_| "0".to_string()));

pub static ROOT: Lazy<String> = Lazy::new(|| {
    if MARKET_ENV.as_str().eq_ignore_ascii_case("PROD") {
        "https://api.ebay.com".to_string()
    } else {
        "https://api.sandbox.ebay.com".to_string()
    }
});

/// Seller access token, minted by an out-of-scope OAuth flow. When unset the
/// publisher runs in simulated mode and no marketplace calls go out.
pub fn access_token() -> Option<String> {
    env::var("MARKETPLACE_ACCESS_TOKEN")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn item_url(listing_id: &str) -> String {
    if MARKET_ENV.as_str().eq_ignore_ascii_case("PROD") {
        format!("https://www.ebay.com/itm/{listing_id}")
    } else {
        format!("https://sandbox.ebay.com/itm/{listing_id}")
    }
}
