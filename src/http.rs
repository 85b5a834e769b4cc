use reqwest::Client;
use std::time::Duration;

pub fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(env_secs("HTTP_TIMEOUT_SECS", 15)))
        .connect_timeout(Duration::from_secs(env_secs("HTTP_CONNECT_TIMEOUT_SECS", 5)))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}
