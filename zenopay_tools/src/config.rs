use std::time::Duration;

use log::*;
use zpg_common::{parse_env, Secret};

pub const DEFAULT_ZENOPAY_BASE_URL: &str = "https://zenoapi.com";
pub const DEFAULT_ZENOPAY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ZenoPayConfig {
    /// The root of the ZenoPay API, e.g. "https://zenoapi.com"
    pub base_url: String,
    pub api_key: Secret<String>,
    /// Upper bound on a single call to ZenoPay. Calls that take longer are reported as unreachable.
    pub timeout: Duration,
}

impl Default for ZenoPayConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_ZENOPAY_BASE_URL.to_string(), api_key: Secret::default(), timeout: DEFAULT_ZENOPAY_TIMEOUT }
    }
}

impl ZenoPayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("ZPG_ZENOPAY_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ ZPG_ZENOPAY_BASE_URL not set, using {DEFAULT_ZENOPAY_BASE_URL} as default");
            DEFAULT_ZENOPAY_BASE_URL.to_string()
        });
        // No fallback key. ZenoPay rejects every order until this is set.
        let api_key = Secret::new(std::env::var("ZPG_ZENOPAY_API_KEY").unwrap_or_else(|_| {
            error!("🪛️ ZPG_ZENOPAY_API_KEY is not set. Payment requests will fail until it is configured.");
            String::default()
        }));
        let timeout = match parse_env("ZPG_PROVIDER_TIMEOUT", DEFAULT_ZENOPAY_TIMEOUT.as_secs()) {
            0 => DEFAULT_ZENOPAY_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        Self { base_url, api_key, timeout }
    }
}
