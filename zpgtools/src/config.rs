use std::{env, time::Duration};

use url::Url;
use zpg_common::{parse_env, Shillings};

use crate::poller::{PollerConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8370";
pub const DEFAULT_PRODUCT_PRICE: i64 = 30_000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: Url,
    /// The amount charged by `buy` when none is given.
    pub product_price: Shillings,
    pub poller: PollerConfig,
}

impl ClientConfig {
    pub fn from_env_or_default() -> Result<Self, url::ParseError> {
        let server_url = env::var("ZPG_SERVER_URL").ok().unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = Url::parse(&server_url)?;
        let product_price = Shillings::from(parse_env("ZPG_PRODUCT_PRICE", DEFAULT_PRODUCT_PRICE));
        let interval = parse_env("ZPG_POLL_INTERVAL", DEFAULT_POLL_INTERVAL.as_secs()).max(1);
        let max_attempts = parse_env("ZPG_POLL_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS).max(1);
        let poller = PollerConfig { interval: Duration::from_secs(interval), max_attempts };
        Ok(Self { server_url, product_price, poller })
    }
}
