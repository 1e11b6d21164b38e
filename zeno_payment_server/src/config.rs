//! Server configuration
//!
//! Everything is read from `ZPG_*` environment variables (see `cli-help.txt`). Invalid values are logged and replaced
//! with their defaults, so the server always starts.
use std::env;

use chrono::Duration;
use log::*;
use zenopay_tools::ZenoPayConfig;
use zeno_payment_engine::{
    traits::CallbackUrls,
    PaymentSettings,
    DEFAULT_BUYER_EMAIL,
    DEFAULT_BUYER_NAME,
    DEFAULT_DEDUP_WINDOW_MINUTES,
    DEFAULT_MINIMUM_AMOUNT,
};
use zpg_common::{parse_boolean_flag, parse_env, Secret, Shillings};

const DEFAULT_ZPG_HOST: &str = "127.0.0.1";
const DEFAULT_ZPG_PORT: u16 = 8370;
const DEFAULT_ORDER_RETENTION_HOURS: i64 = 48;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;
pub const DEFAULT_WEBHOOK_HMAC_HEADER: &str = "X-Zeno-Signature";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Selects [`Self::public_url`] as the base for provider callback urls.
    pub production: bool,
    pub public_url: Option<String>,
    /// The base for callback urls outside production. Defaults to `http://{host}:{port}`.
    pub dev_url: Option<String>,
    /// If set, orders are kept in this SQLite database. Otherwise they live in memory.
    pub database_url: Option<String>,
    pub minimum_amount: Shillings,
    pub default_buyer_email: String,
    pub default_buyer_name: String,
    pub idempotency_window: Duration,
    /// Orders older than this are removed by the expiry worker. `None` keeps orders for the life of the process.
    pub order_retention: Option<Duration>,
    pub event_buffer_size: usize,
    pub webhook: WebhookConfig,
    pub zenopay: ZenoPayConfig,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// If false, webhook calls are accepted without a signature.
    pub hmac_checks: bool,
    pub hmac_secret: Secret<String>,
    pub hmac_header: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { hmac_checks: false, hmac_secret: Secret::default(), hmac_header: DEFAULT_WEBHOOK_HMAC_HEADER.to_string() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ZPG_HOST.to_string(),
            port: DEFAULT_ZPG_PORT,
            production: false,
            public_url: None,
            dev_url: None,
            database_url: None,
            minimum_amount: Shillings::from(DEFAULT_MINIMUM_AMOUNT),
            default_buyer_email: DEFAULT_BUYER_EMAIL.to_string(),
            default_buyer_name: DEFAULT_BUYER_NAME.to_string(),
            idempotency_window: Duration::minutes(DEFAULT_DEDUP_WINDOW_MINUTES),
            order_retention: Some(Duration::hours(DEFAULT_ORDER_RETENTION_HOURS)),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            webhook: WebhookConfig::default(),
            zenopay: ZenoPayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ZPG_HOST").ok().unwrap_or_else(|| DEFAULT_ZPG_HOST.into());
        let port = parse_env("ZPG_PORT", DEFAULT_ZPG_PORT);
        let production = parse_boolean_flag(env::var("ZPG_PRODUCTION").ok(), false);
        let public_url = env::var("ZPG_PUBLIC_URL").ok().filter(|s| !s.trim().is_empty());
        if production && public_url.is_none() {
            warn!(
                "🪛️ ZPG_PRODUCTION is set, but ZPG_PUBLIC_URL is not. ZenoPay will not be able to reach the webhook \
                 until it is."
            );
        }
        let dev_url = env::var("ZPG_DEV_URL").ok().filter(|s| !s.trim().is_empty());
        let database_url = env::var("ZPG_DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        match &database_url {
            Some(url) => info!("🪛️ Orders will be stored in {url}"),
            None => info!("🪛️ ZPG_DATABASE_URL is not set. Orders will be kept in memory."),
        }
        let minimum_amount = Shillings::from(parse_env("ZPG_MINIMUM_AMOUNT", DEFAULT_MINIMUM_AMOUNT));
        let default_buyer_email =
            env::var("ZPG_DEFAULT_BUYER_EMAIL").ok().unwrap_or_else(|| DEFAULT_BUYER_EMAIL.to_string());
        let default_buyer_name =
            env::var("ZPG_DEFAULT_BUYER_NAME").ok().unwrap_or_else(|| DEFAULT_BUYER_NAME.to_string());
        let idempotency_window =
            Duration::minutes(parse_env("ZPG_IDEMPOTENCY_WINDOW", DEFAULT_DEDUP_WINDOW_MINUTES));
        let order_retention = match parse_env("ZPG_ORDER_RETENTION", DEFAULT_ORDER_RETENTION_HOURS) {
            hrs if hrs <= 0 => {
                info!("🪛️ Order retention is disabled. Orders will not be removed.");
                None
            },
            hrs => Some(Duration::hours(hrs)),
        };
        let event_buffer_size = parse_env("ZPG_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE).max(1);
        let webhook = WebhookConfig::from_env_or_default();
        let zenopay = ZenoPayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            production,
            public_url,
            dev_url,
            database_url,
            minimum_amount,
            default_buyer_email,
            default_buyer_name,
            idempotency_window,
            order_retention,
            event_buffer_size,
            webhook,
            zenopay,
        }
    }

    /// The root url that ZenoPay and the buyer's browser use to reach this server.
    pub fn base_url(&self) -> String {
        let url = if self.production {
            self.public_url.clone()
        } else {
            self.dev_url.clone()
        };
        url.unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }

    pub fn payment_settings(&self) -> PaymentSettings {
        PaymentSettings {
            minimum_amount: self.minimum_amount,
            default_buyer_email: self.default_buyer_email.clone(),
            default_buyer_name: self.default_buyer_name.clone(),
            dedup_window: self.idempotency_window,
            callbacks: CallbackUrls::for_base_url(&self.base_url()),
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_checks = parse_boolean_flag(env::var("ZPG_WEBHOOK_HMAC_CHECKS").ok(), false);
        let hmac_secret = Secret::new(env::var("ZPG_WEBHOOK_HMAC_SECRET").ok().unwrap_or_default());
        if hmac_checks && hmac_secret.is_empty() {
            error!(
                "🪛️ ZPG_WEBHOOK_HMAC_CHECKS is on, but ZPG_WEBHOOK_HMAC_SECRET is not set. Every webhook call will be \
                 refused."
            );
        }
        let hmac_header =
            env::var("ZPG_WEBHOOK_HMAC_HEADER").ok().unwrap_or_else(|| DEFAULT_WEBHOOK_HMAC_HEADER.to_string());
        Self { hmac_checks, hmac_secret, hmac_header }
    }
}
