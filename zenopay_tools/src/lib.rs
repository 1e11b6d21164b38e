//! # ZenoPay tools
//!
//! A thin client for the ZenoPay mobile-money API. The payment server uses it to push a payment prompt to a buyer's
//! phone. Final payment outcomes are not fetched from here; ZenoPay delivers them asynchronously to the webhook URL
//! supplied with each order.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::ZenoPayApi;
pub use config::ZenoPayConfig;
pub use data_objects::MobileMoneyOrder;
pub use error::ZenoPayApiError;
