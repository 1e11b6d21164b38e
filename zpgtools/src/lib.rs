//! # zpgtools
//!
//! Client-side tooling for the Zeno payment server: an HTTP client for the server's API, and the status poller that
//! storefronts run after starting a payment.
pub mod client;
pub mod config;
pub mod poller;

pub use client::PaymentServerClient;
pub use config::ClientConfig;
pub use poller::{PollHandle, PollOutcome, PollerConfig, StatusPoller, StatusSource};
