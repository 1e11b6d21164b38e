//! # Zeno payment engine public API
//!
//! [`payment_flow_api::PaymentFlowApi`] is what the HTTP layer talks to. An API instance is created by supplying an
//! order store backend and a payment provider:
//!
//! ```rust,ignore
//! use zeno_payment_engine::{MemoryOrderStore, PaymentFlowApi, PaymentSettings};
//! let api = PaymentFlowApi::new(MemoryOrderStore::new(), provider, PaymentSettings::default(), producers);
//! let payment = api.initiate_payment(purchase_request).await?;
//! ```
//!
//! The other submodules hold the request/response objects and the API's error type.
pub mod errors;
pub mod payment_flow_api;
pub mod payment_objects;
