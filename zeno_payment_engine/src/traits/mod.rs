//! # Backend contracts
//!
//! The payment flow talks to two collaborators through the traits in this module:
//!
//! * [`OrderStore`] keeps track of orders. It offers create, read and merge-update operations, plus eviction of old
//!   orders. Implementations must make each `merge_order` call atomic with respect to other calls on the same order,
//!   since the status lifecycle check and the write happen together.
//! * [`PaymentProvider`] is the external mobile-money API. It accepts a payment request and acknowledges it; the final
//!   outcome arrives later through the webhook.
mod order_store;
mod payment_provider;

pub use order_store::{InsertOrderResult, MergeResult, OrderStore, OrderStoreError};
pub use payment_provider::{CallbackUrls, PaymentProvider, PaymentRequest, ProviderError};
