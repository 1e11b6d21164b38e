//! Zeno Payment Engine
//!
//! This library holds the core logic of the Zeno payment gateway: taking a purchase request, registering an order,
//! asking the mobile-money provider to prompt the buyer, and reconciling the provider's asynchronous status reports
//! against the order.
//!
//! The library is divided into these sections:
//! 1. Order storage ([`traits::OrderStore`]). Orders live in memory by default ([`MemoryOrderStore`]); a SQLite
//!    backend ([`SqliteOrderStore`]) is available with the `sqlite` feature. Data types are in [`db_types`].
//! 2. The payment flow API ([`PaymentFlowApi`]). This is what the HTTP layer talks to. It validates purchases,
//!    calls the [`traits::PaymentProvider`], merges webhook updates under a monotonic status rule, and answers status
//!    queries.
//! 3. Events ([`events`]). Hooks fire when an order reaches a terminal state.
//! 4. The site content store ([`content`]), a small keyed store used by the marketing site's admin screens.
pub mod content;
pub mod db_types;
pub mod events;
pub mod helpers;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;
mod zpe_api;

pub use memory::MemoryOrderStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteOrderStore, SqliteOrderStoreError};
pub use traits::{InsertOrderResult, MergeResult, OrderStore, OrderStoreError, PaymentProvider, ProviderError};
pub use zpe_api::{
    errors::PaymentFlowError,
    payment_flow_api::PaymentFlowApi,
    payment_objects::{
        InitiatedPayment,
        PaymentSettings,
        PurchaseRequest,
        ValidatedPurchase,
        WebhookNotification,
        DEFAULT_BUYER_EMAIL,
        DEFAULT_BUYER_NAME,
        DEFAULT_DEDUP_WINDOW_MINUTES,
        DEFAULT_MINIMUM_AMOUNT,
    },
};
