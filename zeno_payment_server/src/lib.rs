//! # Zeno payment server
//! This crate hosts the HTTP relay for the Zeno payment gateway. It is responsible for:
//! * Accepting purchase requests from the storefront and forwarding them to ZenoPay.
//! * Receiving ZenoPay's asynchronous payment notifications on a webhook.
//! * Answering the storefront's status polls.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/process-payment`: Create an order and ask ZenoPay to prompt the buyer for payment.
//! * `GET /api/payment-status/{order_id}`: The current status of an order.
//! * `POST /api/zeno-webhook`: ZenoPay's payment notification callback.
//! * `GET /payment-success` and `GET /payment-cancelled`: Landing pages the buyer is redirected to.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod store;

#[cfg(test)]
mod endpoint_tests;
