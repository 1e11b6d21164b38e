use std::future::Future;

use anyhow::{anyhow, Result};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Response,
    StatusCode,
};
use serde_json::Value;
use url::Url;
use zeno_payment_engine::{
    db_types::{OrderId, OrderStatusType},
    PurchaseRequest,
};
use zeno_payment_server::{
    data_objects::{PaymentInitiatedResponse, PaymentStatusResponse},
    helpers::IDEMPOTENCY_KEY_HEADER,
};

use crate::poller::StatusSource;

#[derive(Debug, Clone)]
pub struct PaymentServerClient {
    client: Client,
    server: Url,
}

impl PaymentServerClient {
    pub fn new(server: Url) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent("Zeno Payment Server Client")
            .default_headers(headers)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client. {e}"))?;
        Ok(Self { client, server })
    }

    pub fn server(&self) -> &str {
        self.server.as_str()
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.server.join(path).map_err(|e| anyhow!("Failed to join URL: {}", e))
    }

    pub async fn health(&self) -> Result<String> {
        let url = self.url("/health")?;
        let res = self.client.get(url).send().await?;
        let response = res.text().await?;
        Ok(response)
    }

    /// Starts a payment. The idempotency key, if any, is sent in the `Idempotency-Key` header.
    pub async fn process_payment(&self, purchase: &PurchaseRequest) -> Result<PaymentInitiatedResponse> {
        let url = self.url("/api/process-payment")?;
        let mut req = self.client.post(url).json(purchase);
        if let Some(key) = &purchase.idempotency_key {
            req = req.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            return Err(error_from_response("Payment was not started", res).await);
        }
        Ok(res.json().await?)
    }

    /// Fetches the status of an order. Returns `None` if the server does not know the order.
    pub async fn payment_status(&self, order_id: &OrderId) -> Result<Option<PaymentStatusResponse>> {
        let url = self.url(&format!("/api/payment-status/{}", order_id.as_str()))?;
        let res = self.client.get(url).send().await?;
        match res.status() {
            StatusCode::OK => Ok(Some(res.json().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(error_from_response("Error fetching payment status", res).await),
        }
    }
}

impl StatusSource for PaymentServerClient {
    fn order_status(&self, order_id: &OrderId) -> impl Future<Output = Result<Option<OrderStatusType>>> + Send {
        let client = self.clone();
        let order_id = order_id.clone();
        async move {
            let status = client.payment_status(&order_id).await?;
            Ok(status.map(|s| s.status))
        }
    }
}

/// Turns a failed response into an error carrying the server's `error` (and `details`, if present) fields.
async fn error_from_response(context: &str, res: Response) -> anyhow::Error {
    let status = res.status();
    let body = match res.text().await {
        Ok(body) => body,
        Err(e) => return anyhow!("{context}. The server returned {status}, and the body could not be read. {e}"),
    };
    debug!("Server returned {status}: {body}");
    let parsed = serde_json::from_str::<Value>(&body).ok();
    let reason = match parsed {
        Some(json) => match (json.get("error").and_then(Value::as_str), json.get("details")) {
            (Some(error), Some(details)) => format!("{error} ({details})"),
            (Some(error), None) => error.to_string(),
            _ => body,
        },
        None => body,
    };
    anyhow!("{context}. [{status}] {reason}")
}
