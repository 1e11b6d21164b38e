use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::Value;

use crate::{MobileMoneyOrder, ZenoPayApiError, ZenoPayConfig};

const MOBILE_MONEY_PATH: &str = "/api/payments/mobile_money_tanzania";

#[derive(Clone)]
pub struct ZenoPayApi {
    config: ZenoPayConfig,
    client: Arc<Client>,
}

impl ZenoPayApi {
    pub fn new(config: ZenoPayConfig) -> Result<Self, ZenoPayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| ZenoPayApiError::Initialization(e.to_string()))?;
        headers.insert("x-api-key", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ZenoPayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Submit a mobile-money order. The returned value is ZenoPay's acknowledgement, passed back verbatim.
    ///
    /// Any non-2xx response is returned as [`ZenoPayApiError::Rejected`] carrying the status code and the raw body.
    /// Connection failures and timeouts are never retried here.
    pub async fn create_order(&self, order: &MobileMoneyOrder) -> Result<Value, ZenoPayApiError> {
        let url = self.url(MOBILE_MONEY_PATH);
        debug!("💸️ Sending mobile money order {} to {url}", order.order_id);
        let response = self.client.post(url).json(order).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("💸️ ZenoPay timed out for order {}", order.order_id);
                ZenoPayApiError::Timeout
            } else {
                warn!("💸️ Could not reach ZenoPay for order {}. {e}", order.order_id);
                ZenoPayApiError::Unreachable(e.to_string())
            }
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ZenoPayApiError::InvalidResponse(e.to_string()))?;
        if status.is_success() {
            trace!("💸️ ZenoPay accepted order {}. {status}", order.order_id);
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            // Plain-text acknowledgements are passed on as a JSON string
            Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
        } else {
            info!("💸️ ZenoPay rejected order {}. {status}", order.order_id);
            Err(ZenoPayApiError::Rejected { status: status.as_u16(), body })
        }
    }
}
