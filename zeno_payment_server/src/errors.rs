use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use serde_json::{json, Value};
use thiserror::Error;
use zeno_payment_engine::PaymentFlowError;

use crate::middleware::SignatureError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid request body")]
    InvalidRequestBody(String),
    #[error("Could not bind or run the HTTP server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    PaymentFlow(#[from] PaymentFlowError),
    #[error("{0}")]
    Signature(#[from] SignatureError),
}

impl ServerError {
    /// The `error` field of the response body.
    pub fn message(&self) -> String {
        match self {
            Self::PaymentFlow(PaymentFlowError::MissingFields(_)) => "Missing required fields".to_string(),
            Self::PaymentFlow(PaymentFlowError::InvalidPhoneNumber(_)) => "Invalid phone number".to_string(),
            Self::PaymentFlow(PaymentFlowError::StoreError(_)) => "Internal server error".to_string(),
            e => e.to_string(),
        }
    }

    /// The optional `details` field of the response body.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::InvalidRequestBody(reason) => Some(Value::String(reason.clone())),
            Self::PaymentFlow(e) => match e {
                PaymentFlowError::MissingFields(fields) => Some(json!({ "missing": fields })),
                PaymentFlowError::InvalidPhoneNumber(_) => {
                    Some(json!("Use a Tanzanian mobile number, e.g. 0754123456 or +255754123456"))
                },
                PaymentFlowError::ProviderRejected { body, .. } => Some(body.clone()),
                PaymentFlowError::ProviderUnreachable { .. } => Some(json!("Please try again later")),
                _ => None,
            },
            _ => None,
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) | Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Signature(SignatureError::UnreadableBody) => StatusCode::BAD_REQUEST,
            Self::Signature(_) => StatusCode::FORBIDDEN,
            Self::PaymentFlow(e) => match e {
                PaymentFlowError::MissingFields(_) => StatusCode::BAD_REQUEST,
                PaymentFlowError::InvalidPhoneNumber(_) => StatusCode::BAD_REQUEST,
                PaymentFlowError::AmountTooLow(_) => StatusCode::BAD_REQUEST,
                PaymentFlowError::MissingOrderId => StatusCode::BAD_REQUEST,
                PaymentFlowError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                // Relay the provider's own status code
                PaymentFlowError::ProviderRejected { status, .. } => {
                    StatusCode::from_u16(*status).ok().filter(|s| !s.is_success()).unwrap_or(StatusCode::BAD_GATEWAY)
                },
                PaymentFlowError::ProviderUnreachable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                PaymentFlowError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ Request failed with {status}. {self}");
        }
        let mut body = json!({ "success": false, "error": self.message() });
        if let Some(details) = self.details() {
            body["details"] = details;
        }
        HttpResponse::build(status).insert_header(ContentType::json()).body(body.to_string())
    }
}
