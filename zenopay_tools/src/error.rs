use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZenoPayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("No response from ZenoPay. {0}")]
    Unreachable(String),
    #[error("ZenoPay did not respond within the configured timeout")]
    Timeout,
    #[error("ZenoPay rejected the request. Error {status}. {body}")]
    Rejected { status: u16, body: String },
    #[error("Could not read ZenoPay response: {0}")]
    InvalidResponse(String),
}
