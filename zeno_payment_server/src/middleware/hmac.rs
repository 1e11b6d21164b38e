//! Signature checks for ZenoPay webhook calls.
//!
//! The caller signs the raw request body with HMAC-SHA256, using the shared `ZPG_WEBHOOK_HMAC_SECRET`, and sends the
//! base64-encoded result in the configured header (`X-Zeno-Signature` by default).
//!
//! Checks are off unless `ZPG_WEBHOOK_HMAC_CHECKS` is set, in which case unsigned or badly signed calls get a 403.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::{h1, header::HeaderValue};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
};
use futures::future::LocalBoxFuture;
use hmac::{Hmac, Mac};
use log::{trace, warn};
use sha2::Sha256;
use thiserror::Error;
use zpg_common::Secret;

use crate::{config::WebhookConfig, errors::ServerError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("No HMAC signature found.")]
    MissingSignature,
    #[error("Invalid HMAC signature.")]
    InvalidSignature,
    #[error("Failed to extract request data.")]
    UnreadableBody,
}

#[derive(Debug, Clone)]
pub struct SignatureCheck {
    header: String,
    secret: Secret<String>,
    enabled: bool,
}

impl From<&WebhookConfig> for SignatureCheck {
    fn from(config: &WebhookConfig) -> Self {
        Self::new(&config.hmac_header, config.hmac_secret.clone(), config.hmac_checks)
    }
}

impl SignatureCheck {
    pub fn new(header: &str, secret: Secret<String>, enabled: bool) -> Self {
        Self { header: header.to_string(), secret, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Verifies `signature` against `body`. An empty secret fails every check, so a misconfigured server denies all
    /// calls rather than accepting them.
    pub fn verify(&self, signature: Option<&HeaderValue>, body: &[u8]) -> Result<(), SignatureError> {
        let signature = signature.ok_or(SignatureError::MissingSignature)?;
        if self.secret.is_empty() {
            warn!("🔐️ No webhook HMAC secret is configured. Denying access.");
            return Err(SignatureError::InvalidSignature);
        }
        let expected = base64::decode(signature.as_bytes()).map_err(|_| SignatureError::InvalidSignature)?;
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|_| SignatureError::InvalidSignature)?;
        mac.update(body);
        mac.verify_slice(&expected).map_err(|_| SignatureError::InvalidSignature)
    }
}

/// Wraps a resource so that only correctly signed calls reach it.
pub struct HmacMiddlewareFactory {
    check: Rc<SignatureCheck>,
}

impl HmacMiddlewareFactory {
    pub fn new(check: SignatureCheck) -> Self {
        Self { check: Rc::new(check) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = actix_web::Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { check: Rc::clone(&self.check), service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    check: Rc<SignatureCheck>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let check = Rc::clone(&self.check);
        Box::pin(async move {
            if !check.is_enabled() {
                trace!("🔐️ Webhook signature checks are disabled. Allowing {}", req.path());
                return service.call(req).await;
            }
            // The body is consumed to compute the signature, and has to be put back for the handler.
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Could not read the webhook body. {e:?}");
                ServerError::from(SignatureError::UnreadableBody)
            })?;
            match check.verify(req.headers().get(check.header()), &body) {
                Ok(()) => {
                    trace!("🔐️ Signature on {} is valid ✅️", req.path());
                    req.set_payload(replay_payload(body));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Rejecting webhook call to {}. {e}", req.path());
                    Err(ServerError::from(e).into())
                },
            }
        })
    }
}

fn replay_payload(body: web::Bytes) -> Payload {
    let (_, mut payload) = h1::Payload::create(true);
    payload.unread_data(body);
    Payload::from(payload)
}
