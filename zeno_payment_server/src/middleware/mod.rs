mod hmac;

pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, SignatureCheck, SignatureError};
