use actix_web::HttpRequest;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// The base64-encoded HMAC-SHA256 of `data`, keyed with `secret`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}

/// The trimmed, non-empty value of the `Idempotency-Key` header, if there is one.
pub fn idempotency_key_from_headers(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn hmac() {
        // echo -n '{"order_id":"order-1"}' | openssl dgst -sha256 -hmac secret -binary | base64
        let sig = calculate_hmac("secret", br#"{"order_id":"order-1"}"#);
        assert_eq!(sig, "HGhSTVwZcnujK9KNKFadZxxsfh+wQhl2mV9UlijphO0=");
        assert_ne!(sig, calculate_hmac("other", br#"{"order_id":"order-1"}"#));
    }

    #[test]
    fn idempotency_header() {
        let req = TestRequest::default().insert_header(("Idempotency-Key", " abc ")).to_http_request();
        assert_eq!(idempotency_key_from_headers(&req).as_deref(), Some("abc"));
        let req = TestRequest::default().insert_header(("idempotency-key", "")).to_http_request();
        assert!(idempotency_key_from_headers(&req).is_none());
        assert!(idempotency_key_from_headers(&TestRequest::default().to_http_request()).is_none());
    }
}
