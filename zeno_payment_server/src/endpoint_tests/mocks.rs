use mockall::mock;
use serde_json::Value;
use zeno_payment_engine::traits::{PaymentProvider, PaymentRequest, ProviderError};

mock! {
    pub Provider {}
    impl PaymentProvider for Provider {
        async fn request_payment(&self, request: &PaymentRequest) -> Result<Value, ProviderError>;
    }
}
