use std::sync::{Arc, Mutex};

use cucumber::World;
use log::*;
use serde_json::{json, Value};
use zeno_payment_engine::{
    db_types::OrderId,
    events::EventProducers,
    traits::PaymentRequest,
    PaymentFlowApi,
    PaymentFlowError,
    PaymentProvider,
    PaymentSettings,
    ProviderError,
    SqliteOrderStore,
};

use crate::support::temp_db::TempDatabase;

#[derive(Default, Debug, World)]
pub struct PaymentWorld {
    pub system: Option<PaymentSystem>,
    pub last_order: Option<OrderId>,
    pub last_error: Option<PaymentFlowError>,
}

impl PaymentWorld {
    pub fn system(&self) -> &PaymentSystem {
        self.system.as_ref().expect("Payment system not initialised")
    }

    pub fn api(&self) -> &PaymentFlowApi<SqliteOrderStore, ScriptedProvider> {
        &self.system().api
    }

    pub fn last_order(&self) -> &OrderId {
        self.last_order.as_ref().expect("No order has been placed")
    }
}

#[derive(Debug)]
pub struct PaymentSystem {
    pub db: TempDatabase,
    pub provider: ScriptedProvider,
    pub api: PaymentFlowApi<SqliteOrderStore, ScriptedProvider>,
}

impl PaymentSystem {
    pub async fn new() -> Self {
        let db = TempDatabase::create().await;
        let store = db.open_store(1).await;
        debug!("🧪️ Payment system running on {}", db.url());
        let provider = ScriptedProvider::default();
        let api = PaymentFlowApi::new(store, provider.clone(), PaymentSettings::default(), EventProducers::default());
        Self { db, provider, api }
    }

    pub async fn shut_down(self) {
        let store = self.api.store().clone();
        self.db.remove(store).await;
    }
}

/// A payment provider whose answer is set by the scenario. Clones share the same script.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    response: Arc<Mutex<Result<Value, ProviderError>>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        let ack = json!({"status": "success", "resultcode": "000", "message": "Request in progress"});
        Self { response: Arc::new(Mutex::new(Ok(ack))) }
    }
}

impl ScriptedProvider {
    pub fn answer_with(&self, response: Result<Value, ProviderError>) {
        *self.response.lock().unwrap() = response;
    }
}

impl PaymentProvider for ScriptedProvider {
    async fn request_payment(&self, request: &PaymentRequest) -> Result<Value, ProviderError> {
        trace!("Provider received payment request for {}", request.order_id);
        self.response.lock().unwrap().clone()
    }
}
