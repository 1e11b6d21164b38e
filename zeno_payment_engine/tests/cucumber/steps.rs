use cucumber::{given, then, when};
use serde_json::json;
use zeno_payment_engine::{
    db_types::{OrderId, OrderStatusType},
    PaymentFlowError,
    ProviderError,
    PurchaseRequest,
    WebhookNotification,
};
use zpg_common::Shillings;

use crate::cucumber::{PaymentSystem, PaymentWorld};

#[given("a payment gateway that accepts payment requests")]
async fn accepting_gateway(world: &mut PaymentWorld) {
    world.system = Some(PaymentSystem::new().await);
}

#[given(expr = "a payment gateway whose provider rejects requests with status {int}")]
async fn rejecting_gateway(world: &mut PaymentWorld, status: u16) {
    let system = PaymentSystem::new().await;
    system.provider.answer_with(Err(ProviderError::Rejected { status, body: json!({"message": "Rejected"}) }));
    world.system = Some(system);
}

#[given("a payment gateway whose provider is down")]
async fn unreachable_gateway(world: &mut PaymentWorld) {
    let system = PaymentSystem::new().await;
    system.provider.answer_with(Err(ProviderError::Unreachable("Connection refused".into())));
    world.system = Some(system);
}

#[when(expr = "a buyer with phone {word} buys the e-book for {int} Tsh")]
async fn buy(world: &mut PaymentWorld, phone: String, amount: i64) {
    let request = PurchaseRequest::new(&phone, Shillings::from(amount));
    match world.api().initiate_payment(request).await {
        Ok(payment) => {
            world.last_order = Some(payment.order.order_id);
            world.last_error = None;
        },
        Err(e) => {
            if let PaymentFlowError::ProviderRejected { order_id, .. } |
            PaymentFlowError::ProviderUnreachable { order_id, .. } = &e
            {
                world.last_order = Some(order_id.clone());
            }
            world.last_error = Some(e);
        },
    }
}

#[when(expr = "the provider reports {string} with reference {word}")]
async fn webhook_with_reference(world: &mut PaymentWorld, status: String, reference: String) {
    let note = WebhookNotification::new(world.last_order().as_str(), &status).with_transaction_id(&reference);
    world.last_error = world.api().process_webhook(note).await.err();
}

#[when(expr = "the provider reports {string}")]
async fn webhook(world: &mut PaymentWorld, status: String) {
    let note = WebhookNotification::new(world.last_order().as_str(), &status);
    world.last_error = world.api().process_webhook(note).await.err();
}

#[when(expr = "the provider reports {string} for order {word}")]
async fn webhook_for_order(world: &mut PaymentWorld, status: String, order_id: String) {
    let note = WebhookNotification::new(&order_id, &status);
    world.last_error = world.api().process_webhook(note).await.err();
}

#[then("the purchase is accepted")]
async fn purchase_accepted(world: &mut PaymentWorld) {
    assert!(world.last_error.is_none(), "Purchase failed: {:?}", world.last_error);
    assert!(world.last_order().as_str().starts_with("order-"));
}

#[then(expr = "the request fails with {string}")]
async fn request_failed(world: &mut PaymentWorld, message: String) {
    let err = world.last_error.as_ref().expect("The request should have failed");
    assert_eq!(err.to_string(), message);
}

#[then(expr = "the order status is {word}")]
async fn order_status(world: &mut PaymentWorld, status: String) {
    let order = world.api().payment_status(world.last_order()).await.expect("Order should exist");
    assert_eq!(order.status, OrderStatusType::from(status));
}

#[then(expr = "the order has transaction id {word}")]
async fn transaction_id(world: &mut PaymentWorld, txid: String) {
    let order = world.api().payment_status(world.last_order()).await.expect("Order should exist");
    assert_eq!(order.transaction_id, Some(txid));
}

#[then(expr = "there are {int} orders")]
async fn order_count(world: &mut PaymentWorld, count: i64) {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(world.api().store().pool())
        .await
        .expect("Error counting orders");
    assert_eq!(n, count);
}

#[then(expr = "order {word} does not exist")]
async fn no_such_order(world: &mut PaymentWorld, order_id: String) {
    let err = world.api().payment_status(&OrderId::from(order_id)).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::OrderNotFound(_)));
}
