use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{Order, OrderId, OrderStatusType, OrderUpdate},
    events::{EventProducers, OrderCompletedEvent, OrderFailedEvent},
    traits::{InsertOrderResult, MergeResult, OrderStore, PaymentProvider, PaymentRequest, ProviderError},
    zpe_api::{
        errors::PaymentFlowError,
        payment_objects::{InitiatedPayment, PaymentSettings, PurchaseRequest, WebhookNotification},
    },
};

/// `PaymentFlowApi` is the primary API for creating orders, requesting payment from the provider and reconciling the
/// provider's status reports.
pub struct PaymentFlowApi<S, P> {
    store: S,
    provider: P,
    settings: PaymentSettings,
    producers: EventProducers,
}

impl<S, P> Debug for PaymentFlowApi<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<S, P> PaymentFlowApi<S, P> {
    pub fn new(store: S, provider: P, settings: PaymentSettings, producers: EventProducers) -> Self {
        Self { store, provider, settings, producers }
    }

    pub fn settings(&self) -> &PaymentSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, P> PaymentFlowApi<S, P>
where
    S: OrderStore,
    P: PaymentProvider,
{
    /// Validates a purchase, registers a `pending` order and asks the provider to collect payment.
    ///
    /// The order is stored before the provider is called, so a webhook can never arrive for an order the store does
    /// not know about. If the provider acknowledges the request, the order moves to `processing`. If it rejects the
    /// request or cannot be reached, the order stays `pending` and the error is returned. The provider call is never
    /// retried here; retrying is up to the caller.
    ///
    /// A request carrying an idempotency key that matches an order created inside the deduplication window returns
    /// that order without calling the provider again. When the provider call fails, the key is released from the
    /// failed order, so a retry with the same key starts a fresh payment.
    pub async fn initiate_payment(&self, request: PurchaseRequest) -> Result<InitiatedPayment, PaymentFlowError> {
        let purchase = request.validate(&self.settings)?;
        let new_order = purchase.into_new_order(OrderId::random());
        let order = match self.store.insert_order(new_order, self.settings.dedup_window).await? {
            InsertOrderResult::Existing(order) => {
                info!("💳️ Duplicate purchase request. Returning existing order {} ({})", order.order_id, order.status);
                let payment_details = order.provider_response.clone().unwrap_or_default();
                return Ok(InitiatedPayment { order, payment_details, duplicate: true });
            },
            InsertOrderResult::Inserted(order) => order,
        };
        info!("💳️ Order {} created. Requesting {} from {}", order.order_id, order.amount, order.buyer_phone);
        let request = PaymentRequest::for_order(&order, self.settings.callbacks.clone());
        let result = self.provider.request_payment(&request).await;
        if result.is_err() && order.idempotency_key.is_some() {
            self.release_idempotency_key(&order.order_id).await;
        }
        match result {
            Ok(ack) => {
                let update =
                    OrderUpdate::default().with_status(OrderStatusType::Processing).with_provider_response(ack.clone());
                let order = self.store.merge_order(&order.order_id, update).await?.into_order();
                debug!("💳️ Provider accepted order {}. Status is now {}", order.order_id, order.status);
                Ok(InitiatedPayment { order, payment_details: ack, duplicate: false })
            },
            Err(ProviderError::Rejected { status, body }) => {
                warn!("💳️ Provider rejected order {} with status {status}. {body}", order.order_id);
                Err(PaymentFlowError::ProviderRejected { order_id: order.order_id, status, body })
            },
            Err(ProviderError::Unreachable(reason)) => {
                error!("💳️ No response from the provider for order {}. {reason}", order.order_id);
                Err(PaymentFlowError::ProviderUnreachable { order_id: order.order_id, reason })
            },
        }
    }

    async fn release_idempotency_key(&self, order_id: &OrderId) {
        match self.store.release_idempotency_key(order_id).await {
            Ok(()) => debug!("💳️ Idempotency key of order {order_id} released. A retry will create a new order."),
            Err(e) => error!("💳️ Could not release the idempotency key of order {order_id}. {e}"),
        }
    }

    /// Applies a provider status report to its order.
    ///
    /// The provider's status is mapped with [`OrderStatusType::from_provider_status`] and merged under the monotonic
    /// status rule. A status that would move the order backwards is ignored, but the transaction reference is still
    /// recorded. Redelivering the same notification is harmless.
    ///
    /// If the order moves into `completed` or `failed`, the matching event is published.
    pub async fn process_webhook(&self, notification: WebhookNotification) -> Result<MergeResult, PaymentFlowError> {
        let order_id = notification.order_id().ok_or(PaymentFlowError::MissingOrderId)?;
        let mut update = OrderUpdate::default();
        if let Some(status) = notification.status() {
            update = update.with_status(OrderStatusType::from_provider_status(status));
        }
        if let Some(txid) = notification.transaction_id() {
            update = update.with_transaction_id(txid);
        }
        let result = self.store.merge_order(&order_id, update).await.map_err(|e| {
            warn!("💳️ Webhook for order {order_id} could not be applied. {e}");
            PaymentFlowError::from(e)
        })?;
        match &result {
            MergeResult::Updated { old, new } => {
                info!("💳️ Order {order_id} updated by webhook. {} -> {}", old.status, new.status);
                self.call_status_hooks(&result).await;
            },
            MergeResult::Unchanged(order) => {
                debug!("💳️ Webhook for order {order_id} changed nothing. Status is {}", order.status);
            },
            MergeResult::StaleStatus { order, rejected } => {
                warn!(
                    "💳️ Ignoring stale status '{rejected}' for order {order_id}, which is already {}",
                    order.status
                );
            },
        }
        Ok(result)
    }

    async fn call_status_hooks(&self, result: &MergeResult) {
        match result.new_status() {
            Some(OrderStatusType::Completed) => {
                for emitter in &self.producers.order_completed_producer {
                    debug!("💳️ Notifying order completed hook subscribers");
                    emitter.publish(OrderCompletedEvent::new(result.order().clone())).await;
                }
            },
            Some(OrderStatusType::Failed) => {
                for emitter in &self.producers.order_failed_producer {
                    debug!("💳️ Notifying order failed hook subscribers");
                    emitter.publish(OrderFailedEvent::new(result.order().clone())).await;
                }
            },
            _ => {},
        }
    }

    /// Fetches the current state of an order. Read only.
    pub async fn payment_status(&self, order_id: &OrderId) -> Result<Order, PaymentFlowError> {
        self.store.fetch_order(order_id).await?.ok_or_else(|| PaymentFlowError::OrderNotFound(order_id.clone()))
    }

    /// Removes every order created more than `retention` ago, returning the evicted orders.
    pub async fn expire_orders(&self, retention: Duration) -> Result<Vec<Order>, PaymentFlowError> {
        let cutoff = Utc::now() - retention;
        let removed = self.store.remove_orders_created_before(cutoff).await?;
        if !removed.is_empty() {
            info!("💳️ {} orders created before {cutoff} have been removed", removed.len());
        }
        Ok(removed)
    }
}
