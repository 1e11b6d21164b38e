//! Status poller
//!
//! After a payment has been started, the buyer approves it on their phone and ZenoPay reports the outcome to the
//! server's webhook. The storefront learns about it by polling `/api/payment-status/{orderId}` until the order
//! reaches a terminal state.
//!
//! Polling is bounded: after [`PollerConfig::max_attempts`] queries the poller gives up with
//! [`PollOutcome::StillProcessing`]. A poll started with [`StatusPoller::spawn`] can be cancelled at any time by
//! calling [`PollHandle::cancel`] or simply dropping the handle.
use std::{future::Future, time::Duration};

use log::*;
use tokio::{sync::oneshot, task::JoinHandle};
use zeno_payment_engine::db_types::{OrderId, OrderStatusType};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: usize = 120;

/// Anything that can report the status of an order. Queries must be read-only.
pub trait StatusSource {
    /// The current status of the order, or `None` if the order is unknown.
    fn order_status(&self, order_id: &OrderId) -> impl Future<Output = anyhow::Result<Option<OrderStatusType>>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_attempts: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    NotFound,
    /// The order had not resolved after the given number of queries. Check back later.
    StillProcessing { attempts: usize },
    Cancelled,
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

pub struct StatusPoller<S> {
    source: S,
    config: PollerConfig,
}

impl<S: StatusSource> StatusPoller<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Polls until the order resolves, is found not to exist, or the attempts run out.
    ///
    /// The first query is made straight away. Failed queries count towards the attempt limit, but do not stop the
    /// poll.
    pub async fn poll(&self, order_id: &OrderId) -> PollOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.source.order_status(order_id).await {
                Ok(Some(OrderStatusType::Completed)) => {
                    info!("⏱️ Order {order_id} completed after {attempt} queries");
                    return PollOutcome::Completed;
                },
                Ok(Some(OrderStatusType::Failed)) => {
                    info!("⏱️ Order {order_id} failed after {attempt} queries");
                    return PollOutcome::Failed;
                },
                Ok(Some(status)) => trace!("⏱️ [{attempt}/{max_attempts}] Order {order_id} is {status}"),
                Ok(None) => {
                    warn!("⏱️ Order {order_id} does not exist. Stopping.");
                    return PollOutcome::NotFound;
                },
                Err(e) => warn!("⏱️ [{attempt}/{max_attempts}] Could not fetch status for {order_id}. {e}"),
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }
        info!("⏱️ Order {order_id} is still processing after {max_attempts} queries. Giving up.");
        PollOutcome::StillProcessing { attempts: max_attempts }
    }
}

impl<S> StatusPoller<S>
where S: StatusSource + Send + Sync + 'static
{
    /// Runs [`Self::poll`] on a new task.
    pub fn spawn(self, order_id: OrderId) -> PollHandle {
        let (cancel, cancelled) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            tokio::select! {
                outcome = self.poll(&order_id) => outcome,
                _ = cancelled => {
                    debug!("⏱️ Polling for {order_id} was cancelled");
                    PollOutcome::Cancelled
                },
            }
        });
        PollHandle { cancel, task }
    }
}

/// Handle to a running poll. Dropping the handle cancels the poll.
pub struct PollHandle {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    /// Stops the poll and waits for the task to wind down.
    pub async fn cancel(self) -> PollOutcome {
        let _ = self.cancel.send(());
        self.task.await.unwrap_or(PollOutcome::Cancelled)
    }

    /// Waits for the poll to finish.
    pub async fn outcome(self) -> PollOutcome {
        let Self { cancel, task } = self;
        let outcome = task.await.unwrap_or(PollOutcome::Cancelled);
        drop(cancel);
        outcome
    }
}
