//! Fire-and-forget delivery of payment events
//!
//! Each [`EventHandler`] owns one queue and one async callback. Any number of [`EventProducer`]s feed the queue. The
//! callback sees only the event, never the state of the system, and every event is handled in its own task.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    queue: mpsc::Receiver<E>,
    // Kept only so that producers can be handed out before `run` is called
    entry: mpsc::Sender<E>,
    callback: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, callback: Handler<E>) -> Self {
        let (entry, queue) = mpsc::channel(buffer_size);
        Self { queue, entry, callback }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.entry.clone() }
    }

    /// Handles events until the last producer is dropped. Returns once every spawned callback has finished.
    pub async fn run(self) {
        let Self { mut queue, entry, callback } = self;
        drop(entry);
        debug!("📬️ Event handler is running");
        let mut in_flight = JoinSet::new();
        while let Some(event) = queue.recv().await {
            let callback = Arc::clone(&callback);
            in_flight.spawn(async move { callback(event).await });
            // Reap finished callbacks so the set stays small on a long-lived server
            while in_flight.try_join_next().is_some() {}
        }
        debug!("📬️ Event queue closed. {} callbacks still in flight", in_flight.len());
        while let Some(res) = in_flight.join_next().await {
            if let Err(e) = res {
                warn!("📬️ An event callback did not complete. {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    /// Queues `event`, waiting for space if the queue is full. Returns false if the handler has already shut down.
    pub async fn publish(&self, event: E) -> bool {
        match self.sender.send(event).await {
            Ok(()) => true,
            Err(_) => {
                warn!("📬️ Event dropped. Its handler is no longer running.");
                false
            },
        }
    }
}
