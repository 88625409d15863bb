//! Event dispatch.
//!
//! [`DispatcherManager`] owns one worker task per conversation, each fed by
//! a bounded queue, so events from one conversation are processed strictly
//! in arrival order while different conversations proceed in parallel.

mod dispatcher;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{DispatchError, Dispatcher};
pub use traits::{OutputSink, Persistence, SqliteStore, TraceSink, WebhookSink};

use crate::domain::ConversationId;
use crate::state_machine::InboundEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

const WORKER_QUEUE_DEPTH: usize = 32;

pub struct DispatcherManager<P, O> {
    dispatcher: Arc<Dispatcher<P, O>>,
    workers: RwLock<HashMap<ConversationId, mpsc::Sender<InboundEvent>>>,
}

impl<P, O> DispatcherManager<P, O>
where
    P: Persistence + 'static,
    O: OutputSink + 'static,
{
    pub fn new(dispatcher: Dispatcher<P, O>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            workers: RwLock::new(HashMap::new()),
        }
    }

    /// Queue an event for its conversation's worker, spawning the worker on
    /// first contact. Applies backpressure when the queue is full.
    pub async fn submit(&self, event: InboundEvent) {
        let chat_id = event.chat_id;
        let sender = {
            let workers = self.workers.read().await;
            workers.get(&chat_id).cloned()
        };
        let sender = match sender {
            Some(sender) => sender,
            None => {
                let mut workers = self.workers.write().await;
                workers
                    .entry(chat_id)
                    .or_insert_with(|| self.spawn_worker(chat_id))
                    .clone()
            }
        };
        if let Err(returned) = sender.send(event).await {
            // The worker exited; replace it and retry once.
            tracing::warn!(chat_id, "dispatch worker gone, respawning");
            let sender = {
                let mut workers = self.workers.write().await;
                let sender = self.spawn_worker(chat_id);
                workers.insert(chat_id, sender.clone());
                sender
            };
            if sender.send(returned.0).await.is_err() {
                tracing::error!(chat_id, "dispatch worker unavailable, event dropped");
            }
        }
    }

    fn spawn_worker(&self, chat_id: ConversationId) -> mpsc::Sender<InboundEvent> {
        let (tx, mut rx) = mpsc::channel::<InboundEvent>(WORKER_QUEUE_DEPTH);
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(error) = dispatcher.handle_event(event).await {
                    tracing::error!(chat_id, %error, "event handling failed");
                }
            }
            tracing::debug!(chat_id, "dispatch worker stopped");
        });
        tx
    }
}
