// Bounded-channel EventSource

use async_trait::async_trait;
use clinicq_core::error::{AppError, Result};
use clinicq_core::port::{Delivery, EventSource};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Create a connected publisher/source pair.
///
/// `capacity` bounds how many unconsumed events the channel buffers;
/// publishers block once it is full, which is the transport half of the
/// ingestion backpressure story.
pub fn channel_broker(capacity: usize) -> (EventPublisher, ChannelEventSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        EventPublisher { tx },
        ChannelEventSource {
            rx: tokio::sync::Mutex::new(rx),
            pending: Mutex::new(VecDeque::new()),
            outstanding: Mutex::new(HashMap::new()),
            dead_letters: Mutex::new(Vec::new()),
            next_tag: AtomicU64::new(1),
        },
    )
}

/// Producer handle standing in for the external broker
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<serde_json::Value>,
}

impl EventPublisher {
    pub async fn publish(&self, payload: serde_json::Value) -> Result<()> {
        self.tx
            .send(payload)
            .await
            .map_err(|_| AppError::Internal("event channel closed".to_string()))
    }
}

/// In-process broker consumer with explicit settlement.
///
/// Deliveries stay in `outstanding` until acked, rejected (dead-letter) or
/// requeued. Requeued payloads are redelivered before new channel traffic.
pub struct ChannelEventSource {
    rx: tokio::sync::Mutex<mpsc::Receiver<serde_json::Value>>,
    pending: Mutex<VecDeque<serde_json::Value>>,
    outstanding: Mutex<HashMap<u64, serde_json::Value>>,
    dead_letters: Mutex<Vec<serde_json::Value>>,
    next_tag: AtomicU64,
}

impl ChannelEventSource {
    fn deliver(&self, payload: serde_json::Value) -> Delivery {
        let tag = self.next_tag.fetch_add(1, Ordering::SeqCst);
        self.outstanding
            .lock()
            .expect("outstanding lock poisoned")
            .insert(tag, payload.clone());
        Delivery { tag, payload }
    }

    fn take_outstanding(&self, tag: u64) -> Result<serde_json::Value> {
        self.outstanding
            .lock()
            .expect("outstanding lock poisoned")
            .remove(&tag)
            .ok_or_else(|| AppError::Internal(format!("unknown delivery tag {}", tag)))
    }

    /// Dead-lettered payloads, oldest first (for operators and tests)
    pub fn dead_letters(&self) -> Vec<serde_json::Value> {
        self.dead_letters
            .lock()
            .expect("dead letter lock poisoned")
            .clone()
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding
            .lock()
            .expect("outstanding lock poisoned")
            .len()
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn next(&self) -> Result<Option<Delivery>> {
        loop {
            // Redeliveries first, in their original order
            let requeued = self
                .pending
                .lock()
                .expect("pending lock poisoned")
                .pop_front();
            if let Some(payload) = requeued {
                return Ok(Some(self.deliver(payload)));
            }

            match self.rx.lock().await.recv().await {
                Some(payload) => return Ok(Some(self.deliver(payload))),
                None => {
                    // All publishers gone; drain any late requeues
                    if self.pending.lock().expect("pending lock poisoned").is_empty() {
                        return Ok(None);
                    }
                }
            }
        }
    }

    async fn ack(&self, tag: u64) -> Result<()> {
        self.take_outstanding(tag)?;
        debug!(tag, "Delivery acknowledged");
        Ok(())
    }

    async fn reject(&self, tag: u64) -> Result<()> {
        let payload = self.take_outstanding(tag)?;
        warn!(tag, "Delivery dead-lettered");
        self.dead_letters
            .lock()
            .expect("dead letter lock poisoned")
            .push(payload);
        Ok(())
    }

    async fn requeue(&self, tag: u64) -> Result<()> {
        let payload = self.take_outstanding(tag)?;
        debug!(tag, "Delivery requeued for redelivery");
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .push_back(payload);
        Ok(())
    }
}
