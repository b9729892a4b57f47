//! Best-effort delivery of order confirmations.
//!
//! A [`NotificationQueue`] is a cloneable producer handle over an unbounded
//! channel. A single background task drains it in FIFO order, handing each
//! message to a [`Deliverer`] and pausing for a fixed delay in between.
//! Messages live only in memory and failed deliveries are not retried.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use domain::NotificationMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, WorkflowError};

/// Sends a single confirmation message.
#[async_trait]
pub trait Deliverer: Send + Sync + 'static {
    /// Delivers one message. Errors are logged by the queue and dropped.
    async fn deliver(&self, message: &NotificationMessage) -> Result<()>;
}

/// Deliverer that writes each message to the log instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDeliverer;

#[async_trait]
impl Deliverer for LogDeliverer {
    async fn deliver(&self, message: &NotificationMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "sending confirmation email"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    delivered: Vec<NotificationMessage>,
    fail_on_deliver: bool,
}

/// In-memory deliverer for testing. Records messages in delivery order.
#[derive(Debug, Clone, Default)]
pub struct RecordingDeliverer {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingDeliverer {
    /// Creates a new recording deliverer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the deliverer to reject every message until reset.
    pub fn set_fail_on_deliver(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_deliver = fail;
    }

    /// Returns the messages delivered so far.
    pub fn delivered(&self) -> Vec<NotificationMessage> {
        self.state.lock().unwrap().delivered.clone()
    }

    /// Returns the number of messages delivered so far.
    pub fn delivered_count(&self) -> usize {
        self.state.lock().unwrap().delivered.len()
    }
}

#[async_trait]
impl Deliverer for RecordingDeliverer {
    async fn deliver(&self, message: &NotificationMessage) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on_deliver {
            return Err(WorkflowError::NotificationFailure(format!(
                "mailbox {} unavailable",
                message.to
            )));
        }
        state.delivered.push(message.clone());
        Ok(())
    }
}

/// Producer handle of the confirmation queue.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<NotificationMessage>,
}

impl NotificationQueue {
    /// Starts the delivery task and returns a handle to feed it.
    ///
    /// The task exits once every handle has been dropped and the backlog is
    /// drained; awaiting the returned `JoinHandle` waits for that.
    pub fn spawn<D: Deliverer>(
        deliverer: D,
        processing_delay: Duration,
    ) -> (NotificationQueue, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(delivery_loop(deliverer, receiver, processing_delay));
        (NotificationQueue { sender }, handle)
    }

    /// Appends a message to the tail of the queue.
    ///
    /// Fails only when the delivery task is no longer running.
    pub fn enqueue(&self, message: NotificationMessage) -> Result<()> {
        let (id, order_id) = (message.id, message.order_id);
        self.sender.send(message).map_err(|_| {
            WorkflowError::NotificationFailure("delivery loop has shut down".to_string())
        })?;

        metrics::counter!("notifications_enqueued_total").increment(1);
        tracing::info!(%id, %order_id, "confirmation queued");
        Ok(())
    }
}

async fn delivery_loop<D: Deliverer>(
    deliverer: D,
    mut receiver: mpsc::UnboundedReceiver<NotificationMessage>,
    processing_delay: Duration,
) {
    while let Some(message) = receiver.recv().await {
        match deliverer.deliver(&message).await {
            Ok(()) => {
                metrics::counter!("notifications_delivered_total").increment(1);
                tracing::info!(id = %message.id, order_id = %message.order_id, "confirmation delivered");
            }
            Err(e) => {
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::warn!(id = %message.id, order_id = %message.order_id, error = %e, "confirmation delivery failed");
            }
        }

        if !processing_delay.is_zero() {
            tokio::time::sleep(processing_delay).await;
        }
    }

    tracing::info!("notification queue closed");
}
