use crate::domain::events::LifecycleEvent;
use crate::domain::ports::NotificationSink;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

/// Writes each event to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationSink for LoggingNotifier {
    async fn notify(&self, event: LifecycleEvent) -> Result<()> {
        info!(
            kind = ?event.kind,
            transaction_id = %event.transaction_id,
            user_id = %event.user_id,
            content = %event.content(),
            "notification dispatched"
        );
        Ok(())
    }
}

/// Hands events to a bounded queue drained by a separate delivery worker.
///
/// Never waits for room: a full or closed queue is reported as an error, which the
/// engine logs and drops.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<LifecycleEvent>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LifecycleEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl NotificationSink for ChannelNotifier {
    async fn notify(&self, event: LifecycleEvent) -> Result<()> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                PaymentError::internal("notification queue is full")
            }
            mpsc::error::TrySendError::Closed(_) => {
                PaymentError::internal("notification queue is closed")
            }
        })
    }
}
