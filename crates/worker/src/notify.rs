//! Litter-box fullness check and push notification.

use async_trait::async_trait;

use petkit_core::directory::DeviceDirectory;
use petkit_core::fullness::{full_devices, notification_text};
use petkit_events::{WebhookDelivery, WebhookError, WebhookTrigger};

use crate::BoxError;

/// Outbound channel for the fullness message.
#[async_trait]
pub trait Notifier: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn notify(&self, message: &str) -> Result<(), Self::Error>;
}

/// [`Notifier`] that fires an IFTTT-style webhook trigger.
pub struct WebhookNotifier {
    delivery: WebhookDelivery,
    trigger: WebhookTrigger,
}

impl WebhookNotifier {
    pub fn new(delivery: WebhookDelivery, trigger: WebhookTrigger) -> Self {
        Self { delivery, trigger }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    type Error = WebhookError;

    async fn notify(&self, message: &str) -> Result<(), WebhookError> {
        self.delivery.deliver(&self.trigger, message).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to query devices: {0}")]
    Directory(#[source] BoxError),

    #[error("Failed to send notification: {0}")]
    Delivery(#[source] BoxError),
}

/// Result of one fullness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub full_devices: Vec<String>,
    /// The message that was sent, if any device was full.
    pub message: Option<String>,
}

/// Query every device's state and notify once if any bin is full.
pub async fn run_fullness_check<D, N>(
    directory: &mut D,
    notifier: &N,
) -> Result<NotifyOutcome, NotifyError>
where
    D: DeviceDirectory,
    N: Notifier,
{
    let devices = directory
        .list_devices()
        .await
        .map_err(|e| NotifyError::Directory(Box::new(e)))?;

    let mut states = Vec::with_capacity(devices.len());
    for device in &devices {
        let state = directory
            .device_state(device)
            .await
            .map_err(|e| NotifyError::Directory(Box::new(e)))?;
        states.push((device, state));
    }

    let names = full_devices(states);
    let message = notification_text(&names);

    match &message {
        Some(text) => {
            tracing::info!(devices = %text, "Litter box is full");
            notifier
                .notify(text)
                .await
                .map_err(|e| NotifyError::Delivery(Box::new(e)))?;
        }
        None => tracing::info!("No need to clean for now"),
    }

    Ok(NotifyOutcome {
        full_devices: names,
        message,
    })
}
