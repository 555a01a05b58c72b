use async_trait::async_trait;
use tracing::{info, warn};

use super::dto::PushMessage;

/// Delivery capability for push notifications. Created once at startup.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Returns the provider's message id.
    async fn send(&self, token: &str, message: &PushMessage) -> anyhow::Result<String>;
}

/// Sends `message` to every token in turn, skipping failed deliveries.
/// Returns how many succeeded.
pub async fn send_individually(
    sender: &dyn PushSender,
    tokens: &[String],
    message: &PushMessage,
) -> anyhow::Result<usize> {
    anyhow::ensure!(!tokens.is_empty(), "no tokens provided");

    let mut delivered = 0;
    for token in tokens {
        match sender.send(token, message).await {
            Ok(id) => {
                info!(message_id = %id, "notification sent");
                delivered += 1;
            }
            Err(e) => warn!(error = %e, "notification failed"),
        }
    }
    info!(delivered, total = tokens.len(), "fan-out finished");
    Ok(delivered)
}
