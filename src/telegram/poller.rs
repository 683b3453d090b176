//! Long-polling update loop

use super::client::TelegramClient;
use crate::runtime::InboundMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Wait before polling again after a failure without a server-given delay
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll `getUpdates` and forward every usable message to the runtime until
/// cancelled, the runtime goes away, or the token is rejected.
pub async fn run_polling(
    client: Arc<TelegramClient>,
    poll_timeout_secs: u64,
    inbound_tx: mpsc::Sender<InboundMessage>,
    shutdown: CancellationToken,
) {
    tracing::info!(poll_timeout_secs, "Starting Telegram polling");
    let mut offset: Option<i64> = None;

    loop {
        let result = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            result = client.get_updates(offset, poll_timeout_secs) => result,
        };

        match result {
            Ok(updates) => {
                for update in updates {
                    // Acknowledge before dispatch; a message is never redelivered
                    offset = Some(update.update_id + 1);
                    let update_id = update.update_id;
                    let Some(message) = update.into_inbound() else {
                        tracing::debug!(update_id, "Skipping update without a usable message");
                        continue;
                    };
                    if inbound_tx.send(message).await.is_err() {
                        tracing::info!("Runtime closed, stopping Telegram polling");
                        return;
                    }
                }
            }
            Err(e) if e.kind.is_fatal() => {
                tracing::error!(error = %e, "Telegram rejected the bot token, stopping polling");
                break;
            }
            Err(e) => {
                let delay = e.retry_after.unwrap_or(RETRY_DELAY);
                tracing::warn!(
                    error = %e,
                    kind = ?e.kind,
                    delay_secs = delay.as_secs(),
                    "Polling failed, retrying"
                );
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    tracing::info!("Telegram polling stopped");
}
