use std::time::Duration;

use huddle_client::ClientEvent;
use tokio::sync::mpsc;

/// Waits for the first event matching `pred`, skipping others.
pub async fn wait_for_event<F>(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    timeout_ms: u64,
    mut pred: F,
) -> ClientEvent
where
    F: FnMut(&ClientEvent) -> bool,
{
    let wait = async {
        while let Some(event) = events.recv().await {
            tracing::debug!("[test] client event: {:?}", event);
            if pred(&event) {
                return event;
            }
        }
        panic!("client event stream ended");
    };

    tokio::time::timeout(Duration::from_millis(timeout_ms), wait)
        .await
        .expect("Timeout waiting for client event")
}
