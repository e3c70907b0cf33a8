use aipanel_rs_protocol::SinkEvent;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;

/// Collect the texts of the next `count` appended entries.
///
/// Clear events are skipped. Panics if `count` entries do not arrive
/// within `timeout`.
pub async fn collect_appended(
    events: &mut Receiver<SinkEvent>,
    count: usize,
    timeout: Duration,
) -> Vec<String> {
    let collect = async {
        let mut texts = Vec::with_capacity(count);
        while texts.len() < count {
            match events.recv().await {
                Ok(SinkEvent::Appended(entry)) => texts.push(entry.text),
                Ok(SinkEvent::Cleared { .. }) => {}
                Err(RecvError::Lagged(skipped)) => panic!("transcript lagged by {skipped}"),
                Err(RecvError::Closed) => break,
            }
        }
        texts
    };
    match tokio::time::timeout(timeout, collect).await {
        Ok(texts) => texts,
        Err(_) => panic!("timed out waiting for {count} transcript entries"),
    }
}
