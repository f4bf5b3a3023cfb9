//! Stream relay from the provider's frame stream to raw content bytes
//!
//! A spawned task owns the upstream byte stream and the sending half of a
//! bounded channel. It decodes frames as they arrive and forwards only the
//! content deltas; the receiving half is handed to the caller.

use super::frames::FrameDecoder;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, Stream, StreamExt};
use std::fmt::Display;
use thiserror::Error;
use tracing::{debug, warn};

/// Chunks buffered between the relay task and the consumer
const RELAY_BUFFER: usize = 32;

/// The upstream stream broke after streaming started
#[derive(Debug, Clone, Error)]
#[error("upstream stream failed: {0}")]
pub struct RelayError(pub String);

/// Content bytes relayed from the provider
pub type RelayStream = mpsc::Receiver<Result<Bytes, RelayError>>;

/// Start relaying `upstream` and return the outbound stream.
///
/// The outbound stream ends when the provider closes its stream or sends the
/// termination sentinel. A read error is forwarded as a final `Err` item.
/// Dropping the returned stream stops the task and releases the upstream.
pub fn spawn_relay<S, E>(upstream: S) -> RelayStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel(RELAY_BUFFER);
    tokio::spawn(relay(upstream, tx));
    rx
}

async fn relay<S, E>(upstream: S, mut tx: mpsc::Sender<Result<Bytes, RelayError>>)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut upstream = std::pin::pin!(upstream);
    let mut decoder = FrameDecoder::new();
    let mut forwarded = 0usize;

    while let Some(item) = upstream.next().await {
        match item {
            Ok(chunk) => {
                for delta in decoder.push(&chunk) {
                    forwarded += delta.len();
                    if tx.send(Ok(Bytes::from(delta))).await.is_err() {
                        debug!("Relay consumer went away after {} bytes", forwarded);
                        return;
                    }
                }
                if decoder.is_done() {
                    break;
                }
            }
            Err(e) => {
                warn!("Stream processing error: {}", e);
                let _ = tx.send(Err(RelayError(e.to_string()))).await;
                return;
            }
        }
    }

    for delta in decoder.finish() {
        forwarded += delta.len();
        if tx.send(Ok(Bytes::from(delta))).await.is_err() {
            return;
        }
    }

    debug!("Relay finished, {} bytes forwarded", forwarded);
}
