//! In-process relay channel for tests and simulations.
//!
//! Every publish is delivered to every subscriber — including the
//! publisher itself — so echo suppression in the engine is genuinely
//! exercised rather than masked by a self-filtering transport.

use bytes::Bytes;
use party_engine::actors::SessionActorHandle;
use party_engine::errors::EngineError;
use party_engine::relay::RelaySink;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default channel capacity; enough that tests never lag.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcast-channel relay shared by all participants of a test
/// session.
#[derive(Debug, Clone)]
pub struct LoopbackRelay {
    tx: broadcast::Sender<Bytes>,
}

impl Default for LoopbackRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackRelay {
    /// Create a relay with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    /// A publish handle for one participant.
    #[must_use]
    pub fn sink(&self) -> LoopbackSink {
        LoopbackSink {
            tx: self.tx.clone(),
        }
    }

    /// A raw subscription, for asserting on what crosses the wire.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.tx.subscribe()
    }

    /// Pump every relay delivery into a session actor's mailbox until
    /// the token is cancelled or the channel or the actor goes away.
    pub fn attach(&self, handle: SessionActorHandle, cancel: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    result = rx.recv() => match result {
                        Ok(payload) => {
                            if handle.inbound(payload).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }
}

/// Publish side of a [`LoopbackRelay`].
#[derive(Debug, Clone)]
pub struct LoopbackSink {
    tx: broadcast::Sender<Bytes>,
}

impl RelaySink for LoopbackSink {
    fn publish(&self, payload: Bytes) -> Result<(), EngineError> {
        self.tx
            .send(payload)
            .map(|_| ())
            .map_err(|e| EngineError::RelayPublish(e.to_string()))
    }
}
