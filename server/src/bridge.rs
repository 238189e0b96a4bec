//! Connection bridge between one client frame stream and the session loop
//!
//! Each bridge owns two bounded queues. The writer task drains the outbound
//! queue into the stream, and the reader task pushes every received frame onto
//! the inbound queue. The session loop only ever touches the queues, never the
//! stream, so it can poll every player without blocking on any one of them.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, watch, Notify};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("bridge is closed")]
    Closed,
    #[error("outbound queue is full")]
    Full,
}

/// Session-side handle of a client connection
///
/// Dropping the handle closes the bridge.
#[derive(Debug)]
pub struct Bridge {
    peer: String,
    outbound: mpsc::Sender<Vec<u8>>,
    inbound: mpsc::Receiver<Vec<u8>>,
    closed: Arc<watch::Sender<bool>>,
}

impl Bridge {
    /// Creates the bridge and spawns its reader and writer tasks
    ///
    /// `activity` is notified after every frame the reader queues, including
    /// the LEAVE synthesized when the stream ends or fails.
    pub fn open<W, R, E>(
        peer: impl Into<String>,
        writer: W,
        reader: R,
        capacity: usize,
        activity: Arc<Notify>,
    ) -> Self
    where
        W: Sink<Vec<u8>> + Send + 'static,
        <W as Sink<Vec<u8>>>::Error: Display + Send,
        R: Stream<Item = Result<Vec<u8>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let peer = peer.into();
        let capacity = capacity.max(1);
        let (outbound, outbound_rx) = mpsc::channel(capacity);
        let (inbound_tx, inbound) = mpsc::channel(capacity);
        let closed = Arc::new(watch::channel(false).0);

        tokio::spawn(write_frames(
            peer.clone(),
            writer,
            outbound_rx,
            Arc::clone(&closed),
        ));
        tokio::spawn(read_frames(
            peer.clone(),
            reader,
            inbound_tx,
            closed.subscribe(),
            activity,
        ));

        Bridge {
            peer,
            outbound,
            inbound,
            closed,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Queues a frame for the client without waiting
    ///
    /// A full queue drops the frame and reports `Full`.
    pub fn send(&self, frame: Vec<u8>) -> Result<(), BridgeError> {
        if self.is_closed() {
            return Err(BridgeError::Closed);
        }

        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => BridgeError::Full,
            TrySendError::Closed(_) => BridgeError::Closed,
        })
    }

    pub fn send_message(&self, message: &ServerMessage) -> Result<(), BridgeError> {
        self.send(message.encode())
    }

    /// Polls the inbound queue
    ///
    /// Returns `Ok(None)` when nothing is queued and `Err(Closed)` once the
    /// reader is gone and the queue has been drained.
    pub fn try_recv(&mut self) -> Result<Option<Vec<u8>>, BridgeError> {
        match self.inbound.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(BridgeError::Closed),
        }
    }

    /// Signals both tasks to stop. Safe to call any number of times.
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            debug!("Closing bridge to {}", self.peer);
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.close();
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    while !*closed.borrow_and_update() {
        if closed.changed().await.is_err() {
            return;
        }
    }
}

async fn write_frames<W>(
    peer: String,
    writer: W,
    mut outbound: mpsc::Receiver<Vec<u8>>,
    closed: Arc<watch::Sender<bool>>,
) where
    W: Sink<Vec<u8>>,
    <W as Sink<Vec<u8>>>::Error: Display,
{
    tokio::pin!(writer);
    let mut closed_rx = closed.subscribe();

    loop {
        tokio::select! {
            biased;

            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = writer.send(frame).await {
                        warn!("Failed to write to {}: {}", peer, e);
                        closed.send_replace(true);
                        return;
                    }
                }
                None => break,
            },

            _ = wait_closed(&mut closed_rx) => break,
        }
    }

    // Frames queued before the close still go out, e.g. a rejection reason
    while let Ok(frame) = outbound.try_recv() {
        if writer.send(frame).await.is_err() {
            return;
        }
    }

    if let Err(e) = writer.close().await {
        debug!("Closing stream to {} failed: {}", peer, e);
    }
}

async fn read_frames<R, E>(
    peer: String,
    reader: R,
    inbound: mpsc::Sender<Vec<u8>>,
    mut closed: watch::Receiver<bool>,
    activity: Arc<Notify>,
) where
    R: Stream<Item = Result<Vec<u8>, E>>,
    E: Display,
{
    tokio::pin!(reader);

    let ended = loop {
        let frame = tokio::select! {
            frame = reader.next() => frame,
            _ = wait_closed(&mut closed) => break false,
        };

        match frame {
            Some(Ok(frame)) => {
                if inbound.send(frame).await.is_err() {
                    break false;
                }
                activity.notify_one();
            }
            Some(Err(e)) => {
                warn!("Reading from {} failed: {}", peer, e);
                break true;
            }
            None => {
                info!("{} closed its connection", peer);
                break true;
            }
        }
    };

    // The session must see the departure even if the client never said so
    if ended {
        let _ = inbound.send(ClientMessage::Leave.encode()).await;
    }

    // Wake the session only after the queue is closed, so it sees the departure
    drop(inbound);
    activity.notify_one();
}

/// In-memory bridges with no tasks behind them
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Client end of a detached bridge
    pub(crate) struct Remote {
        to_server: Option<mpsc::Sender<Vec<u8>>>,
        from_server: mpsc::Receiver<Vec<u8>>,
    }

    impl Remote {
        pub(crate) fn send(&self, message: &ClientMessage) {
            self.send_raw(message.encode());
        }

        pub(crate) fn send_raw(&self, frame: Vec<u8>) {
            if let Some(tx) = &self.to_server {
                tx.try_send(frame).unwrap();
            }
        }

        /// Drops the inbound sender, as a reader task that died would
        pub(crate) fn disconnect(&mut self) {
            self.to_server = None;
        }

        /// True once the session side has dropped its bridge
        pub(crate) fn server_gone(&mut self) -> bool {
            matches!(
                self.from_server.try_recv(),
                Err(TryRecvError::Disconnected)
            )
        }

        pub(crate) fn received(&mut self) -> Vec<ServerMessage> {
            let mut messages = Vec::new();
            while let Ok(frame) = self.from_server.try_recv() {
                messages.push(ServerMessage::decode(&frame).unwrap());
            }
            messages
        }
    }

    pub(crate) fn detached(peer: &str, capacity: usize) -> (Bridge, Remote) {
        let (outbound, from_server) = mpsc::channel(capacity);
        let (to_server, inbound) = mpsc::channel(capacity);
        let bridge = Bridge {
            peer: peer.to_string(),
            outbound,
            inbound,
            closed: Arc::new(watch::channel(false).0),
        };
        let remote = Remote {
            to_server: Some(to_server),
            from_server,
        };
        (bridge, remote)
    }
}
