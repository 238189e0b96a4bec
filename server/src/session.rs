//! The session loop: sole owner of the player set
//!
//! One task runs [`Session::run`]. Each step sweeps every seated player's
//! inbound queue without blocking, relays chat, processes departures, and then
//! gives the lobby one chance to seat a newcomer. When a step finds nothing to
//! do the loop sleeps on a shared [`Notify`] that every bridge reader and every
//! new join signals, so an idle session costs no CPU.

use crate::bridge::{Bridge, BridgeError};
use crate::config::{SessionConfig, JOIN_QUEUE_CAPACITY};
use crate::lobby::{Admission, Lobby};
use crate::player::{IdCounter, PlayerSet};
use futures_util::{Sink, Stream};
use log::{debug, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// Cloneable entry point used by connection handlers to queue pending joins
#[derive(Clone)]
pub struct SessionHandle {
    joins: mpsc::Sender<Bridge>,
    activity: Arc<Notify>,
    queue_capacity: usize,
}

impl SessionHandle {
    /// Bridges a client stream and queues it for the lobby
    ///
    /// Waits while the join queue is full. Fails with `Closed` if the
    /// session is gone, in which case the bridge has already been closed.
    pub async fn join<W, R, E>(
        &self,
        peer: impl Into<String>,
        writer: W,
        reader: R,
    ) -> Result<(), BridgeError>
    where
        W: Sink<Vec<u8>> + Send + 'static,
        <W as Sink<Vec<u8>>>::Error: Display + Send,
        R: Stream<Item = Result<Vec<u8>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let bridge = Bridge::open(
            peer,
            writer,
            reader,
            self.queue_capacity,
            Arc::clone(&self.activity),
        );

        self.joins
            .send(bridge)
            .await
            .map_err(|_| BridgeError::Closed)?;
        self.activity.notify_one();
        Ok(())
    }
}

pub struct Session {
    config: SessionConfig,
    players: PlayerSet,
    ids: IdCounter,
    lobby: Lobby,
    activity: Arc<Notify>,
    started: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> (Self, SessionHandle) {
        let (joins_tx, joins_rx) = mpsc::channel(JOIN_QUEUE_CAPACITY);
        let activity = Arc::new(Notify::new());

        let session = Session {
            config,
            players: PlayerSet::new(config.capacity),
            ids: IdCounter::new(),
            lobby: Lobby::new(joins_rx),
            activity: Arc::clone(&activity),
            started: false,
        };
        let handle = SessionHandle {
            joins: joins_tx,
            activity,
            queue_capacity: config.queue_capacity,
        };

        (session, handle)
    }

    pub fn players(&self) -> &PlayerSet {
        &self.players
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Runs the session forever
    pub async fn run(mut self) {
        info!(
            "Session open: capacity {}, relaying from {} player(s)",
            self.config.capacity, self.config.start_players
        );

        loop {
            if !self.step() {
                self.activity.notified().await;
            }
        }
    }

    /// One loop body: a relay pass followed by one admission attempt
    ///
    /// Returns true if anything was consumed, meaning another step may find
    /// more work without waiting.
    pub fn step(&mut self) -> bool {
        if !self.started && self.players.len() >= self.config.start_players {
            info!("Session started with {} player(s)", self.players.len());
            self.started = true;
        }

        let mut progressed = false;
        if self.started {
            progressed |= self.relay_pass();
        }
        progressed |= self.admit();
        progressed
    }

    fn admit(&mut self) -> bool {
        match self.lobby.admit(&mut self.players, self.ids.peek()) {
            Admission::Seated(id) => {
                debug!("Admitted player {}", id);
                self.ids.advance();
                true
            }
            Admission::Rejected => true,
            Admission::Idle | Admission::Waiting => false,
        }
    }

    /// Drains every seated player's inbound queue once
    ///
    /// Each player gets at most one queue's worth of frames per pass, so a
    /// client refilling its queue cannot hold the pass. A removal reorders
    /// the set, so it ends the pass; players after the removed slot are
    /// served by the next pass.
    fn relay_pass(&mut self) -> bool {
        let mut progressed = false;

        for index in 0..self.players.len() {
            for _ in 0..self.config.queue_capacity {
                let Some(player) = self.players.get_mut(index) else {
                    return progressed;
                };
                let id = player.id;

                let frame = match player.bridge.try_recv() {
                    Ok(Some(frame)) => frame,
                    Ok(None) => break,
                    Err(_) => {
                        debug!("Inbound queue of player {} is gone", id);
                        self.remove(index);
                        return true;
                    }
                };
                progressed = true;

                match ClientMessage::decode(&frame) {
                    Ok(ClientMessage::Message { text }) => {
                        self.players
                            .broadcast_except(index, &ServerMessage::Message { id, text });
                    }
                    Ok(ClientMessage::Leave) => {
                        self.remove(index);
                        return true;
                    }
                    Ok(other) => {
                        debug!("Ignoring {:?} from player {}", other.tag(), id);
                    }
                    Err(e) => {
                        warn!("Discarding malformed frame from player {}: {}", id, e);
                    }
                }
            }
        }

        progressed
    }

    fn remove(&mut self, index: usize) {
        let Some(id) = self.players.get(index).map(|player| player.id) else {
            return;
        };

        self.players
            .broadcast_except(index, &ServerMessage::OtherLeave { id });
        drop(self.players.swap_remove(index));
    }
}
