//! Admission of pending connections into the session
//!
//! The lobby takes one pending join at a time off the join queue. It checks
//! capacity, waits for the NAME handshake, assigns the next identifier, and
//! introduces the newcomer and the seated players to each other.

use crate::bridge::Bridge;
use crate::player::{Player, PlayerSet};
use log::{debug, info, warn};
use shared::{
    ClientMessage, PlayerId, ServerMessage, REASON_BAD_NAME, REASON_NO_IDS_LEFT,
    REASON_SESSION_FULL,
};
use tokio::sync::mpsc;

/// What a single admission attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No pending join
    Idle,
    /// The current candidate has not sent its handshake yet
    Waiting,
    Seated(PlayerId),
    Rejected,
}

pub struct Lobby {
    joins: mpsc::Receiver<Bridge>,
    /// Candidate whose handshake has not arrived yet
    candidate: Option<Bridge>,
}

impl Lobby {
    pub fn new(joins: mpsc::Receiver<Bridge>) -> Self {
        Self {
            joins,
            candidate: None,
        }
    }

    /// True while a dequeued candidate is still waiting on its handshake
    pub fn has_candidate(&self) -> bool {
        self.candidate.is_some()
    }

    /// Admits at most one pending join without blocking
    ///
    /// Returns true when a player was seated with `next_id`; the caller then
    /// advances its identifier counter. A candidate whose handshake has not
    /// arrived yet is kept and resumed on the next call, and no other join is
    /// dequeued in the meantime.
    pub fn try_admit(&mut self, players: &mut PlayerSet, next_id: Option<PlayerId>) -> bool {
        matches!(self.admit(players, next_id), Admission::Seated(_))
    }

    /// Same as `try_admit`, reporting what happened to the candidate
    pub fn admit(&mut self, players: &mut PlayerSet, next_id: Option<PlayerId>) -> Admission {
        let mut bridge = match self.candidate.take() {
            Some(bridge) => bridge,
            None => match self.joins.try_recv() {
                Ok(bridge) => {
                    debug!("Pending join from {}", bridge.peer());

                    if players.is_full() {
                        info!("Rejecting {}: session is full", bridge.peer());
                        reject(bridge, REASON_SESSION_FULL);
                        return Admission::Rejected;
                    }
                    bridge
                }
                Err(_) => return Admission::Idle,
            },
        };

        let Some(id) = next_id else {
            warn!("Rejecting {}: identifiers exhausted", bridge.peer());
            reject(bridge, REASON_NO_IDS_LEFT);
            return Admission::Rejected;
        };

        // The very next frame from a new connection must be the handshake
        let frame = match bridge.try_recv() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.candidate = Some(bridge);
                return Admission::Waiting;
            }
            Err(_) => {
                info!("{} went away before its handshake", bridge.peer());
                return Admission::Rejected;
            }
        };

        let name = match ClientMessage::decode(&frame) {
            Ok(ClientMessage::Name { name }) => name,
            Ok(other) => {
                info!(
                    "Rejecting {}: expected NAME, got {:?}",
                    bridge.peer(),
                    other.tag()
                );
                reject(bridge, REASON_BAD_NAME);
                return Admission::Rejected;
            }
            Err(e) => {
                info!("Rejecting {}: bad handshake ({})", bridge.peer(), e);
                reject(bridge, REASON_BAD_NAME);
                return Admission::Rejected;
            }
        };

        let player = Player::new(id, name, bridge);
        player.send(&ServerMessage::Accepted);

        players.broadcast(&ServerMessage::OtherName {
            id: player.id,
            name: player.name.clone(),
        });
        for seated in players.iter() {
            player.send(&ServerMessage::OtherName {
                id: seated.id,
                name: seated.name.clone(),
            });
        }

        players.push(player);
        Admission::Seated(id)
    }
}

/// Tells a candidate why it was turned away and disconnects it
fn reject(bridge: Bridge, reason: &str) {
    if let Err(e) = bridge.send_message(&ServerMessage::leave(reason)) {
        warn!("Failed to send rejection to {}: {}", bridge.peer(), e);
    }
    bridge.close();
}
