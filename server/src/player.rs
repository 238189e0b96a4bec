//! Seated players and the authoritative player set
//!
//! This module holds the session-side bookkeeping for admitted players:
//! - Player records pairing an identifier and display name with a bridge
//! - The capacity-bounded player set the session loop relays over
//! - The identifier counter that never hands out the same id twice
//!
//! Only the session loop mutates these types, so none of them are locked.

use crate::bridge::{Bridge, BridgeError};
use log::{info, warn};
use shared::{PlayerId, ServerMessage};

/// A seated player
///
/// Players are never modified after admission. Removal drops the record,
/// which closes its bridge.
#[derive(Debug)]
pub struct Player {
    /// Identifier unique within the server process
    pub id: PlayerId,
    /// Display name sent in the NAME handshake
    pub name: String,
    /// Connection to this player's client
    pub bridge: Bridge,
}

impl Player {
    pub fn new(id: PlayerId, name: String, bridge: Bridge) -> Self {
        Self { id, name, bridge }
    }

    /// Queues a message for this player
    ///
    /// Delivery is best effort: a full or closed queue drops the message
    /// and logs it, and the caller carries on.
    pub fn send(&self, message: &ServerMessage) {
        self.send_frame(message.encode());
    }

    fn send_frame(&self, frame: Vec<u8>) {
        match self.bridge.send(frame) {
            Ok(()) => {}
            Err(BridgeError::Full) => {
                warn!(
                    "Outbound queue of player {} ({}) is full, dropping message",
                    self.id,
                    self.bridge.peer()
                );
            }
            Err(BridgeError::Closed) => {
                warn!(
                    "Player {} ({}) is already disconnected, dropping message",
                    self.id,
                    self.bridge.peer()
                );
            }
        }
    }
}

/// Capacity-bounded, ordered set of seated players
///
/// Order carries no protocol meaning but stays stable between mutations,
/// which lets a relay pass address players by index.
#[derive(Debug)]
pub struct PlayerSet {
    players: Vec<Player>,
    capacity: usize,
}

impl PlayerSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            players: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Player> {
        self.players.get_mut(index)
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|player| player.id).collect()
    }

    /// Seats a player
    ///
    /// The lobby checks capacity before admitting anyone, so a full set or a
    /// duplicate id here means the caller broke the admission contract.
    pub fn push(&mut self, player: Player) {
        debug_assert!(!self.is_full(), "player set over capacity");
        debug_assert!(
            self.players.iter().all(|seated| seated.id != player.id),
            "duplicate player id {}",
            player.id
        );

        info!(
            "Player {} ({}) seated as {:?}",
            player.id,
            player.bridge.peer(),
            player.name
        );
        self.players.push(player);
    }

    /// Removes the player at `index` by moving the last player into its slot
    ///
    /// Any index held across this call may now point at a different player.
    pub fn swap_remove(&mut self, index: usize) -> Player {
        let player = self.players.swap_remove(index);
        info!("Player {} ({}) removed", player.id, player.bridge.peer());
        player
    }

    /// Sends a message to every seated player
    pub fn broadcast(&self, message: &ServerMessage) {
        let frame = message.encode();
        for player in &self.players {
            player.send_frame(frame.clone());
        }
    }

    /// Sends a message to every seated player except the one at `skip`
    pub fn broadcast_except(&self, skip: usize, message: &ServerMessage) {
        let frame = message.encode();
        for (index, player) in self.players.iter().enumerate() {
            if index != skip {
                player.send_frame(frame.clone());
            }
        }
    }
}

/// Hands out player identifiers in strictly increasing order
///
/// Identifiers are never reused, even after the player leaves, so a
/// broadcast still in flight can never be attributed to the wrong player.
/// The wire carries one byte per id, so the counter runs dry after 255.
#[derive(Debug)]
pub struct IdCounter {
    next: Option<PlayerId>,
}

impl IdCounter {
    pub fn new() -> Self {
        Self { next: Some(0) }
    }

    /// The identifier the next admitted player will get, if any are left
    pub fn peek(&self) -> Option<PlayerId> {
        self.next
    }

    /// Consumes the current identifier
    pub fn advance(&mut self) {
        self.next = self.next.and_then(|id| id.checked_add(1));
    }
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::detached;

    fn player(id: PlayerId) -> (Player, crate::bridge::testing::Remote) {
        let (bridge, remote) = detached(&format!("peer-{}", id), 8);
        (Player::new(id, format!("player{}", id), bridge), remote)
    }

    #[test]
    fn test_player_set_creation() {
        let set = PlayerSet::new(3);
        assert_eq!(set.capacity(), 3);
        assert!(set.is_empty());
        assert!(!set.is_full());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_push_until_full() {
        let mut set = PlayerSet::new(2);
        let (p0, _r0) = player(0);
        let (p1, _r1) = player(1);

        set.push(p0);
        assert!(!set.is_full());
        set.push(p1);
        assert!(set.is_full());
        assert_eq!(set.ids(), vec![0, 1]);
    }

    #[test]
    fn test_swap_remove_moves_last_player() {
        let mut set = PlayerSet::new(3);
        let (p0, _r0) = player(0);
        let (p1, _r1) = player(1);
        let (p2, _r2) = player(2);
        set.push(p0);
        set.push(p1);
        set.push(p2);

        let removed = set.swap_remove(0);
        assert_eq!(removed.id, 0);
        assert_eq!(set.ids(), vec![2, 1]);
    }

    #[test]
    fn test_dropping_removed_player_closes_bridge() {
        let mut set = PlayerSet::new(2);
        let (p0, mut r0) = player(0);
        set.push(p0);

        let removed = set.swap_remove(0);
        assert!(!removed.bridge.is_closed());
        assert!(!r0.server_gone());

        drop(removed);
        assert!(set.is_empty());
        assert!(r0.server_gone());
    }

    #[test]
    fn test_broadcast_except_skips_sender() {
        let mut set = PlayerSet::new(3);
        let (p0, mut r0) = player(0);
        let (p1, mut r1) = player(1);
        let (p2, mut r2) = player(2);
        set.push(p0);
        set.push(p1);
        set.push(p2);

        let message = ServerMessage::Message {
            id: 1,
            text: "hi".to_string(),
        };
        set.broadcast_except(1, &message);

        assert_eq!(r0.received(), vec![message.clone()]);
        assert!(r1.received().is_empty());
        assert_eq!(r2.received(), vec![message]);
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let mut set = PlayerSet::new(2);
        let (p0, mut r0) = player(0);
        let (p1, mut r1) = player(1);
        set.push(p0);
        set.push(p1);

        set.broadcast(&ServerMessage::OtherLeave { id: 5 });

        assert_eq!(r0.received(), vec![ServerMessage::OtherLeave { id: 5 }]);
        assert_eq!(r1.received(), vec![ServerMessage::OtherLeave { id: 5 }]);
    }

    #[test]
    fn test_send_to_closed_player_is_dropped() {
        let (p0, mut r0) = player(0);
        p0.bridge.close();

        p0.send(&ServerMessage::Accepted);
        assert!(r0.received().is_empty());
    }

    #[test]
    fn test_id_counter_increments() {
        let mut ids = IdCounter::new();
        assert_eq!(ids.peek(), Some(0));
        ids.advance();
        assert_eq!(ids.peek(), Some(1));
        ids.advance();
        assert_eq!(ids.peek(), Some(2));
    }

    #[test]
    fn test_id_counter_peek_does_not_consume() {
        let ids = IdCounter::new();
        assert_eq!(ids.peek(), Some(0));
        assert_eq!(ids.peek(), Some(0));
    }

    #[test]
    fn test_id_counter_exhaustion() {
        let mut ids = IdCounter::new();
        for expected in 0..=255u8 {
            assert_eq!(ids.peek(), Some(expected));
            ids.advance();
        }
        assert_eq!(ids.peek(), None);

        ids.advance();
        assert_eq!(ids.peek(), None);
    }
}
