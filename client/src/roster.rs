//! Client-side view of who is in the session

use shared::{PlayerId, ServerMessage};
use std::collections::HashMap;

/// Names of the other seated players, learned from OTHER_NAME announcements
#[derive(Debug, Default)]
pub struct Roster {
    accepted: bool,
    names: HashMap<PlayerId, String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the server has seated us
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn name_of(&self, id: PlayerId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Other players ordered by identifier
    pub fn players(&self) -> Vec<(PlayerId, &str)> {
        let mut players: Vec<_> = self
            .names
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
            .collect();
        players.sort_by_key(|(id, _)| *id);
        players
    }

    /// Applies a server message and returns the line to show the user
    pub fn apply(&mut self, message: ServerMessage) -> String {
        match message {
            ServerMessage::Accepted => {
                self.accepted = true;
                "* joined the session".to_string()
            }
            ServerMessage::OtherName { id, name } => {
                let line = format!("* {} joined", name);
                self.names.insert(id, name);
                line
            }
            ServerMessage::Message { id, text } => {
                format!("<{}> {}", self.display_name(id), text)
            }
            ServerMessage::Leave { reason } => {
                self.accepted = false;
                self.names.clear();
                format!("* disconnected: {}", reason)
            }
            ServerMessage::OtherLeave { id } => {
                let line = format!("* {} left", self.display_name(id));
                self.names.remove(&id);
                line
            }
        }
    }

    /// One line listing everyone we know about
    pub fn describe(&self) -> String {
        if self.names.is_empty() {
            return "* nobody else is here".to_string();
        }
        let names: Vec<String> = self
            .players()
            .into_iter()
            .map(|(id, name)| format!("{} ({})", name, id))
            .collect();
        format!("* here: {}", names.join(", "))
    }

    fn display_name(&self, id: PlayerId) -> String {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None => format!("player {}", id),
        }
    }
}
