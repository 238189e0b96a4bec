//! Session configuration

use thiserror::Error;

/// Two-player sessions unless configured otherwise
pub const DEFAULT_CAPACITY: usize = 2;
/// Per-bridge queue bound, in messages
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;
/// Pending joins that may wait for the lobby before new connections block
pub const JOIN_QUEUE_CAPACITY: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("start players ({start_players}) cannot exceed capacity ({capacity})")]
    StartAboveCapacity {
        start_players: usize,
        capacity: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of seated players
    pub capacity: usize,
    /// Players that must be seated before relaying begins
    pub start_players: usize,
    /// Bound of each bridge's inbound and outbound queue
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            start_players: 1,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl SessionConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Zero("capacity"));
        }
        if self.start_players == 0 {
            return Err(ConfigError::Zero("start players"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Zero("queue capacity"));
        }
        if self.start_players > self.capacity {
            return Err(ConfigError::StartAboveCapacity {
                start_players: self.start_players,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}
