//! # Relay Server Library
//!
//! This library implements a small real-time relay for one shared session.
//! Clients connect over WebSocket, pass a lobby admission step, and from then
//! on every chat message they send is fanned out to every other seated player.
//!
//! ## Core Responsibilities
//!
//! ### Admission Control
//! The lobby seats at most `capacity` players. Each admitted player gets an
//! identifier from a counter that only ever moves forward, so an id seen on
//! the wire always names exactly one player for the lifetime of the process.
//! Candidates that arrive while the session is full, or whose first message
//! is not a NAME handshake, are told why and disconnected.
//!
//! ### Ordered Relay
//! The session loop drains every seated player's inbound queue in turn and
//! relays chat to everyone else, tagged with the sender's id. Senders never
//! see their own messages echoed back.
//!
//! ### Departure Handling
//! A player leaves either by saying so or by their connection dropping. In
//! both cases the remaining players are told, and the slot is freed for the
//! next newcomer.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Session
//! All session state (the player set and the identifier counter) is owned by
//! one task. Connection tasks only talk to it through bounded queues, so the
//! player set needs no locks and relay order is deterministic.
//!
//! ### Non-Blocking Polling
//! The session never waits on any one player. Inbound queues are polled,
//! outbound queues are filled with `try_send`, and a full outbound queue
//! drops the message with a warning instead of stalling everyone else. When
//! there is nothing to do the session sleeps until a bridge signals activity.
//!
//! ## Module Organization
//!
//! ### Bridge Module (`bridge`)
//! Adapts one client frame stream into inbound and outbound queues, and
//! synthesizes a LEAVE when the stream ends or fails.
//!
//! ### Player Module (`player`)
//! Player records, the capacity-bounded player set, and the id counter.
//!
//! ### Lobby Module (`lobby`)
//! Admission of pending joins: capacity check, handshake, and the exchange
//! of names between the newcomer and the seated players.
//!
//! ### Session Module (`session`)
//! The control loop that owns the player set and relays messages.
//!
//! ### Network Module (`network`)
//! TCP listener and WebSocket upgrade on the `/game` route.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::SessionConfig;
//! use server::network::Server;
//! use server::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::default();
//!     config.validate()?;
//!
//!     let (session, handle) = Session::new(config);
//!     let server = Server::bind("127.0.0.1:8080", handle).await?;
//!
//!     tokio::spawn(session.run());
//!     server.run().await;
//!
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod lobby;
pub mod network;
pub mod player;
pub mod session;
