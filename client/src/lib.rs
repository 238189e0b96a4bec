//! # Chat Client Library
//!
//! A terminal client for the relay server. It connects over WebSocket, joins
//! with a name, and then turns stdin lines into chat messages while printing
//! whatever the server relays back.
//!
//! ## Module Organization
//!
//! ### Roster Module (`roster`)
//! Tracks the other players' names from OTHER_NAME and OTHER_LEAVE
//! announcements, and renders each server message as a line of text.
//!
//! ### Network Module (`network`)
//! Owns the WebSocket connection and the input/output loop:
//! - Sends the NAME handshake on connect
//! - Sends each non-empty input line as a MESSAGE
//! - Handles `/who` locally and sends LEAVE on `/quit` or end of input
//! - Stops when the server sends LEAVE
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("ws://127.0.0.1:8080/game").await?;
//!     let input = BufReader::new(tokio::io::stdin());
//!     client.run("alice", input, &mut std::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod roster;
