//! Server network layer handling WebSocket upgrades
//!
//! The listener accepts TCP connections, runs the WebSocket handshake on the
//! game route, and hands each upgraded stream to the session as a pending
//! join. Everything after that happens in the bridge and the session loop.

use crate::session::SessionHandle;
use futures_util::{future, SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Route clients connect to
pub const GAME_PATH: &str = "/game";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// WebSocket listener feeding a session
pub struct Server {
    listener: TcpListener,
    session: SessionHandle,
}

impl Server {
    pub async fn bind(addr: &str, session: SessionHandle) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server { listener, session })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever
    pub async fn run(self) {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };
            debug!("Accepted TCP connection from {}", addr);

            let session = self.session.clone();
            tokio::spawn(async move {
                handle_connection(stream, addr, session).await;
            });
        }
    }
}

/// Rejects handshakes for any path other than the game route
fn check_route(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == GAME_PATH {
        return Ok(response);
    }

    let mut rejection = ErrorResponse::new(Some(format!(
        "no game at {}",
        request.uri().path()
    )));
    *rejection.status_mut() = StatusCode::NOT_FOUND;
    Err(rejection)
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, session: SessionHandle) {
    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, check_route).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket upgrade failed for {}: {}", addr, e);
            return;
        }
    };
    info!("Client connected from {}", addr);

    let (ws_sender, ws_receiver) = ws_stream.split();

    // Ids above 127 are not valid UTF-8, so frames always go out as binary
    let writer = ws_sender.with(|frame: Vec<u8>| future::ok::<_, WsError>(Message::Binary(frame)));

    let reader = ws_receiver.filter_map(|message| {
        future::ready(match message {
            Ok(Message::Binary(frame)) => Some(Ok(frame)),
            Ok(Message::Text(text)) => Some(Ok(text.into_bytes())),
            Ok(Message::Close(_)) | Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
            Ok(Message::Frame(_)) => None,
            Err(e) => Some(Err(e)),
        })
    });

    if let Err(e) = session.join(addr.to_string(), writer, reader).await {
        error!("Could not hand {} to the session: {}", addr, e);
    }
}
