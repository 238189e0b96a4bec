use crate::roster::Roster;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{ClientMessage, ServerMessage, WireError};
use std::io::Write;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Typed alone on a line, leaves the session
pub const QUIT_COMMAND: &str = "/quit";
/// Typed alone on a line, lists the other players
pub const WHO_COMMAND: &str = "/who";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] WsError),
    #[error("malformed server frame: {0}")]
    Wire(#[from] WireError),
    #[error("terminal i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server closed the connection")]
    Closed,
}

pub struct Client {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    roster: Roster,
}

impl Client {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        info!("Connecting to {}...", url);
        let (socket, response) = connect_async(url).await?;
        debug!("Upgrade response status: {}", response.status());

        Ok(Client {
            socket,
            roster: Roster::new(),
        })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        self.socket.send(Message::Binary(message.encode())).await?;
        Ok(())
    }

    /// Joins as `name` and chats until the input ends, the user quits, or the
    /// server sends us away
    ///
    /// Each input line is sent as a chat message. Everything the server says
    /// is rendered through the roster and written to `output`, one line per
    /// message.
    pub async fn run<R, W>(&mut self, name: &str, input: R, output: &mut W) -> Result<(), ClientError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.send(&ClientMessage::Name {
            name: name.to_string(),
        })
        .await?;

        let mut lines = input.lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match line.as_str() {
                        QUIT_COMMAND => break,
                        WHO_COMMAND => writeln!(output, "{}", self.roster.describe())?,
                        "" => {}
                        _ => self.send(&ClientMessage::Message { text: line }).await?,
                    }
                },

                frame = self.socket.next() => {
                    let frame = match frame {
                        Some(Ok(Message::Binary(frame))) => frame,
                        Some(Ok(Message::Text(text))) => text.into_bytes(),
                        Some(Ok(Message::Close(_))) | None => return Err(ClientError::Closed),
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(e.into()),
                    };

                    let message = match ServerMessage::decode(&frame) {
                        Ok(message) => message,
                        Err(e) => {
                            warn!("Ignoring frame from server: {}", e);
                            continue;
                        }
                    };

                    let sent_away = matches!(message, ServerMessage::Leave { .. });
                    writeln!(output, "{}", self.roster.apply(message))?;
                    if sent_away {
                        return Ok(());
                    }
                }
            }
        }

        info!("Leaving the session");
        self.send(&ClientMessage::Leave).await?;
        if let Err(e) = self.socket.close(None).await {
            debug!("Close handshake failed: {}", e);
        }
        Ok(())
    }
}
