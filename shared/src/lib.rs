//! Wire protocol shared by the relay server and its clients.
//!
//! Every message is a single tag byte followed by a kind-specific payload.
//! There is no length prefix: one transport frame carries exactly one message.

use thiserror::Error;

/// Player identifier as carried on the wire (a single byte).
pub type PlayerId = u8;

pub const REASON_SESSION_FULL: &str = "Session is full";
pub const REASON_BAD_NAME: &str = "Bad name";
pub const REASON_NO_IDS_LEFT: &str = "No identifiers left";

/// Tag byte leading every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Accepted = 65,
    Name = 78,
    OtherName = 79,
    Message = 80,
    Leave = 81,
    OtherLeave = 82,
}

impl TryFrom<u8> for Tag {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            65 => Ok(Tag::Accepted),
            78 => Ok(Tag::Name),
            79 => Ok(Tag::OtherName),
            80 => Ok(Tag::Message),
            81 => Ok(Tag::Leave),
            82 => Ok(Tag::OtherLeave),
            other => Err(WireError::UnknownTag(other)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("empty frame")]
    Empty,
    #[error("unknown tag byte {0}")]
    UnknownTag(u8),
    #[error("tag {0:?} is not valid in this direction")]
    UnexpectedTag(Tag),
    #[error("{0:?} frame is missing its player id")]
    Truncated(Tag),
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Join handshake carrying the display name.
    Name { name: String },
    /// Chat text; the server adds the sender id before relaying.
    Message { text: String },
    Leave,
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Accepted,
    OtherName { id: PlayerId, name: String },
    Message { id: PlayerId, text: String },
    Leave { reason: String },
    OtherLeave { id: PlayerId },
}

impl ClientMessage {
    pub fn tag(&self) -> Tag {
        match self {
            ClientMessage::Name { .. } => Tag::Name,
            ClientMessage::Message { .. } => Tag::Message,
            ClientMessage::Leave => Tag::Leave,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            ClientMessage::Name { name } => tagged(Tag::Name, None, name),
            ClientMessage::Message { text } => tagged(Tag::Message, None, text),
            ClientMessage::Leave => vec![Tag::Leave as u8],
        }
    }

    pub fn decode(frame: &[u8]) -> Result<Self, WireError> {
        let (&first, payload) = frame.split_first().ok_or(WireError::Empty)?;
        match Tag::try_from(first)? {
            Tag::Name => Ok(ClientMessage::Name {
                name: text(payload),
            }),
            Tag::Message => Ok(ClientMessage::Message {
                text: text(payload),
            }),
            // Clients may attach a reason; the server has no use for it
            Tag::Leave => Ok(ClientMessage::Leave),
            tag => Err(WireError::UnexpectedTag(tag)),
        }
    }
}

impl ServerMessage {
    pub fn tag(&self) -> Tag {
        match self {
            ServerMessage::Accepted => Tag::Accepted,
            ServerMessage::OtherName { .. } => Tag::OtherName,
            ServerMessage::Message { .. } => Tag::Message,
            ServerMessage::Leave { .. } => Tag::Leave,
            ServerMessage::OtherLeave { .. } => Tag::OtherLeave,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            ServerMessage::Accepted => vec![Tag::Accepted as u8],
            ServerMessage::OtherName { id, name } => tagged(Tag::OtherName, Some(*id), name),
            ServerMessage::Message { id, text } => tagged(Tag::Message, Some(*id), text),
            ServerMessage::Leave { reason } => tagged(Tag::Leave, None, reason),
            ServerMessage::OtherLeave { id } => vec![Tag::OtherLeave as u8, *id],
        }
    }

    pub fn decode(frame: &[u8]) -> Result<Self, WireError> {
        let (&first, payload) = frame.split_first().ok_or(WireError::Empty)?;
        let tag = Tag::try_from(first)?;
        match tag {
            Tag::Accepted => Ok(ServerMessage::Accepted),
            Tag::OtherName => {
                let (id, name) = with_id(tag, payload)?;
                Ok(ServerMessage::OtherName { id, name })
            }
            Tag::Message => {
                let (id, text) = with_id(tag, payload)?;
                Ok(ServerMessage::Message { id, text })
            }
            Tag::Leave => Ok(ServerMessage::Leave {
                reason: text(payload),
            }),
            Tag::OtherLeave => {
                let (&id, _) = payload.split_first().ok_or(WireError::Truncated(tag))?;
                Ok(ServerMessage::OtherLeave { id })
            }
            Tag::Name => Err(WireError::UnexpectedTag(tag)),
        }
    }

    pub fn leave(reason: &str) -> Self {
        ServerMessage::Leave {
            reason: reason.to_string(),
        }
    }
}

fn tagged(tag: Tag, id: Option<PlayerId>, body: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(2 + body.len());
    frame.push(tag as u8);
    if let Some(id) = id {
        frame.push(id);
    }
    frame.extend_from_slice(body.as_bytes());
    frame
}

fn with_id(tag: Tag, payload: &[u8]) -> Result<(PlayerId, String), WireError> {
    let (&id, rest) = payload.split_first().ok_or(WireError::Truncated(tag))?;
    Ok((id, text(rest)))
}

// Invalid sequences become U+FFFD rather than failing the frame
fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
