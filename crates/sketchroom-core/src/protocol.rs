//! Wire protocol between canvas clients and the room server.
//!
//! Frames are JSON text. A `chat` frame carries a second, JSON-encoded
//! payload in its `message` string: either `{"shape": ...}` or
//! `{"action": "erase", "shapeId": ...}`. The server relays that string
//! verbatim to the other members of the room.

use crate::shapes::{Shape, ShapeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Close code sent when the connection carries no token.
pub const CLOSE_MISSING_TOKEN: u16 = 4400;
/// Close code sent when the token fails verification.
pub const CLOSE_AUTH_FAILED: u16 = 4401;

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Messages sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    /// Relay an encoded [`ShapeEvent`] to the room
    Chat {
        #[serde(rename = "roomId")]
        room_id: String,
        message: String,
    },
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// An encoded [`ShapeEvent`] from another member of the room
    Chat { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum EraseAction {
    Erase,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ShapeEventRepr {
    Upsert {
        shape: Shape,
    },
    Erase {
        action: EraseAction,
        #[serde(rename = "shapeId")]
        shape_id: ShapeId,
    },
}

/// A scene mutation shared with the room.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeEvent {
    /// Create the shape, or replace the one with the same identity.
    Upsert(Shape),
    /// Remove the shape with this identity.
    Erase(ShapeId),
}

impl ShapeEvent {
    /// Encode as the inner `message` payload.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let repr = match self {
            ShapeEvent::Upsert(shape) => ShapeEventRepr::Upsert {
                shape: shape.clone(),
            },
            ShapeEvent::Erase(id) => ShapeEventRepr::Erase {
                action: EraseAction::Erase,
                shape_id: id.clone(),
            },
        };
        Ok(serde_json::to_string(&repr)?)
    }

    /// Decode an inner `message` payload.
    pub fn decode(message: &str) -> Result<Self, ProtocolError> {
        Ok(match serde_json::from_str(message)? {
            ShapeEventRepr::Upsert { shape } => ShapeEvent::Upsert(shape),
            ShapeEventRepr::Erase { shape_id, .. } => ShapeEvent::Erase(shape_id),
        })
    }
}

impl ClientMessage {
    pub fn join(room_id: impl Into<String>) -> Self {
        ClientMessage::JoinRoom {
            room_id: room_id.into(),
        }
    }

    /// A chat frame carrying `event` for `room_id`.
    pub fn chat(room_id: impl Into<String>, event: &ShapeEvent) -> Result<Self, ProtocolError> {
        Ok(ClientMessage::Chat {
            room_id: room_id.into(),
            message: event.encode()?,
        })
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}
