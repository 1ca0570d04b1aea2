use serde::Serialize;
use serde::de::DeserializeOwned;

use super::messages::{ClientMessage, ServerMessage};

/// Largest accepted client frame, in bytes. Server snapshots grow with the
/// player count and are not capped.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024; // 16 KiB

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty message")]
    EmptyMessage,
    #[error("payload too large: {0} bytes (max {max})", max = MAX_MESSAGE_SIZE)]
    PayloadTooLarge(usize),
    #[error("serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("deserialize error: {0}")]
    Deserialize(#[source] serde_json::Error),
}

fn encode<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Serialize)
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    if text.trim().is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    serde_json::from_str(text).map_err(ProtocolError::Deserialize)
}

pub fn encode_server_message(msg: &ServerMessage) -> Result<String, ProtocolError> {
    encode(msg)
}

pub fn decode_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    decode(text)
}

pub fn encode_client_message(msg: &ClientMessage) -> Result<String, ProtocolError> {
    encode(msg)
}

/// Decode an inbound frame. Frames over [`MAX_MESSAGE_SIZE`] are refused.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(text.len()));
    }
    decode(text)
}
