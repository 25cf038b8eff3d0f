//! Identifier factories.

use uuid::Uuid;

use super::{ConnectionId, RoomId, ValueObjectError};

pub struct RoomIdFactory;

impl RoomIdFactory {
    /// Generate a fresh random room ID
    pub fn generate() -> Result<RoomId, ValueObjectError> {
        RoomId::new(Uuid::new_v4().to_string())
    }
}

pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a fresh random connection ID
    pub fn generate() -> Result<ConnectionId, ValueObjectError> {
        ConnectionId::new(Uuid::new_v4().to_string())
    }
}
