//! Clientbound position synchronization, sent whenever the server teleports a player.

use std::io::{Cursor, Result};

use warden_utils::codec::VarInt;
use warden_utils::math::Vector3;
use warden_utils::serial::ReadFrom;

use crate::PacketError;
use crate::packet_traits::decode_with;
use crate::packets::ids::clientbound::C_PLAYER_POSITION;

/// Forces the client to a position. The client answers with `accept_teleportation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CPlayerPosition {
    /// Id the client echoes back when it accepts the teleport.
    pub teleport_id: i32,
    /// Target position (or offset, for relative axes).
    pub position: Vector3<f64>,
    /// Velocity applied after the teleport.
    pub delta_movement: Vector3<f64>,
    /// Target yaw.
    pub yaw: f32,
    /// Target pitch.
    pub pitch: f32,
    /// Bit set of relative fields.
    pub relatives: i32,
}

impl CPlayerPosition {
    /// Decodes a complete `player_position` payload.
    pub fn decode(payload: &[u8]) -> std::result::Result<Self, PacketError> {
        decode_with(C_PLAYER_POSITION, payload, Self::read)
    }
}

impl ReadFrom for CPlayerPosition {
    fn read(data: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(Self {
            teleport_id: VarInt::read(data)?.0,
            position: Vector3::new(f64::read(data)?, f64::read(data)?, f64::read(data)?),
            delta_movement: Vector3::new(f64::read(data)?, f64::read(data)?, f64::read(data)?),
            yaw: f32::read(data)?,
            pitch: f32::read(data)?,
            relatives: i32::read(data)?,
        })
    }
}
