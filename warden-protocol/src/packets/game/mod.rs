//! Play-state packets relevant to movement validation.

mod c_player_position;
mod s_move_player;
mod s_move_vehicle;

pub use c_player_position::CPlayerPosition;
pub use s_move_player::{MovePlayerKind, MovementFlags, Rotation, SMovePlayer};
pub use s_move_vehicle::SMoveVehicle;

use warden_utils::serial::ReadFrom;

use crate::PacketError;
use crate::packet_traits::decode_with;
use crate::packets::ids::serverbound::S_MOVE_VEHICLE;

/// A decoded serverbound play packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServerboundGamePacket {
    /// One of the four player movement packets.
    MovePlayer(SMovePlayer),
    /// Vehicle movement.
    MoveVehicle(SMoveVehicle),
    /// Any packet this crate does not decode, by id.
    Other(i32),
}

impl ServerboundGamePacket {
    /// The play-state id this packet was decoded from.
    #[must_use]
    pub const fn id(&self) -> i32 {
        match self {
            Self::MovePlayer(packet) => packet.kind.id(),
            Self::MoveVehicle(_) => S_MOVE_VEHICLE,
            Self::Other(id) => *id,
        }
    }
}

/// Decodes a serverbound play packet body.
///
/// Ids outside the movement family are returned as [`ServerboundGamePacket::Other`]
/// without looking at the payload.
pub fn decode_serverbound(id: i32, payload: &[u8]) -> Result<ServerboundGamePacket, PacketError> {
    if let Some(kind) = MovePlayerKind::from_id(id) {
        return decode_with(id, payload, |data| SMovePlayer::read_kind(kind, data))
            .map(ServerboundGamePacket::MovePlayer);
    }
    if id == S_MOVE_VEHICLE {
        return decode_with(id, payload, SMoveVehicle::read).map(ServerboundGamePacket::MoveVehicle);
    }
    Ok(ServerboundGamePacket::Other(id))
}
