//! Typed records for the movement packet family of the Minecraft Java protocol.
//!
//! Only what in-line detection needs is decoded here: player movement, vehicle
//! movement and the clientbound position synchronization used for teleports. Every
//! other packet id is surfaced as [`packets::game::ServerboundGamePacket::Other`]
//! and left for the host server.

pub mod packet_traits;
pub mod packets;

pub use packet_traits::PacketError;
pub use packets::game::{ServerboundGamePacket, decode_serverbound};
