//! Serverbound player movement packets.
//!
//! Vanilla splits these into four packets sharing one layout family:
//! position only, position and rotation, rotation only, and status only.
//! They decode into a single [`SMovePlayer`] whose optional fields record what
//! the client actually sent.

use std::io::{Cursor, Result};

use bitflags::bitflags;
use warden_utils::math::Vector3;
use warden_utils::serial::ReadFrom;

use crate::packets::ids::serverbound::{
    S_MOVE_PLAYER_POS, S_MOVE_PLAYER_POS_ROT, S_MOVE_PLAYER_ROT, S_MOVE_PLAYER_STATUS_ONLY,
};

bitflags! {
    /// Flags byte trailing every movement packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MovementFlags: u8 {
        /// The client believes it is standing on a block.
        const ON_GROUND = 0x01;
        /// The client collided horizontally this tick.
        const HORIZONTAL_COLLISION = 0x02;
    }
}

/// Yaw and pitch in degrees, exactly as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    /// Horizontal look angle.
    pub yaw: f32,
    /// Vertical look angle; vanilla clients keep it within `[-90, 90]`.
    pub pitch: f32,
}

impl Rotation {
    /// Creates a rotation.
    #[must_use]
    pub const fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }
}

impl ReadFrom for Rotation {
    fn read(data: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(Self {
            yaw: f32::read(data)?,
            pitch: f32::read(data)?,
        })
    }
}

/// Which of the four movement packets was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlayerKind {
    /// `move_player_pos`.
    Pos,
    /// `move_player_pos_rot`.
    PosRot,
    /// `move_player_rot`.
    Rot,
    /// `move_player_status_only`.
    StatusOnly,
}

impl MovePlayerKind {
    /// Maps a play-state packet id to a movement packet kind.
    #[must_use]
    pub const fn from_id(id: i32) -> Option<Self> {
        match id {
            S_MOVE_PLAYER_POS => Some(Self::Pos),
            S_MOVE_PLAYER_POS_ROT => Some(Self::PosRot),
            S_MOVE_PLAYER_ROT => Some(Self::Rot),
            S_MOVE_PLAYER_STATUS_ONLY => Some(Self::StatusOnly),
            _ => None,
        }
    }

    /// The play-state packet id.
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Pos => S_MOVE_PLAYER_POS,
            Self::PosRot => S_MOVE_PLAYER_POS_ROT,
            Self::Rot => S_MOVE_PLAYER_ROT,
            Self::StatusOnly => S_MOVE_PLAYER_STATUS_ONLY,
        }
    }

    const fn has_position(self) -> bool {
        matches!(self, Self::Pos | Self::PosRot)
    }

    const fn has_rotation(self) -> bool {
        matches!(self, Self::PosRot | Self::Rot)
    }
}

/// A decoded player movement packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SMovePlayer {
    /// Which packet this was decoded from.
    pub kind: MovePlayerKind,
    /// Feet position, when the packet carries one.
    pub position: Option<Vector3<f64>>,
    /// Look direction, when the packet carries one.
    pub rotation: Option<Rotation>,
    /// Ground and collision flags.
    pub flags: MovementFlags,
}

impl SMovePlayer {
    /// Reads the body of a movement packet of the given kind.
    pub fn read_kind(kind: MovePlayerKind, data: &mut Cursor<&[u8]>) -> Result<Self> {
        let position = if kind.has_position() {
            Some(Vector3::new(
                f64::read(data)?,
                f64::read(data)?,
                f64::read(data)?,
            ))
        } else {
            None
        };
        let rotation = if kind.has_rotation() {
            Some(Rotation::read(data)?)
        } else {
            None
        };
        // Unknown bits are kept rather than rejected, matching vanilla.
        let flags = MovementFlags::from_bits_retain(u8::read(data)?);
        Ok(Self {
            kind,
            position,
            rotation,
            flags,
        })
    }

    /// Whether the packet moved the player.
    #[must_use]
    pub const fn has_position_changed(&self) -> bool {
        self.position.is_some()
    }

    /// Whether the packet turned the player.
    #[must_use]
    pub const fn has_rotation_changed(&self) -> bool {
        self.rotation.is_some()
    }

    /// Whether the client reports standing on the ground.
    #[must_use]
    pub const fn on_ground(&self) -> bool {
        self.flags.contains(MovementFlags::ON_GROUND)
    }
}
