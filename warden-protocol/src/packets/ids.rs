//! Play-state packet ids for protocol 769 (1.21.4).

/// Serverbound play packets.
pub mod serverbound {
    /// `move_player_pos`.
    pub const S_MOVE_PLAYER_POS: i32 = 0x1C;
    /// `move_player_pos_rot`.
    pub const S_MOVE_PLAYER_POS_ROT: i32 = 0x1D;
    /// `move_player_rot`.
    pub const S_MOVE_PLAYER_ROT: i32 = 0x1E;
    /// `move_player_status_only`.
    pub const S_MOVE_PLAYER_STATUS_ONLY: i32 = 0x1F;
    /// `move_vehicle`.
    pub const S_MOVE_VEHICLE: i32 = 0x20;
}

/// Clientbound play packets.
pub mod clientbound {
    /// `player_position`.
    pub const C_PLAYER_POSITION: i32 = 0x42;
}
