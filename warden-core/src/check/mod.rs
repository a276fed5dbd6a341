//! Packet checks and the machinery they share.
//!
//! Every check composes a [`DetectionBase`] and implements [`Detection`]. The
//! checks of one connection live together in a [`CheckSet`], which routes packets
//! to them.

pub mod alert;
pub mod detection;
pub mod movement;
pub mod violation;

use std::fmt;

use warden_protocol::ServerboundGamePacket;
use warden_protocol::packets::game::CPlayerPosition;

use crate::config::{ConfigStore, keys};
use crate::player::PlayerState;
use crate::warden::Warden;
use detection::DetectionBase;
use movement::InvalidMoveCheck;

/// Static identity of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    /// Impossible position or rotation updates.
    InvalidMove,
}

impl CheckKind {
    /// Every check kind.
    pub const ALL: [Self; 1] = [Self::InvalidMove];

    /// Name shown to staff.
    #[must_use]
    pub const fn friendly_name(self) -> &'static str {
        match self {
            Self::InvalidMove => "Move",
        }
    }

    /// Numeric id shown next to the name.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::InvalidMove => 1,
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.friendly_name(), self.id())
    }
}

/// A check with a violation counter.
pub trait Detection {
    /// The check's identity. `None` leaves log lines and alerts without a name.
    const KIND: Option<CheckKind>;

    /// Shared violation state.
    fn base(&self) -> &DetectionBase;

    /// Shared violation state, mutably.
    fn base_mut(&mut self) -> &mut DetectionBase;

    /// Violations recorded for this connection.
    fn violations(&self) -> u32 {
        self.base().violations()
    }

    /// Overwrites the violation counter.
    fn set_violations(&mut self, violations: u32) {
        self.base_mut().set_violations(violations);
    }
}

/// Everything a check may touch while handling one packet.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    /// The connection the packet belongs to.
    pub player: &'a PlayerState,
    /// Process-wide state.
    pub warden: &'a Warden,
}

impl<'a> CheckContext<'a> {
    /// Creates a context.
    #[must_use]
    pub const fn new(player: &'a PlayerState, warden: &'a Warden) -> Self {
        Self { player, warden }
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now_millis(&self) -> u64 {
        self.warden.clock().now_millis()
    }

    /// The configuration store.
    #[must_use]
    pub fn config(&self) -> &'a ConfigStore {
        self.warden.config()
    }
}

/// A packet travelling through the checks. Once cancelled it stays cancelled.
#[derive(Debug)]
pub struct PacketEvent<P> {
    packet: P,
    cancelled: bool,
}

impl<P> PacketEvent<P> {
    /// Wraps a packet.
    #[must_use]
    pub const fn new(packet: P) -> Self {
        Self {
            packet,
            cancelled: false,
        }
    }

    /// The wrapped packet.
    #[must_use]
    pub const fn packet(&self) -> &P {
        &self.packet
    }

    /// Drops the packet before it reaches game logic.
    pub const fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether any check cancelled the packet.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// All check instances of one connection.
#[derive(Debug)]
pub struct CheckSet {
    /// The movement check.
    pub invalid_move: InvalidMoveCheck,
}

impl CheckSet {
    /// Creates fresh checks for a connection that joined at `now_millis`.
    #[must_use]
    pub const fn new(now_millis: u64) -> Self {
        Self {
            invalid_move: InvalidMoveCheck::new(now_millis),
        }
    }

    /// Routes a decoded serverbound packet to every applicable check.
    pub fn handle_inbound(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<ServerboundGamePacket>,
    ) {
        if ctx.config().get_bool(keys::PREVENT_INVALID_MOVE, true) {
            self.invalid_move.handle_inbound(ctx, event);
        }
    }

    /// Routes a clientbound teleport to the checks that track it.
    pub fn handle_outbound(&mut self, ctx: CheckContext<'_>, packet: &CPlayerPosition) {
        self.invalid_move.handle_teleport(ctx.now_millis(), packet);
    }

    /// Violation state of the given check.
    #[must_use]
    pub fn base(&self, kind: CheckKind) -> &DetectionBase {
        match kind {
            CheckKind::InvalidMove => self.invalid_move.base(),
        }
    }

    /// Violation state of the given check, mutably.
    pub fn base_mut(&mut self, kind: CheckKind) -> &mut DetectionBase {
        match kind {
            CheckKind::InvalidMove => self.invalid_move.base_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(CheckKind::InvalidMove.to_string(), "Move/1");
    }

    #[test]
    fn cancel_is_sticky() {
        let mut event = PacketEvent::new(7);
        assert!(!event.is_cancelled());
        event.cancel();
        event.cancel();
        assert!(event.is_cancelled());
        assert_eq!(*event.packet(), 7);
    }
}
