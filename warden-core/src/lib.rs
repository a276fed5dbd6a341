//! # Warden Core
//!
//! In-line anomaly detection for the Minecraft play protocol. The host server
//! forwards every serverbound movement packet to [`Warden::handle_inbound`] and
//! drops the packet when told to; violations escalate to kicks and bans without
//! leaving the packet path.

pub mod check;
pub mod config;
pub mod events;
pub mod player;
pub mod punishment;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod update;
pub mod warden;

pub use check::CheckKind;
pub use check::violation::{Severity, Violation};
pub use config::ConfigStore;
pub use player::connection::{ConnectionError, NetworkConnection};
pub use player::{ConnectionId, GameMode, PlayerIdentity, PlayerState};
pub use warden::{InboundVerdict, Warden, WardenBuilder};
