//! Per-connection state.
//!
//! A [`PlayerState`] lives exactly as long as the connection it describes. It is
//! owned by the [`ConnectionRegistry`](crate::registry::ConnectionRegistry);
//! anything that outlives a packet callback keeps the [`ConnectionId`] and looks
//! the state up again, treating absence as "already disconnected".

pub mod connection;
pub mod timing;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crossbeam::atomic::AtomicCell;
use serde::Deserialize;
use uuid::Uuid;
use warden_utils::locks::{SyncMutex, SyncMutexGuard, SyncRwLock};

use crate::check::CheckSet;
use connection::NetworkConnection;
use timing::TimingState;

/// Stable key of one live client session: the player's profile UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub Uuid);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// The player's game mode, as shown in staff alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Survival mode.
    #[default]
    Survival,
    /// Creative mode.
    Creative,
    /// Adventure mode.
    Adventure,
    /// Spectator mode.
    Spectator,
}

impl GameMode {
    /// Upper-case display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Survival => "SURVIVAL",
            Self::Creative => "CREATIVE",
            Self::Adventure => "ADVENTURE",
            Self::Spectator => "SPECTATOR",
        }
    }
}

/// Who is on the other end of a connection. Fixed for the connection's lifetime.
#[derive(Debug, Clone)]
pub struct PlayerIdentity {
    /// Registry key.
    pub id: ConnectionId,
    /// Numeric entity id assigned by the server.
    pub entity_id: i32,
    /// Display name.
    pub name: String,
    /// Protocol version number the client connected with.
    pub protocol_version: i32,
    /// Human readable client release, e.g. `1.21.4`.
    pub client_version: String,
    /// Remote socket address.
    pub address: SocketAddr,
    /// Whether the player is a server operator.
    pub operator: bool,
}

/// A per-viewer on/off preference.
#[derive(Debug, Default)]
pub struct ToggleSetting {
    enabled: AtomicBool,
}

impl ToggleSetting {
    /// Creates a setting with the given initial state.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Whether the setting is on.
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Turns the setting on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flips the setting and returns the new state.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }
}

/// Mutable record for one live connection.
pub struct PlayerState {
    /// Fixed identity.
    pub identity: PlayerIdentity,
    connection: Arc<dyn NetworkConnection>,
    /// Set once the connection was kicked or banned. Never reset.
    punished: AtomicBool,
    /// Whether this viewer receives alerts for kicks and bans of others.
    pub alert_settings: ToggleSetting,
    /// Whether this viewer receives alerts for mitigated packets of others.
    pub mitigation_settings: ToggleSetting,
    ticks_existed: AtomicU32,
    game_mode: AtomicCell<GameMode>,
    brand: SyncRwLock<String>,
    /// Check instances for this connection. Packets of one connection are delivered
    /// in order, so the lock is uncontended.
    checks: SyncMutex<CheckSet>,
    /// Processing time measurements.
    pub timing: SyncMutex<TimingState>,
}

impl PlayerState {
    /// Creates the state for a freshly connected player.
    ///
    /// Operators start with kick/ban alerts enabled.
    #[must_use]
    pub fn new(
        identity: PlayerIdentity,
        connection: Arc<dyn NetworkConnection>,
        checks: CheckSet,
    ) -> Self {
        let operator = identity.operator;
        Self {
            identity,
            connection,
            punished: AtomicBool::new(false),
            alert_settings: ToggleSetting::new(operator),
            mitigation_settings: ToggleSetting::new(false),
            ticks_existed: AtomicU32::new(0),
            game_mode: AtomicCell::new(GameMode::default()),
            brand: SyncRwLock::new(String::from("vanilla")),
            checks: SyncMutex::new(checks),
            timing: SyncMutex::new(TimingState::default()),
        }
    }

    /// The registry key.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.identity.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// The connection handle.
    #[must_use]
    pub fn connection(&self) -> &dyn NetworkConnection {
        self.connection.as_ref()
    }

    /// Whether the connection reached the punished terminal state.
    pub fn is_punished(&self) -> bool {
        self.punished.load(Ordering::Acquire)
    }

    /// Moves the connection into the punished state.
    ///
    /// Returns `true` for the single caller that performed the transition.
    pub fn mark_punished(&self) -> bool {
        self.punished
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Ticks since the connection joined.
    pub fn ticks_existed(&self) -> u32 {
        self.ticks_existed.load(Ordering::Relaxed)
    }

    /// Advances the tick counter by one.
    pub fn tick(&self) {
        self.ticks_existed.fetch_add(1, Ordering::Relaxed);
    }

    /// Current game mode.
    pub fn game_mode(&self) -> GameMode {
        self.game_mode.load()
    }

    /// Updates the game mode.
    pub fn set_game_mode(&self, game_mode: GameMode) {
        self.game_mode.store(game_mode);
    }

    /// Client brand reported via the `minecraft:brand` channel.
    pub fn brand(&self) -> String {
        self.brand.read().clone()
    }

    /// Updates the client brand.
    pub fn set_brand(&self, brand: impl Into<String>) {
        *self.brand.write() = brand.into();
    }

    /// Current latency reported by the connection.
    pub fn ping(&self) -> i32 {
        self.connection.latency()
    }

    /// Locks this connection's check instances.
    pub fn checks(&self) -> SyncMutexGuard<'_, CheckSet> {
        self.checks.lock()
    }
}

impl fmt::Debug for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerState")
            .field("identity", &self.identity)
            .field("punished", &self.is_punished())
            .field("ticks_existed", &self.ticks_existed())
            .finish_non_exhaustive()
    }
}
