//! Process-wide detection state and the entry points the host calls into.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use warden_protocol::packets::game::CPlayerPosition;
use warden_protocol::{ServerboundGamePacket, decode_serverbound};
use warden_utils::clock::{Clock, SystemClock};
use warden_utils::locks::SyncMutex;

use crate::check::{CheckContext, CheckKind, CheckSet, PacketEvent};
use crate::config::{ConfigStore, keys};
use crate::events::{DetectionEvent, EventSink};
use crate::player::PlayerIdentity;
use crate::player::connection::NetworkConnection;
use crate::player::{ConnectionId, PlayerState};
use crate::punishment::PunishmentDispatch;
use crate::registry::ConnectionRegistry;
use crate::scheduler::Scheduler;
use crate::stats::KickStats;
use crate::update::{ReleaseSource, UpdateChecker};

/// Default capacity of the detection event queue.
pub const DEFAULT_EVENT_CAPACITY: u64 = 1024;

/// What the host should do with an inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundVerdict {
    /// Deliver the packet to game logic.
    Pass,
    /// Drop the packet.
    Cancelled,
    /// The connection is not registered; the packet was not inspected.
    UnknownConnection,
}

/// Builds a [`Warden`].
pub struct WardenBuilder {
    config: ConfigStore,
    clock: Arc<dyn Clock>,
    release_source: Option<Arc<dyn ReleaseSource>>,
    local_version: String,
    runtime: Option<Handle>,
    event_capacity: Option<usize>,
}

impl WardenBuilder {
    /// Sets the clock used for every time-based check.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Enables join-time update notices backed by `source`.
    #[must_use]
    pub fn release_source(mut self, source: Arc<dyn ReleaseSource>) -> Self {
        self.release_source = Some(source);
        self
    }

    /// Overrides the running version compared against releases.
    #[must_use]
    pub fn local_version(mut self, version: impl Into<String>) -> Self {
        self.local_version = version.into();
        self
    }

    /// Sets the runtime background tasks are spawned on.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Overrides the configured event queue capacity.
    #[must_use]
    pub const fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Builds the engine. Without an explicit runtime the current one is used,
    /// if any.
    #[must_use]
    pub fn build(self) -> Warden {
        let capacity = self.event_capacity.unwrap_or_else(|| {
            self.config
                .get_u64(keys::EVENT_QUEUE_CAPACITY, DEFAULT_EVENT_CAPACITY) as usize
        });
        let (events, receiver) = EventSink::channel(capacity);
        let scheduler = Scheduler::new(
            self.runtime.or_else(|| Handle::try_current().ok()),
            CancellationToken::new(),
        );
        let updates = self
            .release_source
            .map(|source| Arc::new(UpdateChecker::new(self.local_version, source)));

        Warden {
            registry: ConnectionRegistry::new(scheduler.clone(), updates),
            config: self.config,
            clock: self.clock,
            punishments: PunishmentDispatch::new(),
            kick_stats: KickStats::default(),
            events,
            event_receiver: SyncMutex::new(Some(receiver)),
            scheduler,
        }
    }
}

/// The detection engine.
pub struct Warden {
    config: ConfigStore,
    clock: Arc<dyn Clock>,
    registry: ConnectionRegistry,
    punishments: PunishmentDispatch,
    kick_stats: KickStats,
    events: EventSink,
    event_receiver: SyncMutex<Option<Receiver<DetectionEvent>>>,
    scheduler: Scheduler,
}

impl Warden {
    /// Starts building an engine around `config`.
    #[must_use]
    pub fn builder(config: ConfigStore) -> WardenBuilder {
        WardenBuilder {
            config,
            clock: Arc::new(SystemClock),
            release_source: None,
            local_version: String::from(env!("CARGO_PKG_VERSION")),
            runtime: None,
            event_capacity: None,
        }
    }

    /// Registers a new connection.
    pub fn on_connect(
        &self,
        identity: PlayerIdentity,
        connection: Arc<dyn NetworkConnection>,
    ) -> Arc<PlayerState> {
        let checks = CheckSet::new(self.clock.now_millis());
        let state = Arc::new(PlayerState::new(identity, connection, checks));
        log::debug!("Tracking {} ({})", state.name(), state.id());
        self.registry.on_connect(Arc::clone(&state));
        state
    }

    /// Forgets a connection.
    pub fn on_disconnect(&self, id: ConnectionId) {
        if let Some(state) = self.registry.on_disconnect(id) {
            log::debug!("Stopped tracking {}", state.name());
        }
    }

    /// Decodes and inspects a serverbound play packet.
    ///
    /// A payload that cannot be decoded disconnects the connection and is never
    /// shown to the checks.
    pub fn handle_inbound(&self, id: ConnectionId, packet_id: i32, payload: &[u8]) -> InboundVerdict {
        let Some(player) = self.registry.get(id) else {
            return InboundVerdict::UnknownConnection;
        };
        match decode_serverbound(packet_id, payload) {
            Ok(packet) => {
                if self.process_inbound(&player, packet).is_cancelled() {
                    InboundVerdict::Cancelled
                } else {
                    InboundVerdict::Pass
                }
            }
            Err(e) => {
                self.punishments
                    .exception_disconnect(&self.config, &player, &e);
                InboundVerdict::Cancelled
            }
        }
    }

    /// Runs the checks on an already decoded packet.
    #[tracing::instrument(level = "trace", skip_all, fields(player = player.name()))]
    pub fn process_inbound(
        &self,
        player: &PlayerState,
        packet: ServerboundGamePacket,
    ) -> PacketEvent<ServerboundGamePacket> {
        let mut event = PacketEvent::new(packet);
        let timed = matches!(packet, ServerboundGamePacket::MovePlayer(_));
        if timed {
            player.timing.lock().movement.prepare();
        }
        player
            .checks()
            .handle_inbound(CheckContext::new(player, self), &mut event);
        if timed {
            player.timing.lock().movement.end();
        }
        event
    }

    /// Lets the checks observe a server teleport sent to `id`.
    pub fn handle_outbound(&self, id: ConnectionId, packet: &CPlayerPosition) {
        if let Some(player) = self.registry.get(id) {
            player
                .checks()
                .handle_outbound(CheckContext::new(&player, self), packet);
        }
    }

    /// Advances every connection by one server tick.
    pub fn tick(&self) {
        self.registry.for_each(|player| {
            player.tick();
            true
        });
    }

    /// Violations recorded by `kind` for a connection.
    pub fn violations(&self, id: ConnectionId, kind: CheckKind) -> Option<u32> {
        self.registry
            .get(id)
            .map(|player| player.checks().base(kind).violations())
    }

    /// Overwrites a violation counter. Returns `false` for unknown connections.
    pub fn set_violations(&self, id: ConnectionId, kind: CheckKind, violations: u32) -> bool {
        let Some(player) = self.registry.get(id) else {
            return false;
        };
        player.checks().base_mut(kind).set_violations(violations);
        true
    }

    /// Whether connections from `address` should be refused.
    pub fn is_address_blocked(&self, address: &IpAddr) -> bool {
        self.punishments.blocked_addresses().is_blocked(address)
    }

    /// Takes the receiving half of the detection event queue. Only the first
    /// call returns it.
    pub fn take_events(&self) -> Option<Receiver<DetectionEvent>> {
        self.event_receiver.lock().take()
    }

    /// Cancels background tasks.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        log::info!("Warden shut down with {} tracked connections", self.registry.len());
    }

    /// The configuration store.
    #[must_use]
    pub const fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// The clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Live connections.
    #[must_use]
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Punishment state.
    #[must_use]
    pub const fn punishments(&self) -> &PunishmentDispatch {
        &self.punishments
    }

    /// Kick counters.
    #[must_use]
    pub const fn kick_stats(&self) -> &KickStats {
        &self.kick_stats
    }

    /// The detection event publisher.
    #[must_use]
    pub const fn events(&self) -> &EventSink {
        &self.events
    }
}
