//! Offline replay of recorded packet traces.
//!
//! A trace is a JSON-lines file, one event per line:
//!
//! ```text
//! {"at_ms":0,"event":"connect","player":"Alex","operator":false}
//! {"at_ms":50,"event":"inbound","player":"Alex","packet_id":28,"payload":"3fe0..01"}
//! {"at_ms":60,"event":"outbound_teleport","player":"Alex","payload":"01..00"}
//! {"at_ms":70,"event":"tick"}
//! {"at_ms":90,"event":"disconnect","player":"Alex"}
//! ```
//!
//! `at_ms` is relative to the start of the trace and must never decrease.

use std::io::BufRead;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use uuid::Uuid;
use warden_core::check::alert::AlertMessage;
use warden_core::events::DetectionEvent;
use warden_core::{
    ConnectionError, ConnectionId, GameMode, InboundVerdict, NetworkConnection, PlayerIdentity,
    Severity, Warden,
};
use warden_protocol::packets::game::CPlayerPosition;
use warden_utils::clock::ManualClock;
use warden_utils::template::Template;

const DEFAULT_PROTOCOL_VERSION: i32 = 769;
const DEFAULT_CLIENT_VERSION: &str = "1.21.4";

/// One line of a trace.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A player joins.
    Connect {
        at_ms: u64,
        player: String,
        #[serde(default)]
        uuid: Option<Uuid>,
        #[serde(default)]
        entity_id: Option<i32>,
        #[serde(default)]
        operator: bool,
        #[serde(default)]
        address: Option<SocketAddr>,
        #[serde(default)]
        protocol_version: Option<i32>,
        #[serde(default)]
        client_version: Option<String>,
        #[serde(default)]
        game_mode: GameMode,
        #[serde(default)]
        brand: Option<String>,
    },
    /// A serverbound play packet.
    Inbound {
        at_ms: u64,
        player: String,
        packet_id: i32,
        payload: String,
    },
    /// A clientbound `player_position` packet.
    OutboundTeleport {
        at_ms: u64,
        player: String,
        payload: String,
    },
    /// One server tick.
    Tick { at_ms: u64 },
    /// A player leaves.
    Disconnect { at_ms: u64, player: String },
}

impl TraceEvent {
    const fn at_ms(&self) -> u64 {
        match self {
            Self::Connect { at_ms, .. }
            | Self::Inbound { at_ms, .. }
            | Self::OutboundTeleport { at_ms, .. }
            | Self::Tick { at_ms }
            | Self::Disconnect { at_ms, .. } => *at_ms,
        }
    }
}

/// Prints whatever the engine sends to a replayed player.
struct ConsoleConnection {
    name: String,
}

impl NetworkConnection for ConsoleConnection {
    fn send_system_message(&self, message: &str) {
        log::info!("[to {}] {}", self.name, Template::new(message).strip().as_str());
    }

    fn send_alert(&self, alert: &AlertMessage) {
        log::info!(
            "[alert to {}] {}",
            self.name,
            Template::new(alert.headline.as_str()).strip().as_str()
        );
    }

    fn disconnect_with_reason(&self, reason: &str) -> Result<(), ConnectionError> {
        log::info!(
            "[disconnect {}] {}",
            self.name,
            Template::new(reason).strip().as_str()
        );
        Ok(())
    }

    fn latency(&self) -> i32 {
        0
    }

    fn has_permission(&self, _permission: &str) -> bool {
        false
    }
}

/// Counters collected while replaying.
#[derive(Debug, Default)]
pub struct ReplayStats {
    /// Trace lines processed.
    pub lines: u64,
    /// Players connected.
    pub connects: u64,
    /// Inbound packets inspected.
    pub inbound: u64,
    /// Inbound packets the engine dropped.
    pub cancelled: u64,
    /// Inbound packets for players that were not connected.
    pub unknown: u64,
    /// Teleports observed.
    pub teleports: u64,
}

/// Everything the replay produced.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Packet counters.
    pub stats: ReplayStats,
    /// Detection events in publication order.
    pub detections: Vec<DetectionEvent>,
    /// Events the queue had to drop.
    pub dropped_events: u64,
}

impl ReplayReport {
    /// Number of detections with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.detections
            .iter()
            .filter(|event| event.severity == severity)
            .count()
    }
}

/// Feeds a trace through the engine.
pub struct Replayer {
    warden: Warden,
    clock: Arc<ManualClock>,
    start: u64,
    last_at: u64,
    players: FxHashMap<String, ConnectionId>,
    stats: ReplayStats,
}

impl Replayer {
    /// Creates a replayer around an engine driven by `clock`.
    pub fn new(warden: Warden, clock: Arc<ManualClock>, start: u64) -> Self {
        Self {
            warden,
            clock,
            start,
            last_at: 0,
            players: FxHashMap::default(),
            stats: ReplayStats::default(),
        }
    }

    /// Replays every line of `reader`. Blank lines and lines starting with `#`
    /// are skipped.
    pub fn run(&mut self, reader: impl BufRead) -> Result<()> {
        for (index, line) in reader.lines().enumerate() {
            let number = index + 1;
            let line = line.with_context(|| format!("failed to read line {number}"))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event: TraceEvent = serde_json::from_str(line)
                .with_context(|| format!("invalid trace event on line {number}"))?;
            self.apply(event)
                .with_context(|| format!("failed to replay line {number}"))?;
            self.stats.lines += 1;
        }
        Ok(())
    }

    /// Stops background work and returns the counters and the engine.
    pub fn finish(self) -> (ReplayStats, Warden) {
        self.warden.shutdown();
        (self.stats, self.warden)
    }

    fn apply(&mut self, event: TraceEvent) -> Result<()> {
        let at = event.at_ms();
        if at < self.last_at {
            bail!("time went backwards: {at} ms after {} ms", self.last_at);
        }
        self.last_at = at;
        self.clock.set(self.start + at);

        match event {
            TraceEvent::Connect {
                player,
                uuid,
                entity_id,
                operator,
                address,
                protocol_version,
                client_version,
                game_mode,
                brand,
                ..
            } => {
                let id = ConnectionId(uuid.unwrap_or_else(Uuid::new_v4));
                let identity = PlayerIdentity {
                    id,
                    entity_id: entity_id.unwrap_or(self.players.len() as i32 + 1),
                    name: player.clone(),
                    protocol_version: protocol_version.unwrap_or(DEFAULT_PROTOCOL_VERSION),
                    client_version: client_version
                        .unwrap_or_else(|| String::from(DEFAULT_CLIENT_VERSION)),
                    address: address.unwrap_or_else(|| {
                        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 25565)
                    }),
                    operator,
                };
                let connection = Arc::new(ConsoleConnection {
                    name: player.clone(),
                });
                let state = self.warden.on_connect(identity, connection);
                state.set_game_mode(game_mode);
                if let Some(brand) = brand {
                    state.set_brand(brand);
                }
                self.players.insert(player, id);
                self.stats.connects += 1;
            }
            TraceEvent::Inbound {
                player,
                packet_id,
                payload,
                ..
            } => {
                let payload = hex::decode(payload.trim())
                    .with_context(|| format!("payload for {player} is not valid hex"))?;
                self.stats.inbound += 1;
                let verdict = match self.players.get(&player) {
                    Some(&id) => self.warden.handle_inbound(id, packet_id, &payload),
                    None => InboundVerdict::UnknownConnection,
                };
                match verdict {
                    InboundVerdict::Pass => {}
                    InboundVerdict::Cancelled => self.stats.cancelled += 1,
                    InboundVerdict::UnknownConnection => self.stats.unknown += 1,
                }
            }
            TraceEvent::OutboundTeleport {
                player, payload, ..
            } => {
                let payload = hex::decode(payload.trim())
                    .with_context(|| format!("teleport payload for {player} is not valid hex"))?;
                let packet = CPlayerPosition::decode(&payload)
                    .with_context(|| format!("invalid teleport for {player}"))?;
                if let Some(&id) = self.players.get(&player) {
                    self.warden.handle_outbound(id, &packet);
                    self.stats.teleports += 1;
                }
            }
            TraceEvent::Tick { .. } => self.warden.tick(),
            TraceEvent::Disconnect { player, .. } => {
                if let Some(id) = self.players.remove(&player) {
                    self.warden.on_disconnect(id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use warden_core::ConfigStore;

    use super::*;

    fn replayer() -> (Replayer, tokio::sync::mpsc::Receiver<DetectionEvent>) {
        let clock = Arc::new(ManualClock::new(0));
        let warden = Warden::builder(ConfigStore::default())
            .clock(clock.clone())
            .build();
        let events = warden.take_events().unwrap();
        (Replayer::new(warden, clock, 1_000_000), events)
    }

    fn pos(x: f64, y: f64, z: f64) -> String {
        let mut buf = Vec::new();
        buf.extend_from_slice(&x.to_be_bytes());
        buf.extend_from_slice(&y.to_be_bytes());
        buf.extend_from_slice(&z.to_be_bytes());
        buf.push(1);
        hex::encode(buf)
    }

    #[test]
    fn replays_a_border_ban() {
        let (mut replayer, mut events) = replayer();
        let trace = format!(
            "{}\n# comment\n\n{}\n{}\n",
            r#"{"at_ms":0,"event":"connect","player":"Alex"}"#,
            format_args!(
                r#"{{"at_ms":100,"event":"inbound","player":"Alex","packet_id":28,"payload":"{}"}}"#,
                pos(0.5, 64.0, 0.5)
            ),
            format_args!(
                r#"{{"at_ms":200,"event":"inbound","player":"Alex","packet_id":28,"payload":"{}"}}"#,
                pos(40_000_000.0, 64.0, 0.5)
            ),
        );
        replayer.run(trace.as_bytes()).unwrap();
        let (stats, _warden) = replayer.finish();

        assert_eq!(stats.lines, 3);
        assert_eq!(stats.inbound, 2);
        assert_eq!(stats.cancelled, 1);
        let event = events.try_recv().unwrap();
        assert_eq!(event.severity, Severity::Ban);
        assert_eq!(event.at_millis, 1_000_200);
    }

    #[test]
    fn packets_for_unknown_players_are_counted() {
        let (mut replayer, _events) = replayer();
        let line = format!(
            r#"{{"at_ms":0,"event":"inbound","player":"Ghost","packet_id":28,"payload":"{}"}}"#,
            pos(0.0, 0.0, 0.0)
        );
        replayer.run(line.as_bytes()).unwrap();
        assert_eq!(replayer.stats.unknown, 1);
    }

    #[test]
    fn rejects_time_going_backwards() {
        let (mut replayer, _events) = replayer();
        let trace = "{\"at_ms\":50,\"event\":\"tick\"}\n{\"at_ms\":10,\"event\":\"tick\"}\n";
        let err = replayer.run(trace.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("time went backwards"));
    }

    #[test]
    fn rejects_invalid_hex() {
        let (mut replayer, _events) = replayer();
        let trace = concat!(
            r#"{"at_ms":0,"event":"connect","player":"Alex"}"#,
            "\n",
            r#"{"at_ms":1,"event":"inbound","player":"Alex","packet_id":28,"payload":"zz"}"#,
        );
        assert!(replayer.run(trace.as_bytes()).is_err());
    }
}
