//! Shared fixtures for the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;
use warden_core::check::alert::AlertMessage;
use warden_core::events::DetectionEvent;
use warden_core::{
    ConfigStore, ConnectionError, ConnectionId, InboundVerdict, NetworkConnection,
    PlayerIdentity, PlayerState, Warden,
};
use warden_protocol::packets::ids::serverbound::{
    S_MOVE_PLAYER_POS, S_MOVE_PLAYER_POS_ROT, S_MOVE_PLAYER_ROT, S_MOVE_VEHICLE,
};
use warden_utils::clock::ManualClock;
use warden_utils::locks::SyncMutex;

/// Wall-clock time every test starts at.
pub const START: u64 = 1_000_000;

/// A connection that records everything sent to it.
#[derive(Default)]
pub struct RecordingConnection {
    pub messages: SyncMutex<Vec<String>>,
    pub alerts: SyncMutex<Vec<AlertMessage>>,
    pub disconnects: SyncMutex<Vec<String>>,
    pub permissions: Vec<String>,
    pub fail_disconnect: AtomicBool,
}

impl RecordingConnection {
    pub fn with_permissions(permissions: &[&str]) -> Self {
        Self {
            permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.lock().len()
    }
}

impl NetworkConnection for RecordingConnection {
    fn send_system_message(&self, message: &str) {
        self.messages.lock().push(message.to_owned());
    }

    fn send_alert(&self, alert: &AlertMessage) {
        self.alerts.lock().push(alert.clone());
    }

    fn disconnect_with_reason(&self, reason: &str) -> Result<(), ConnectionError> {
        self.disconnects.lock().push(reason.to_owned());
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }
        Ok(())
    }

    fn latency(&self) -> i32 {
        42
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// An engine on a manual clock, with its event receiver.
pub struct Harness {
    pub warden: Warden,
    pub clock: Arc<ManualClock>,
    pub events: SyncMutex<tokio::sync::mpsc::Receiver<DetectionEvent>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ConfigStore::default())
    }

    pub fn with_config(config: ConfigStore) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let warden = Warden::builder(config).clock(clock.clone()).build();
        let events = warden.take_events().unwrap();
        Self {
            warden,
            clock,
            events: SyncMutex::new(events),
        }
    }

    /// Connects a player with a fresh id.
    pub fn connect(
        &self,
        name: &str,
        operator: bool,
        connection: RecordingConnection,
    ) -> (Arc<PlayerState>, Arc<RecordingConnection>) {
        let connection = Arc::new(connection);
        let state = self
            .warden
            .on_connect(identity(name, operator), connection.clone());
        (state, connection)
    }

    pub fn advance(&self, millis: u64) {
        self.clock.advance(millis);
    }

    pub fn pos(&self, id: ConnectionId, x: f64, y: f64, z: f64) -> InboundVerdict {
        self.warden
            .handle_inbound(id, S_MOVE_PLAYER_POS, &pos_payload(x, y, z))
    }

    pub fn rot(&self, id: ConnectionId, yaw: f32, pitch: f32) -> InboundVerdict {
        self.warden
            .handle_inbound(id, S_MOVE_PLAYER_ROT, &rot_payload(yaw, pitch))
    }

    pub fn pos_rot(
        &self,
        id: ConnectionId,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
    ) -> InboundVerdict {
        let mut payload = Vec::new();
        push_xyz(&mut payload, x, y, z);
        payload.extend_from_slice(&yaw.to_be_bytes());
        payload.extend_from_slice(&pitch.to_be_bytes());
        payload.push(1);
        self.warden
            .handle_inbound(id, S_MOVE_PLAYER_POS_ROT, &payload)
    }

    pub fn vehicle(&self, id: ConnectionId, x: f64, y: f64, z: f64) -> InboundVerdict {
        let mut payload = Vec::new();
        push_xyz(&mut payload, x, y, z);
        payload.extend_from_slice(&0f32.to_be_bytes());
        payload.extend_from_slice(&0f32.to_be_bytes());
        payload.push(0);
        self.warden.handle_inbound(id, S_MOVE_VEHICLE, &payload)
    }

    /// Drains every published event.
    pub fn drain_events(&self) -> Vec<DetectionEvent> {
        let mut receiver = self.events.lock();
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn identity(name: &str, operator: bool) -> PlayerIdentity {
    PlayerIdentity {
        id: ConnectionId(Uuid::new_v4()),
        entity_id: i32::from(name.as_bytes().first().copied().unwrap_or(0)),
        name: name.to_owned(),
        protocol_version: 769,
        client_version: String::from("1.21.4"),
        address: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)), 51_234),
        operator,
    }
}

fn push_xyz(buf: &mut Vec<u8>, x: f64, y: f64, z: f64) {
    buf.extend_from_slice(&x.to_be_bytes());
    buf.extend_from_slice(&y.to_be_bytes());
    buf.extend_from_slice(&z.to_be_bytes());
}

pub fn pos_payload(x: f64, y: f64, z: f64) -> Vec<u8> {
    let mut buf = Vec::new();
    push_xyz(&mut buf, x, y, z);
    buf.push(1);
    buf
}

pub fn rot_payload(yaw: f32, pitch: f32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&yaw.to_be_bytes());
    buf.extend_from_slice(&pitch.to_be_bytes());
    buf.push(1);
    buf
}
